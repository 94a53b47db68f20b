//! Output file lifecycle.
//!
//! The output file is opened once, written only by the writer loop, and
//! closed exactly once. Multi-segment downloads use positional writes
//! (pwrite) so chunks can land in any order; single-connection resume opens
//! the existing file for append.

mod builder;
mod writer;

pub use builder::StorageWriterBuilder;
pub use writer::{StorageWriter, WriteMode};
