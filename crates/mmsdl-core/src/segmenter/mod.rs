//! Range math and segment planning.
//!
//! Splits a seekable stream into contiguous, non-overlapping byte ranges, one
//! per worker connection.

mod range;

pub use range::{effective_segment_count, plan_segments, Segment, UNBOUNDED_END};
