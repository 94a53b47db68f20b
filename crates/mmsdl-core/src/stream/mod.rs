//! Streaming-protocol capability consumed by the downloader.
//!
//! The downloader never talks to a wire protocol directly. It asks a
//! [`Connector`] for an independent [`StreamSource`] per connection (one for
//! the probe, one per segment worker) and drives it through this narrow
//! interface. Backends:
//! - `file://` URLs and plain paths: [`LocalConnector`] (always available).
//! - `mms://`, `mmst://`, `mmsh://`: `LibmmsConnector` (cargo feature `libmms`).

mod guard;
#[cfg(feature = "libmms")]
mod libmms;
mod local;
#[cfg(test)]
pub(crate) mod mock;

pub use guard::StreamGuard;
#[cfg(feature = "libmms")]
pub use libmms::LibmmsConnector;
pub use local::{LocalConnector, LocalStream, DEFAULT_READ_BLOCK};

use std::sync::Arc;

use thiserror::Error;

/// URL schemes served by the MMS backend.
pub const MMS_SCHEMES: [&str; 3] = ["mms", "mmst", "mmsh"];

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("could not connect to {url}")]
    Connect { url: String },
    #[error("read failed: {0}")]
    Read(String),
    #[error("seek failed: {0}")]
    Seek(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("{0} support not compiled in (rebuild with --features libmms)")]
    BackendUnavailable(&'static str),
}

/// One open protocol connection.
///
/// Owned by exactly one worker; wrap it in a [`StreamGuard`] so `close` runs
/// exactly once on every exit path.
pub trait StreamSource: Send {
    /// Total stream length in bytes; 0 when the server does not report one.
    fn length(&self) -> u64;

    /// Media duration in seconds; 0.0 when unknown.
    fn duration(&self) -> f64;

    /// False when length and remaining-time estimates must be suppressed.
    fn duration_known(&self) -> bool {
        self.duration() > 0.0
    }

    fn seekable(&self) -> bool;

    /// Requests a byte offset and returns where the stream actually landed.
    /// The protocol may stop on a block boundary before the requested offset.
    fn seek(&mut self, offset: u64) -> Result<u64, StreamError>;

    /// Reads the next block into `buf`. `Ok(0)` signals end-of-data.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    fn position(&self) -> u64;

    fn close(&mut self);
}

/// Opens independent connections to a stream URL.
pub trait Connector: Send + Sync {
    /// `bandwidth` is the desired bitrate hint in bytes per second, used by
    /// the server for stream selection.
    fn open(&self, url: &str, bandwidth: u32) -> Result<Box<dyn StreamSource>, StreamError>;
}

/// Returns the URL scheme if `url` looks like `scheme://...`.
pub fn url_scheme(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once("://")?;
    if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
        Some(scheme)
    } else {
        None
    }
}

/// Picks the backend for `url`. `read_block` sizes reads for the local backend.
pub fn connector_for(url: &str, read_block: usize) -> Result<Arc<dyn Connector>, StreamError> {
    match url_scheme(url) {
        None | Some("file") => Ok(Arc::new(LocalConnector::new(read_block))),
        Some(scheme) if MMS_SCHEMES.contains(&scheme) => mms_connector(),
        Some(scheme) => Err(StreamError::UnsupportedScheme(scheme.to_string())),
    }
}

#[cfg(feature = "libmms")]
fn mms_connector() -> Result<Arc<dyn Connector>, StreamError> {
    Ok(Arc::new(LibmmsConnector))
}

#[cfg(not(feature = "libmms"))]
fn mms_connector() -> Result<Arc<dyn Connector>, StreamError> {
    Err(StreamError::BackendUnavailable("MMS"))
}
