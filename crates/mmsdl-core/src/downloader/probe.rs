//! One short-lived connection to learn the stream's shape before planning.

use crate::error::DownloadError;
use crate::stream::{Connector, StreamGuard};

/// What the probe connection reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    /// Stream length in bytes; 0 is empty when seekable, unknown otherwise.
    pub length: u64,
    pub duration_secs: f64,
    pub duration_known: bool,
    pub seekable: bool,
}

impl StreamInfo {
    /// True when the length cannot be trusted as a byte count.
    pub fn length_unknown(&self) -> bool {
        self.length == 0 && !self.seekable
    }
}

/// Open, read the stream properties, close. The connection is closed before
/// this returns, so workers never share it.
pub(crate) fn probe(
    connector: &dyn Connector,
    url: &str,
    bandwidth: u32,
) -> Result<StreamInfo, DownloadError> {
    let stream = connector
        .open(url, bandwidth)
        .map_err(DownloadError::Connection)?;
    let stream = StreamGuard::new(stream);
    let info = StreamInfo {
        length: stream.length(),
        duration_secs: stream.duration(),
        duration_known: stream.duration_known(),
        seekable: stream.seekable(),
    };
    stream.close();
    tracing::debug!(
        url,
        length = info.length,
        duration = info.duration_secs,
        seekable = info.seekable,
        "probed stream"
    );
    Ok(info)
}
