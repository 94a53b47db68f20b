//! Error taxonomy for a download run.
//!
//! A timeout is deliberately absent here: running out of time is reported as
//! [`crate::downloader::DownloadOutcome::TimedOut`], not as a failure.

use std::path::PathBuf;

use thiserror::Error;

use crate::stream::StreamError;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// A connection (probe or worker) could not be opened.
    #[error("connection error: {0}")]
    Connection(#[source] StreamError),

    /// The stream did not land on the requested offset, even after retrying one byte earlier.
    #[error("seek to byte {requested} landed at byte {actual}")]
    SeekContractViolation { requested: u64, actual: u64 },

    /// End-of-data arrived before the segment's range was covered.
    #[error("segment {segment} ended at byte {reached}, expected data up to byte {expected_end}")]
    ShortRead {
        segment: usize,
        expected_end: u64,
        reached: u64,
    },

    /// The protocol client failed while reading or seeking.
    #[error("stream error: {0}")]
    Protocol(#[source] StreamError),

    /// More than one connection was required on a stream that cannot seek.
    #[error("cannot use {requested} parallel connections on a non-seekable stream")]
    NonSeekableMultiSegment { requested: usize },

    /// Resume was requested but the stream cannot seek to the existing file size.
    #[error("non-seekable streams cannot be resumed")]
    NotResumable,

    #[error("{operation} {} failed: {source}", path.display())]
    Storage {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("segment {segment} worker panicked")]
    WorkerPanicked { segment: usize },

    /// Every worker handle went away without the completion marker being sent.
    #[error("segment workers exited without signalling completion")]
    CompletionLost,

    #[error("download aborted by user")]
    Aborted,
}

impl DownloadError {
    pub(crate) fn storage(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        DownloadError::Storage {
            operation,
            path: path.into(),
            source,
        }
    }
}
