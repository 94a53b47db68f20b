//! Hand-off between segment workers (producers) and the writer (consumer).
//!
//! A bounded `sync_channel`: workers block on a full queue, which is the only
//! backpressure in the pipeline. The completion thread sends
//! [`SinkItem::Finished`] exactly once, after joining every worker, so the
//! marker always follows the last chunk in the queue.

use std::sync::mpsc::{self, Receiver, SyncSender};

use crate::error::DownloadError;

/// Offset-tagged slice of the output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Absolute offset of the first byte in the output file.
    pub offset: u64,
    pub bytes: Vec<u8>,
}

impl Chunk {
    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.offset + self.bytes.len() as u64
    }
}

#[derive(Debug)]
pub(crate) enum SinkItem {
    Chunk(Chunk),
    /// A worker hit a fatal error; the writer stops at the first one.
    Failed {
        segment: usize,
        error: DownloadError,
    },
    /// Every worker has exited.
    Finished,
}

/// The writer has gone away (timeout, failure, or abort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SinkClosed;

#[derive(Clone)]
pub(crate) struct SinkSender {
    tx: SyncSender<SinkItem>,
}

pub(crate) fn channel(capacity: usize) -> (SinkSender, Receiver<SinkItem>) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    (SinkSender { tx }, rx)
}

impl SinkSender {
    /// Blocks while the queue is full.
    pub fn send_chunk(&self, chunk: Chunk) -> Result<(), SinkClosed> {
        self.tx.send(SinkItem::Chunk(chunk)).map_err(|_| SinkClosed)
    }

    pub fn fail(&self, segment: usize, error: DownloadError) -> Result<(), SinkClosed> {
        self.tx
            .send(SinkItem::Failed { segment, error })
            .map_err(|_| SinkClosed)
    }

    /// Consumes the sender: the completion marker is the last thing it sends.
    pub fn finish(self) -> Result<(), SinkClosed> {
        self.tx.send(SinkItem::Finished).map_err(|_| SinkClosed)
    }
}
