//! Writer loop: the single consumer of the sink.
//!
//! Runs on the coordinator thread. It is the only code that writes the output
//! file, and it checks the deadline and the user abort token every tick, so
//! it can give up even while every worker is blocked inside a protocol call.

use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use crate::control::CancelToken;
use crate::error::DownloadError;
use crate::progress::ProgressTracker;
use crate::storage::StorageWriter;

use super::sink::{Chunk, SinkItem};

/// Upper bound on how long the writer blocks waiting for the next item.
const TICK: Duration = Duration::from_millis(100);

/// Why the writer loop stopped.
#[derive(Debug)]
pub(crate) enum WriterExit {
    /// Completion marker seen and every queued chunk written.
    Drained,
    Failed(DownloadError),
    TimedOut,
    Aborted,
}

pub(crate) fn drain_sink(
    rx: &Receiver<SinkItem>,
    storage: &mut StorageWriter,
    progress: &mut ProgressTracker,
    deadline: Option<Instant>,
    abort: &CancelToken,
) -> WriterExit {
    loop {
        let now = Instant::now();
        if deadline.is_some_and(|d| now >= d) {
            return WriterExit::TimedOut;
        }
        if abort.is_cancelled() {
            return WriterExit::Aborted;
        }
        progress.tick(now);

        let wait = match deadline {
            Some(d) => TICK.min(d.saturating_duration_since(now)),
            None => TICK,
        };
        match rx.recv_timeout(wait) {
            Ok(SinkItem::Chunk(chunk)) => {
                if let Err(e) = write_chunk(storage, progress, chunk) {
                    return WriterExit::Failed(e);
                }
            }
            Ok(SinkItem::Failed { segment, error }) => {
                tracing::debug!(segment, "writer stopping on segment failure");
                return WriterExit::Failed(error);
            }
            Ok(SinkItem::Finished) => return drain_remaining(rx, storage, progress),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!("sink disconnected without completion marker");
                return WriterExit::Failed(DownloadError::CompletionLost);
            }
        }
    }
}

/// Empty whatever is still queued after the completion marker.
fn drain_remaining(
    rx: &Receiver<SinkItem>,
    storage: &mut StorageWriter,
    progress: &mut ProgressTracker,
) -> WriterExit {
    loop {
        match rx.try_recv() {
            Ok(SinkItem::Chunk(chunk)) => {
                if let Err(e) = write_chunk(storage, progress, chunk) {
                    return WriterExit::Failed(e);
                }
            }
            Ok(SinkItem::Failed { error, .. }) => return WriterExit::Failed(error),
            Ok(SinkItem::Finished) => {}
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                return WriterExit::Drained
            }
        }
    }
}

fn write_chunk(
    storage: &mut StorageWriter,
    progress: &mut ProgressTracker,
    chunk: Chunk,
) -> Result<(), DownloadError> {
    storage.write_at(chunk.offset, &chunk.bytes)?;
    progress.record(chunk.bytes.len() as u64, Instant::now());
    Ok(())
}
