//! Worker pool: one named thread per segment plus a completion thread.
//!
//! The completion thread joins every worker and then sends the completion
//! marker. Workers are never joined by the coordinator: on timeout or failure
//! the writer walks away and any worker stuck in a protocol call is left to
//! finish on its own.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::control::CancelToken;
use crate::error::DownloadError;
use crate::segmenter::Segment;
use crate::stream::Connector;

use super::segment::{fetch_segment, WorkerExit, WorkerParams};
use super::sink::SinkSender;

/// Spawn one worker per segment and the completion thread.
///
/// Every worker error cancels the others and is forwarded to the writer as
/// `Failed`. A spawn failure cancels the workers already started; the marker
/// is still sent once they exit.
pub(crate) fn launch_pool(
    connector: Arc<dyn Connector>,
    params: WorkerParams,
    segments: &[Segment],
    sink: SinkSender,
    cancel: CancelToken,
) -> Result<(), DownloadError> {
    let params = Arc::new(params);
    let mut handles: Vec<(usize, JoinHandle<()>)> = Vec::with_capacity(segments.len());

    for (index, segment) in segments.iter().copied().enumerate() {
        let connector = Arc::clone(&connector);
        let params = Arc::clone(&params);
        let tx = sink.clone();
        let cancel_w = cancel.clone();
        let spawned = thread::Builder::new()
            .name(format!("segment-{index}"))
            .spawn(move || {
                match fetch_segment(connector.as_ref(), &params, index, segment, &tx, &cancel_w) {
                    Ok(WorkerExit::Finished { .. }) => {}
                    Ok(WorkerExit::Cancelled) => {
                        tracing::debug!(segment = index, "segment cancelled");
                    }
                    Err(e) => {
                        tracing::warn!(segment = index, error = %e, "segment failed");
                        cancel_w.cancel();
                        let _ = tx.fail(index, e);
                    }
                }
            });
        match spawned {
            Ok(handle) => handles.push((index, handle)),
            Err(e) => {
                cancel.cancel();
                spawn_completion(handles, sink)?;
                return Err(DownloadError::Spawn(e));
            }
        }
    }

    spawn_completion(handles, sink)
}

fn spawn_completion(
    handles: Vec<(usize, JoinHandle<()>)>,
    sink: SinkSender,
) -> Result<(), DownloadError> {
    thread::Builder::new()
        .name("segment-join".to_string())
        .spawn(move || {
            for (index, handle) in handles {
                if handle.join().is_err() {
                    tracing::error!(segment = index, "segment worker panicked");
                    let _ = sink.fail(index, DownloadError::WorkerPanicked { segment: index });
                }
            }
            let _ = sink.finish();
        })
        .map(|_| ())
        .map_err(DownloadError::Spawn)
}
