//! Segmented stream downloader.
//!
//! [`download`] probes the stream once, partitions it into byte ranges, runs
//! one worker thread per range and drains their chunks into the output file
//! on the calling thread. The call blocks; run it on a blocking thread when
//! driven from async code.

mod choose;
mod probe;
mod run;
mod segment;
mod sink;
mod writer;

pub use probe::StreamInfo;
pub use sink::Chunk;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::Sender;

use crate::config::MmsdlConfig;
use crate::control::CancelToken;
use crate::error::DownloadError;
use crate::progress::{ProgressStats, ProgressTracker};
use crate::storage::{StorageWriter, StorageWriterBuilder, WriteMode};
use crate::stream::Connector;

use choose::{choose_plan, DownloadPlan};
use segment::WorkerParams;
use writer::{drain_sink, WriterExit};

/// Everything one download needs. Build with [`DownloadRequest::new`] or
/// [`DownloadRequest::from_config`] and override fields as needed.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    /// Desired bitrate hint in bytes per second.
    pub bandwidth: u32,
    pub destination: PathBuf,
    /// Requested parallel connections (at least 1).
    pub segments: usize,
    /// Time budget for the whole download.
    pub timeout: Option<Duration>,
    /// Continue an existing file with a single connection.
    pub resume: bool,
    /// Fail instead of degrading to one connection on non-seekable streams.
    pub strict_segments: bool,
    pub chunk_size: usize,
    pub queue_capacity: usize,
    pub progress_interval: Duration,
    pub preallocate: bool,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self::from_config(url, destination, &MmsdlConfig::default())
    }

    pub fn from_config(
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
        cfg: &MmsdlConfig,
    ) -> Self {
        Self {
            url: url.into(),
            bandwidth: cfg.bandwidth,
            destination: destination.into(),
            segments: cfg.default_segments.max(1),
            timeout: None,
            resume: false,
            strict_segments: cfg.strict_segments,
            chunk_size: cfg.chunk_size.max(1),
            queue_capacity: cfg.queue_capacity.max(1),
            progress_interval: Duration::from_millis(cfg.progress_interval_ms),
            preallocate: cfg.preallocate,
        }
    }
}

/// Terminal result of a download. Running out of time is not a failure.
#[derive(Debug)]
pub enum DownloadOutcome {
    Completed { elapsed: Duration, bytes: u64 },
    TimedOut { elapsed: Duration, bytes: u64 },
    Failed(DownloadError),
}

impl DownloadOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, DownloadOutcome::Completed { .. })
    }
}

/// Download `request.url` into `request.destination`.
///
/// `abort` is polled by the writer loop; setting it stops the download with
/// `Failed(Aborted)`. The partial output file is left on disk on every
/// non-completed path.
pub fn download(
    request: &DownloadRequest,
    connector: Arc<dyn Connector>,
    progress_tx: Option<Sender<ProgressStats>>,
    abort: &CancelToken,
) -> DownloadOutcome {
    let started = Instant::now();
    let outcome = match run_download(request, connector, progress_tx, abort, started) {
        Ok(outcome) => outcome,
        Err(e) => DownloadOutcome::Failed(e),
    };
    match &outcome {
        DownloadOutcome::Completed { elapsed, bytes } => {
            tracing::info!(bytes, elapsed_secs = elapsed.as_secs_f64(), "download completed")
        }
        DownloadOutcome::TimedOut { elapsed, bytes } => {
            tracing::info!(bytes, elapsed_secs = elapsed.as_secs_f64(), "download timed out")
        }
        DownloadOutcome::Failed(e) => tracing::error!(error = %e, "download failed"),
    }
    outcome
}

fn run_download(
    request: &DownloadRequest,
    connector: Arc<dyn Connector>,
    progress_tx: Option<Sender<ProgressStats>>,
    abort: &CancelToken,
    started: Instant,
) -> Result<DownloadOutcome, DownloadError> {
    if abort.is_cancelled() {
        return Err(DownloadError::Aborted);
    }
    // A budget past the end of the clock is no budget at all.
    let deadline = request.timeout.and_then(|t| started.checked_add(t));

    let info = probe::probe(connector.as_ref(), &request.url, request.bandwidth)?;
    let existing_len = if request.resume {
        existing_size(&request.destination)?
    } else {
        0
    };
    let plan = choose_plan(request, &info, existing_len)?;
    tracing::info!(
        url = %request.url,
        destination = %request.destination.display(),
        segments = plan.segments.len(),
        mode = ?plan.mode,
        resume_from = plan.resume_from,
        "download plan"
    );

    if plan.already_complete {
        return Ok(DownloadOutcome::Completed {
            elapsed: started.elapsed(),
            bytes: plan.resume_from,
        });
    }

    let mut storage = open_storage(request, &info, &plan)?;
    let mut progress = ProgressTracker::new(
        started,
        plan.resume_from,
        plan.total,
        request.timeout,
        plan.segments.len(),
        request.progress_interval,
        progress_tx,
    );

    if plan.segments.iter().all(|s| s.is_empty()) {
        progress.finish(Instant::now());
        storage.close()?;
        return Ok(DownloadOutcome::Completed {
            elapsed: started.elapsed(),
            bytes: plan.resume_from,
        });
    }

    let cancel = CancelToken::new();
    let (tx, rx) = sink::channel(request.queue_capacity);
    let params = WorkerParams {
        url: request.url.clone(),
        bandwidth: request.bandwidth,
        chunk_size: request.chunk_size,
    };
    if let Err(e) = run::launch_pool(connector, params, &plan.segments, tx, cancel.clone()) {
        drop(rx);
        close_quietly(storage);
        return Err(e);
    }

    let exit = drain_sink(&rx, &mut storage, &mut progress, deadline, abort);
    progress.finish(Instant::now());
    let bytes = progress.bytes_done();

    if let WriterExit::Drained = exit {
        drop(rx);
        storage.close()?;
        return Ok(DownloadOutcome::Completed {
            elapsed: started.elapsed(),
            bytes,
        });
    }

    // Workers blocked on a full queue see the dropped receiver; workers
    // stuck inside a protocol call are not waited for.
    cancel.cancel();
    drop(rx);
    close_quietly(storage);
    match exit {
        WriterExit::TimedOut => Ok(DownloadOutcome::TimedOut {
            elapsed: started.elapsed(),
            bytes,
        }),
        WriterExit::Failed(e) => Err(e),
        WriterExit::Aborted | WriterExit::Drained => Err(DownloadError::Aborted),
    }
}

fn existing_size(path: &Path) -> Result<u64, DownloadError> {
    match std::fs::metadata(path) {
        Ok(m) => Ok(m.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(DownloadError::storage("stat", path, e)),
    }
}

fn open_storage(
    request: &DownloadRequest,
    info: &StreamInfo,
    plan: &DownloadPlan,
) -> Result<StorageWriter, DownloadError> {
    match plan.mode {
        WriteMode::Append => StorageWriter::open_append(&request.destination),
        WriteMode::Positional => {
            let mut builder = StorageWriterBuilder::create(&request.destination)?;
            if request.preallocate && !info.length_unknown() && info.length > 0 {
                builder.preallocate(info.length)?;
            }
            Ok(builder.build())
        }
    }
}

fn close_quietly(storage: StorageWriter) {
    if let Err(e) = storage.close() {
        tracing::warn!(error = %e, "closing output file after an aborted download failed");
    }
}
