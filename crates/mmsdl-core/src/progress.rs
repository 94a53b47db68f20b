//! Progress reporting for downloads (bytes written, smoothed rate, ETA).
//!
//! The writer loop owns a [`ProgressTracker`]; collaborators only see
//! [`ProgressStats`] snapshots delivered over a tokio channel with
//! `try_send`, so a slow consumer never stalls disk writes.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::mpsc::Sender;

/// Length of one throughput sampling window.
const RATE_WINDOW: Duration = Duration::from_secs(1);
/// Weight of the running average against a new window sample (9:1).
const RATE_HISTORY_WEIGHT: f64 = 9.0;

/// Snapshot of download progress (CLI-friendly).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressStats {
    /// Bytes in the output file so far (includes resumed bytes).
    pub bytes_done: u64,
    /// Total stream length; `None` when the stream's duration is unknown.
    pub total_bytes: Option<u64>,
    /// Elapsed time since the download started (seconds).
    pub elapsed_secs: f64,
    /// Exponentially weighted throughput in bytes per second.
    pub bytes_per_sec: f64,
    /// Estimated seconds remaining; `None` when it cannot be estimated.
    pub eta_secs: Option<f64>,
    /// Number of parallel connections.
    pub segment_count: usize,
}

impl ProgressStats {
    /// Fraction complete in [0.0, 1.0], when the total is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(1.0),
            Some(total) => Some((self.bytes_done as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

/// Exponentially weighted moving average of throughput over 1 s windows.
#[derive(Debug, Clone)]
pub struct ThroughputMeter {
    window_start: Instant,
    window_bytes: u64,
    rate: Option<f64>,
}

impl ThroughputMeter {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            window_bytes: 0,
            rate: None,
        }
    }

    /// Account `bytes` received at `now`. Call with 0 on idle ticks so a
    /// stalled stream decays the rate.
    pub fn record(&mut self, bytes: u64, now: Instant) {
        self.window_bytes += bytes;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < RATE_WINDOW {
            return;
        }
        let sample = self.window_bytes as f64 / elapsed.as_secs_f64();
        self.rate = Some(match self.rate {
            Some(r) => (r * RATE_HISTORY_WEIGHT + sample) / (RATE_HISTORY_WEIGHT + 1.0),
            None => sample,
        });
        self.window_start = now;
        self.window_bytes = 0;
    }

    /// 0 until the first full window has been observed.
    pub fn bytes_per_sec(&self) -> f64 {
        self.rate.unwrap_or(0.0)
    }
}

/// Writer-side progress state.
pub struct ProgressTracker {
    started: Instant,
    bytes_done: u64,
    total: Option<u64>,
    budget: Option<Duration>,
    segment_count: usize,
    meter: ThroughputMeter,
    interval: Duration,
    last_emit: Option<Instant>,
    tx: Option<Sender<ProgressStats>>,
}

impl ProgressTracker {
    pub fn new(
        started: Instant,
        initial_bytes: u64,
        total: Option<u64>,
        budget: Option<Duration>,
        segment_count: usize,
        interval: Duration,
        tx: Option<Sender<ProgressStats>>,
    ) -> Self {
        Self {
            started,
            bytes_done: initial_bytes,
            total,
            budget,
            segment_count,
            meter: ThroughputMeter::new(started),
            interval,
            last_emit: None,
            tx,
        }
    }

    pub fn bytes_done(&self) -> u64 {
        self.bytes_done
    }

    pub fn record(&mut self, bytes: u64, now: Instant) {
        self.bytes_done += bytes;
        self.meter.record(bytes, now);
    }

    /// Emit a snapshot if the reporting interval has elapsed.
    pub fn tick(&mut self, now: Instant) {
        self.meter.record(0, now);
        let due = match self.last_emit {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if due {
            self.emit(now);
        }
    }

    /// Emit a final snapshot unconditionally.
    pub fn finish(&mut self, now: Instant) {
        self.emit(now);
    }

    pub fn snapshot(&self, now: Instant) -> ProgressStats {
        let elapsed = now.saturating_duration_since(self.started);
        ProgressStats {
            bytes_done: self.bytes_done,
            total_bytes: self.total,
            elapsed_secs: elapsed.as_secs_f64(),
            bytes_per_sec: self.meter.bytes_per_sec(),
            eta_secs: self.eta_secs(elapsed),
            segment_count: self.segment_count,
        }
    }

    /// With a time budget the remaining time is never more than what is left of it.
    fn eta_secs(&self, elapsed: Duration) -> Option<f64> {
        let rate = self.meter.bytes_per_sec();
        let by_rate = match self.total {
            Some(total) if total <= self.bytes_done => Some(0.0),
            Some(total) if rate > 0.0 => Some((total - self.bytes_done) as f64 / rate),
            _ => None,
        };
        match self.budget {
            Some(budget) => {
                let left = budget.saturating_sub(elapsed).as_secs_f64();
                Some(by_rate.map_or(left, |eta| eta.min(left)))
            }
            None => by_rate,
        }
    }

    fn emit(&mut self, now: Instant) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(self.snapshot(now));
        }
        self.last_emit = Some(now);
    }
}
