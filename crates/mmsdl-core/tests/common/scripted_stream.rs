//! Scripted in-memory stream for integration tests.
//!
//! Serves a static body through the `Connector`/`StreamSource` interface with
//! knobs for the protocol quirks the downloader must survive: seeks that land
//! past the target, small read blocks, early end-of-data, failed connects,
//! read errors, panics and reads that stall until released.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mmsdl_core::stream::{Connector, StreamError, StreamSource};

#[derive(Debug, Clone, Copy)]
pub struct ScriptedOptions {
    /// Bytes returned per read at most.
    pub block_size: usize,
    /// Every seek lands this many bytes past the requested offset.
    pub seek_overshoot: u64,
    pub seekable: bool,
    /// Media duration in seconds (0.0 = unknown).
    pub duration: f64,
    /// Length reported to the client instead of the body length.
    pub reported_length: Option<u64>,
    /// End-of-data at this offset even though the body is longer.
    pub truncate_at: Option<u64>,
    /// Connection attempts with this index or higher fail (0 = probe).
    pub fail_opens_from: Option<usize>,
    /// Reads fail once the position reaches this offset.
    pub fail_read_at: Option<u64>,
    /// Reads panic once the position reaches this offset.
    pub panic_at: Option<u64>,
    /// Reads block once the position reaches this offset, until released.
    pub stall_at: Option<u64>,
    /// Sleep before every read.
    pub read_delay: Option<Duration>,
}

impl Default for ScriptedOptions {
    fn default() -> Self {
        Self {
            block_size: 64,
            seek_overshoot: 0,
            seekable: true,
            duration: 60.0,
            reported_length: None,
            truncate_at: None,
            fail_opens_from: None,
            fail_read_at: None,
            panic_at: None,
            stall_at: None,
            read_delay: None,
        }
    }
}

#[derive(Default)]
struct Counters {
    attempts: AtomicUsize,
    opens: AtomicUsize,
    closes: AtomicUsize,
    released: AtomicBool,
}

#[derive(Clone)]
pub struct ScriptedConnector {
    body: Arc<Vec<u8>>,
    opts: ScriptedOptions,
    counters: Arc<Counters>,
}

impl ScriptedConnector {
    pub fn new(body: Vec<u8>, opts: ScriptedOptions) -> Self {
        Self {
            body: Arc::new(body),
            opts,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Successful connections.
    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    /// Unblock every stalled read; they return end-of-data.
    pub fn release(&self) {
        self.counters.released.store(true, Ordering::SeqCst);
    }

    /// Wait until every opened connection has been closed.
    pub fn wait_all_closed(&self, limit: Duration) -> bool {
        let step = Duration::from_millis(10);
        let mut waited = Duration::ZERO;
        while waited < limit {
            if self.closes() == self.opens() {
                return true;
            }
            thread::sleep(step);
            waited += step;
        }
        self.closes() == self.opens()
    }
}

impl Connector for ScriptedConnector {
    fn open(&self, url: &str, _bandwidth: u32) -> Result<Box<dyn StreamSource>, StreamError> {
        let attempt = self.counters.attempts.fetch_add(1, Ordering::SeqCst);
        if self.opts.fail_opens_from.is_some_and(|n| attempt >= n) {
            return Err(StreamError::Connect {
                url: url.to_string(),
            });
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedStream {
            body: Arc::clone(&self.body),
            opts: self.opts,
            counters: Arc::clone(&self.counters),
            pos: 0,
        }))
    }
}

struct ScriptedStream {
    body: Arc<Vec<u8>>,
    opts: ScriptedOptions,
    counters: Arc<Counters>,
    pos: u64,
}

impl StreamSource for ScriptedStream {
    fn length(&self) -> u64 {
        self.opts
            .reported_length
            .unwrap_or(self.body.len() as u64)
    }

    fn duration(&self) -> f64 {
        self.opts.duration
    }

    fn seekable(&self) -> bool {
        self.opts.seekable
    }

    fn seek(&mut self, offset: u64) -> Result<u64, StreamError> {
        if !self.opts.seekable {
            return Err(StreamError::Seek("not seekable".into()));
        }
        self.pos = (offset + self.opts.seek_overshoot).min(self.body.len() as u64);
        Ok(self.pos)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if let Some(delay) = self.opts.read_delay {
            thread::sleep(delay);
        }
        if self.opts.stall_at.is_some_and(|at| self.pos >= at) {
            while !self.counters.released.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
            return Ok(0);
        }
        if self.opts.panic_at.is_some_and(|at| self.pos >= at) {
            panic!("scripted stream panic at {}", self.pos);
        }
        if self.opts.fail_read_at.is_some_and(|at| self.pos >= at) {
            return Err(StreamError::Read("scripted read failure".into()));
        }
        let limit = self
            .opts
            .truncate_at
            .unwrap_or(u64::MAX)
            .min(self.body.len() as u64);
        if self.pos >= limit {
            return Ok(0);
        }
        let n = (limit - self.pos)
            .min(self.opts.block_size as u64)
            .min(buf.len() as u64) as usize;
        let start = self.pos as usize;
        buf[..n].copy_from_slice(&self.body[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn close(&mut self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}
