//! In-memory stream for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{Connector, StreamError, StreamSource};

#[derive(Debug, Clone, Copy)]
pub(crate) struct MemoryOptions {
    pub block_size: usize,
    /// Every seek lands this many bytes past the requested offset.
    pub seek_overshoot: u64,
    pub seekable: bool,
    pub duration: f64,
    /// Data past this offset is never delivered (end-of-data instead).
    pub truncate_at: Option<u64>,
    /// Reads fail once the position reaches this offset.
    pub fail_read_at: Option<u64>,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            block_size: 7,
            seek_overshoot: 0,
            seekable: true,
            duration: 30.0,
            truncate_at: None,
            fail_read_at: None,
        }
    }
}

pub(crate) struct MemoryConnector {
    data: Arc<Vec<u8>>,
    opts: MemoryOptions,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl MemoryConnector {
    pub fn new(data: Vec<u8>, opts: MemoryOptions) -> Self {
        Self {
            data: Arc::new(data),
            opts,
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Connector for MemoryConnector {
    fn open(&self, _url: &str, _bandwidth: u32) -> Result<Box<dyn StreamSource>, StreamError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryStream {
            data: Arc::clone(&self.data),
            opts: self.opts,
            pos: 0,
            closes: Arc::clone(&self.closes),
        }))
    }
}

struct MemoryStream {
    data: Arc<Vec<u8>>,
    opts: MemoryOptions,
    pos: u64,
    closes: Arc<AtomicUsize>,
}

impl StreamSource for MemoryStream {
    fn length(&self) -> u64 {
        self.data.len() as u64
    }

    fn duration(&self) -> f64 {
        self.opts.duration
    }

    fn seekable(&self) -> bool {
        self.opts.seekable
    }

    fn seek(&mut self, offset: u64) -> Result<u64, StreamError> {
        if !self.opts.seekable {
            return Err(StreamError::Seek("stream is not seekable".into()));
        }
        self.pos = (offset + self.opts.seek_overshoot).min(self.data.len() as u64);
        Ok(self.pos)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if let Some(at) = self.opts.fail_read_at {
            if self.pos >= at {
                return Err(StreamError::Read("injected failure".into()));
            }
        }
        let limit = self
            .opts
            .truncate_at
            .unwrap_or(u64::MAX)
            .min(self.data.len() as u64);
        if self.pos >= limit {
            return Ok(0);
        }
        let n = (limit - self.pos).min(self.opts.block_size as u64).min(buf.len() as u64) as usize;
        let start = self.pos as usize;
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
