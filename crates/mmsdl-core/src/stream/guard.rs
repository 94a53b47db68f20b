//! RAII guard that closes a stream connection exactly once.

use std::ops::{Deref, DerefMut};

use super::StreamSource;

/// Owns one open connection and closes it when dropped, whether the owner
/// finishes, fails, is cancelled, or unwinds.
pub struct StreamGuard {
    inner: Box<dyn StreamSource>,
    closed: bool,
}

impl StreamGuard {
    pub fn new(inner: Box<dyn StreamSource>) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    /// Closes the connection now instead of at drop.
    pub fn close(mut self) {
        self.close_once();
    }

    fn close_once(&mut self) {
        if !self.closed {
            self.closed = true;
            self.inner.close();
        }
    }
}

impl Deref for StreamGuard {
    type Target = dyn StreamSource;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for StreamGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.close_once();
    }
}
