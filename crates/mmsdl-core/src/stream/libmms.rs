//! MMS backend: binding to the system libmms (`mmsx_*` API).
//!
//! `mmsx_connect` negotiates MMS over TCP and falls back to MMS over HTTP,
//! so one handle type covers `mms://`, `mmst://` and `mmsh://`.

use std::ffi::CString;

use libc::{c_char, c_double, c_int, c_uint, c_void, off_t};

use super::{Connector, StreamError, StreamSource};

/// Upper bound for one `mmsx_read` call.
const READ_BLOCK: usize = 4096;

#[repr(C)]
struct MmsxHandle {
    _private: [u8; 0],
}

#[link(name = "mms")]
extern "C" {
    fn mmsx_connect(
        io: *mut c_void,
        data: *mut c_void,
        url: *const c_char,
        bandwidth: c_int,
    ) -> *mut MmsxHandle;
    fn mmsx_read(io: *mut c_void, handle: *mut MmsxHandle, data: *mut c_char, len: c_int) -> c_int;
    fn mmsx_seek(io: *mut c_void, handle: *mut MmsxHandle, offset: off_t, origin: c_int) -> off_t;
    fn mmsx_get_length(handle: *mut MmsxHandle) -> c_uint;
    fn mmsx_get_time_length(handle: *mut MmsxHandle) -> c_double;
    fn mmsx_get_seekable(handle: *mut MmsxHandle) -> c_int;
    fn mmsx_get_current_pos(handle: *mut MmsxHandle) -> off_t;
    fn mmsx_close(handle: *mut MmsxHandle);
}

/// Opens libmms connections. Stateless; every `open` is a fresh handshake.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibmmsConnector;

impl Connector for LibmmsConnector {
    fn open(&self, url: &str, bandwidth: u32) -> Result<Box<dyn StreamSource>, StreamError> {
        let c_url = CString::new(url).map_err(|_| StreamError::Connect {
            url: url.to_string(),
        })?;
        let bandwidth = c_int::try_from(bandwidth).unwrap_or(c_int::MAX);
        // SAFETY: null io/data select libmms' default socket I/O; c_url outlives the call.
        let handle = unsafe {
            mmsx_connect(
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                c_url.as_ptr(),
                bandwidth,
            )
        };
        if handle.is_null() {
            return Err(StreamError::Connect {
                url: url.to_string(),
            });
        }
        tracing::debug!(url, bandwidth, "libmms connected");
        Ok(Box::new(LibmmsStream { handle }))
    }
}

struct LibmmsStream {
    handle: *mut MmsxHandle,
}

// SAFETY: a libmms handle has no thread affinity; the owning worker is the
// only user and never shares it.
unsafe impl Send for LibmmsStream {}

impl LibmmsStream {
    fn live(&self) -> Result<*mut MmsxHandle, StreamError> {
        if self.handle.is_null() {
            Err(StreamError::Read("connection is closed".into()))
        } else {
            Ok(self.handle)
        }
    }
}

impl StreamSource for LibmmsStream {
    fn length(&self) -> u64 {
        match self.live() {
            // SAFETY: handle is a live mmsx_connect result.
            Ok(h) => u64::from(unsafe { mmsx_get_length(h) }),
            Err(_) => 0,
        }
    }

    fn duration(&self) -> f64 {
        match self.live() {
            // SAFETY: handle is a live mmsx_connect result.
            Ok(h) => unsafe { mmsx_get_time_length(h) },
            Err(_) => 0.0,
        }
    }

    fn seekable(&self) -> bool {
        match self.live() {
            // SAFETY: handle is a live mmsx_connect result.
            Ok(h) => unsafe { mmsx_get_seekable(h) } != 0,
            Err(_) => false,
        }
    }

    fn seek(&mut self, offset: u64) -> Result<u64, StreamError> {
        let h = self.live()?;
        let offset = off_t::try_from(offset)
            .map_err(|_| StreamError::Seek(format!("offset {offset} out of range")))?;
        // SAFETY: handle is live; SEEK_SET is the only origin libmms honours for data seeks.
        let landed = unsafe { mmsx_seek(std::ptr::null_mut(), h, offset, libc::SEEK_SET) };
        u64::try_from(landed).map_err(|_| StreamError::Seek(format!("libmms returned {landed}")))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let h = self.live()?;
        let want = buf.len().min(READ_BLOCK) as c_int;
        // SAFETY: buf has at least `want` writable bytes; handle is live.
        let n = unsafe { mmsx_read(std::ptr::null_mut(), h, buf.as_mut_ptr().cast(), want) };
        usize::try_from(n).map_err(|_| StreamError::Read("libmms read error".into()))
    }

    fn position(&self) -> u64 {
        match self.live() {
            // SAFETY: handle is a live mmsx_connect result.
            Ok(h) => u64::try_from(unsafe { mmsx_get_current_pos(h) }).unwrap_or(0),
            Err(_) => 0,
        }
    }

    fn close(&mut self) {
        if !self.handle.is_null() {
            // SAFETY: handle came from mmsx_connect and is nulled so it is freed once.
            unsafe { mmsx_close(self.handle) };
            self.handle = std::ptr::null_mut();
        }
    }
}

impl Drop for LibmmsStream {
    fn drop(&mut self) {
        self.close();
    }
}
