//! Local capture files served through the stream interface.
//!
//! Accepts `file://` URLs and plain paths. Seeks land exactly on the requested
//! offset and reads return at most `read_block` bytes, which mirrors the
//! block-oriented delivery of the network backend.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use super::{url_scheme, Connector, StreamError, StreamSource};

/// Default number of bytes returned by one `read` call.
pub const DEFAULT_READ_BLOCK: usize = 4096;

#[derive(Debug, Clone)]
pub struct LocalConnector {
    read_block: usize,
}

impl LocalConnector {
    pub fn new(read_block: usize) -> Self {
        Self {
            read_block: read_block.max(1),
        }
    }
}

impl Default for LocalConnector {
    fn default() -> Self {
        Self::new(DEFAULT_READ_BLOCK)
    }
}

/// Maps a `file://` URL or a plain path to a filesystem path.
fn local_path(url: &str) -> Result<PathBuf, StreamError> {
    match url_scheme(url) {
        None => Ok(PathBuf::from(url)),
        Some("file") => url::Url::parse(url)
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .ok_or_else(|| StreamError::Connect {
                url: url.to_string(),
            }),
        Some(other) => Err(StreamError::UnsupportedScheme(other.to_string())),
    }
}

impl Connector for LocalConnector {
    fn open(&self, url: &str, _bandwidth: u32) -> Result<Box<dyn StreamSource>, StreamError> {
        let path = local_path(url)?;
        let file = File::open(&path).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "open local stream failed");
            StreamError::Connect {
                url: url.to_string(),
            }
        })?;
        Ok(Box::new(LocalStream::new(file, self.read_block)?))
    }
}

pub struct LocalStream {
    file: Option<File>,
    length: u64,
    pos: u64,
    read_block: usize,
}

impl LocalStream {
    pub fn new(file: File, read_block: usize) -> Result<Self, StreamError> {
        let length = file.metadata()?.len();
        Ok(Self {
            file: Some(file),
            length,
            pos: 0,
            read_block: read_block.max(1),
        })
    }

    fn file(&mut self) -> Result<&mut File, StreamError> {
        self.file
            .as_mut()
            .ok_or_else(|| StreamError::Read("stream is closed".into()))
    }
}

impl StreamSource for LocalStream {
    fn length(&self) -> u64 {
        self.length
    }

    /// Raw captures carry no duration header.
    fn duration(&self) -> f64 {
        0.0
    }

    /// The file size is exact, so progress estimates stay meaningful.
    fn duration_known(&self) -> bool {
        true
    }

    fn seekable(&self) -> bool {
        true
    }

    fn seek(&mut self, offset: u64) -> Result<u64, StreamError> {
        let target = offset.min(self.length);
        let landed = self
            .file()?
            .seek(SeekFrom::Start(target))
            .map_err(|e| StreamError::Seek(e.to_string()))?;
        self.pos = landed;
        Ok(landed)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let want = buf.len().min(self.read_block);
        let n = self
            .file()?
            .read(&mut buf[..want])
            .map_err(|e| StreamError::Read(e.to_string()))?;
        self.pos += n as u64;
        Ok(n)
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn close(&mut self) {
        self.file = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn capture(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn reads_in_blocks_and_reports_length() {
        let data: Vec<u8> = (0u8..=99).collect();
        let f = capture(&data);
        let connector = LocalConnector::new(16);
        let mut s = connector.open(f.path().to_str().unwrap(), 0).unwrap();
        assert_eq!(s.length(), 100);
        assert!(s.seekable());
        assert!(s.duration_known());

        let mut buf = [0u8; 64];
        assert_eq!(s.read(&mut buf).unwrap(), 16);
        assert_eq!(&buf[..16], &data[..16]);
        assert_eq!(s.position(), 16);
    }

    #[test]
    fn seek_is_exact_and_clamped() {
        let data: Vec<u8> = (0u8..=99).collect();
        let f = capture(&data);
        let url = url::Url::from_file_path(f.path()).unwrap().to_string();
        let mut s = LocalConnector::default().open(&url, 0).unwrap();
        assert_eq!(s.seek(42).unwrap(), 42);
        let mut buf = [0u8; 4];
        s.read(&mut buf).unwrap();
        assert_eq!(buf, [42, 43, 44, 45]);
        assert_eq!(s.seek(1000).unwrap(), 100);
        assert_eq!(s.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn missing_file_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.asf");
        let err = LocalConnector::default()
            .open(missing.to_str().unwrap(), 0)
            .err()
            .unwrap();
        assert!(matches!(err, StreamError::Connect { .. }));
    }

    #[test]
    fn read_after_close_fails() {
        let f = capture(b"abc");
        let mut s = LocalConnector::default()
            .open(f.path().to_str().unwrap(), 0)
            .unwrap();
        s.close();
        let mut buf = [0u8; 4];
        assert!(s.read(&mut buf).is_err());
    }
}
