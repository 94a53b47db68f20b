//! Builder for creating (and optionally preallocating) the output file.

use std::fs::File;
use std::path::{Path, PathBuf};

use super::writer::{StorageWriter, WriteMode};
use crate::error::DownloadError;
#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Builder for a fresh output file. Call `preallocate` (optional) then `build`.
pub struct StorageWriterBuilder {
    file: File,
    path: PathBuf,
}

impl StorageWriterBuilder {
    /// Create the output file at `path`, truncating it if it already exists.
    pub fn create(path: &Path) -> Result<Self, DownloadError> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| DownloadError::storage("create", path, e))?;
        Ok(StorageWriterBuilder {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Preallocate `size` bytes. On Unix tries `posix_fallocate` for real block
    /// allocation; falls back to `set_len` on failure or non-Unix.
    pub fn preallocate(&mut self, size: u64) -> Result<(), DownloadError> {
        #[cfg(unix)]
        {
            let fd = self.file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        self.file
            .set_len(size)
            .map_err(|e| DownloadError::storage("preallocate", &self.path, e))
    }

    pub fn build(self) -> StorageWriter {
        StorageWriter::from_parts(self.file, self.path, WriteMode::Positional, 0)
    }
}
