//! Output file writer owned by the writer loop.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::DownloadError;
#[cfg(unix)]
use std::os::unix::fs::FileExt;

/// How chunk offsets map onto the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Every chunk is written at its absolute offset (pwrite).
    Positional,
    /// Chunks must arrive in order and continue the existing file.
    Append,
}

/// Single-owner writer for the output file.
pub struct StorageWriter {
    file: File,
    path: PathBuf,
    mode: WriteMode,
    /// Append mode: offset the next chunk must start at.
    end: u64,
}

impl StorageWriter {
    pub(crate) fn from_parts(file: File, path: PathBuf, mode: WriteMode, end: u64) -> Self {
        Self {
            file,
            path,
            mode,
            end,
        }
    }

    /// Open (or create) `path` for append; the current size is the resume offset.
    pub fn open_append(path: &Path) -> Result<Self, DownloadError> {
        let file = File::options()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| DownloadError::storage("open for append", path, e))?;
        let end = file
            .metadata()
            .map_err(|e| DownloadError::storage("stat", path, e))?
            .len();
        Ok(Self::from_parts(file, path.to_path_buf(), WriteMode::Append, end))
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Append mode: current file size. Positional mode: 0.
    pub fn end_offset(&self) -> u64 {
        self.end
    }

    /// Write `data` at absolute `offset`.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<(), DownloadError> {
        match self.mode {
            WriteMode::Positional => self.write_positional(offset, data),
            WriteMode::Append => {
                if offset != self.end {
                    return Err(DownloadError::storage(
                        "append to",
                        &self.path,
                        std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            format!("chunk at {offset} does not continue file end {}", self.end),
                        ),
                    ));
                }
                self.file
                    .write_all(data)
                    .map_err(|e| DownloadError::storage("append to", &self.path, e))?;
                self.end += data.len() as u64;
                Ok(())
            }
        }
    }

    #[cfg(unix)]
    fn write_positional(&mut self, offset: u64, data: &[u8]) -> Result<(), DownloadError> {
        self.file
            .write_all_at(data, offset)
            .map_err(|e| DownloadError::storage("write", &self.path, e))
    }

    #[cfg(not(unix))]
    fn write_positional(&mut self, offset: u64, data: &[u8]) -> Result<(), DownloadError> {
        use std::io::{Seek, SeekFrom};
        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.write_all(data))
            .map_err(|e| DownloadError::storage("write", &self.path, e))
    }

    /// Flush written data to disk.
    pub fn sync(&self) -> Result<(), DownloadError> {
        self.file
            .sync_data()
            .map_err(|e| DownloadError::storage("sync", &self.path, e))
    }

    /// Flush and release the file handle.
    pub fn close(self) -> Result<(), DownloadError> {
        self.sync()
    }
}
