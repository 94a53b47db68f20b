//! CLI for the mmsdl stream downloader.

mod download;
mod format;
mod progress;

use anyhow::Result;
use clap::builder::RangedU64ValueParser;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

pub use download::run_download;

/// mmsdl: download MMS streams over parallel connections.
#[derive(Debug, Parser)]
#[command(name = "mmsdl", version)]
#[command(about = "mmsdl: segmented MMS stream downloader", long_about = None)]
pub struct Cli {
    /// Stream URL (mms://, mmst://, mmsh://), an http(s) playlist, a local
    /// capture file, or `-` to read the URL from stdin.
    pub url: String,

    /// Output file (default: derived from the URL).
    pub filename: Option<PathBuf>,

    /// Overwrite an existing file instead of picking a new name.
    #[arg(short, long)]
    pub clobber: bool,

    /// Resume a partially downloaded stream (single connection only).
    #[arg(short, long)]
    pub resume: bool,

    /// Desired bandwidth for stream selection, in bytes per second.
    #[arg(short, long, value_name = "BYTES_PER_SEC")]
    pub bandwidth: Option<u32>,

    /// Stop downloading after MINUTES minutes (0: no limit).
    #[arg(short, long, value_name = "MINUTES")]
    pub time: Option<u64>,

    /// Print debug logs to stderr.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Don't print progress messages to stdout.
    #[arg(short, long)]
    pub quiet: bool,

    /// Number of parallel connections (default from config).
    #[arg(
        short = 'n',
        long,
        value_name = "N",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub num_connections: Option<usize>,

    /// Fail instead of falling back to one connection on non-seekable streams.
    #[arg(long)]
    pub strict_segments: bool,

    /// Print progress and the result as JSON lines.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Cross-argument checks clap cannot express.
    pub fn validate(&self) -> Result<(), clap::Error> {
        if self.resume && self.num_connections.is_some_and(|n| n > 1) {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "--resume works over a single connection; drop -n or use -n 1",
            ));
        }
        if self.filename.as_deref() == Some(Path::new("-")) {
            return Err(Cli::command().error(
                ErrorKind::InvalidValue,
                "writing the stream to stdout is not supported; give an output file name",
            ));
        }
        Ok(())
    }
}

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Failed,
    TimedOut,
    Aborted,
}

impl RunStatus {
    pub fn code(self) -> u8 {
        match self {
            RunStatus::Completed => 0,
            RunStatus::Failed => 1,
            RunStatus::TimedOut => 2,
            RunStatus::Aborted => 130,
        }
    }
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        ExitCode::from(status.code())
    }
}

pub async fn run(cli: Cli) -> Result<RunStatus> {
    run_download(cli).await
}

#[cfg(test)]
mod tests;
