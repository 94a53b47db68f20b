//! Renders progress snapshots from the downloader.

use std::io::Write;

use mmsdl_core::ProgressStats;
use tokio::sync::mpsc::Receiver;

use super::format::{bytes_to_string, seconds_to_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,
    Text,
    Json,
}

impl OutputMode {
    pub fn new(quiet: bool, json: bool) -> Self {
        if quiet {
            OutputMode::Quiet
        } else if json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }
}

/// `done / total (rate/s, eta remaining)`.
pub fn status_line(stats: &ProgressStats) -> String {
    format!(
        "{} / {} ({}/s, {} remaining)",
        bytes_to_string(Some(stats.bytes_done as f64)),
        bytes_to_string(stats.total_bytes.map(|t| t as f64)),
        bytes_to_string(Some(stats.bytes_per_sec)),
        seconds_to_string(stats.eta_secs),
    )
}

/// Prints every snapshot until the downloader drops its sender.
pub async fn print_progress(mut rx: Receiver<ProgressStats>, mode: OutputMode) {
    let mut width = 0usize;
    while let Some(stats) = rx.recv().await {
        match mode {
            OutputMode::Quiet => {}
            OutputMode::Json => match serde_json::to_string(&stats) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!("could not encode progress: {e}"),
            },
            OutputMode::Text => {
                let line = status_line(&stats);
                let pad = width.saturating_sub(line.chars().count());
                print!("\r {}{}", line, " ".repeat(pad));
                let _ = std::io::stdout().flush();
                width = line.chars().count();
            }
        }
    }
    if mode == OutputMode::Text && width > 0 {
        println!();
    }
}
