//! `mmsdl <URL> [FILENAME]`: resolve, download, report.

use anyhow::{Context, Result};
use mmsdl_core::config::{self, MmsdlConfig};
use mmsdl_core::progress::ProgressStats;
use mmsdl_core::resolver::resolver_for;
use mmsdl_core::stream::{connector_for, DEFAULT_READ_BLOCK};
use mmsdl_core::url_model::choose_output_path;
use mmsdl_core::{download, CancelToken, DownloadError, DownloadOutcome, DownloadRequest};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

use super::format::seconds_to_string;
use super::progress::{print_progress, OutputMode};
use super::{Cli, RunStatus};

/// Builds the request from config defaults overridden by command-line flags.
pub fn build_request(cli: &Cli, cfg: &MmsdlConfig, url: &str, destination: PathBuf) -> DownloadRequest {
    let mut request = DownloadRequest::from_config(url, destination, cfg);
    if let Some(bandwidth) = cli.bandwidth {
        request.bandwidth = bandwidth;
    }
    request.segments = if cli.resume {
        1
    } else {
        cli.num_connections.unwrap_or(cfg.default_segments).max(1)
    };
    request.timeout = cli.time.and_then(time_limit);
    request.resume = cli.resume;
    request.strict_segments |= cli.strict_segments;
    request
}

/// `-t 0` means no limit, as does a span too long to count in seconds.
fn time_limit(minutes: u64) -> Option<Duration> {
    if minutes == 0 {
        return None;
    }
    minutes.checked_mul(60).map(Duration::from_secs)
}

pub async fn run_download(cli: Cli) -> Result<RunStatus> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    let mode = OutputMode::new(cli.quiet, cli.json);

    let input = cli.url.clone();
    let resolved = tokio::task::spawn_blocking(move || resolver_for(&input).resolve())
        .await
        .context("resolver task failed")??;

    let destination = choose_output_path(
        cli.filename.as_deref(),
        &resolved.url,
        cli.clobber || cli.resume,
    );
    let request = build_request(&cli, &cfg, &resolved.url, destination);
    let connector = connector_for(
        &request.url,
        cfg.read_block_size.unwrap_or(DEFAULT_READ_BLOCK),
    )?;

    if mode == OutputMode::Text {
        println!("{} => {}", request.url, request.destination.display());
        if cli.verbose {
            println!("Using up to {} parallel connections", request.segments);
        }
    }

    let (progress_tx, progress_rx) = tokio::sync::mpsc::channel::<ProgressStats>(16);
    let printer = tokio::spawn(print_progress(progress_rx, mode));
    let progress_tx = (mode != OutputMode::Quiet).then_some(progress_tx);

    let abort = CancelToken::new();
    let interrupt = {
        let abort = abort.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping download");
                abort.cancel();
            }
        })
    };

    let outcome = {
        let request = request.clone();
        tokio::task::spawn_blocking(move || download(&request, connector, progress_tx, &abort))
            .await
            .context("download task failed")?
    };
    interrupt.abort();
    let _ = printer.await;

    Ok(report(&outcome, mode))
}

/// Prints the outcome and maps it to an exit status. Errors always go to
/// stderr, even in quiet mode.
fn report(outcome: &DownloadOutcome, mode: OutputMode) -> RunStatus {
    let status = match outcome {
        DownloadOutcome::Completed { .. } => RunStatus::Completed,
        DownloadOutcome::TimedOut { .. } => RunStatus::TimedOut,
        DownloadOutcome::Failed(DownloadError::Aborted) => RunStatus::Aborted,
        DownloadOutcome::Failed(_) => RunStatus::Failed,
    };

    if mode == OutputMode::Json {
        println!("{}", outcome_json(outcome));
        return status;
    }

    match outcome {
        DownloadOutcome::Completed { elapsed, .. } => {
            if mode == OutputMode::Text {
                println!("Download complete!");
                println!("Download time: {}", seconds_to_string(Some(elapsed.as_secs_f64())));
            }
        }
        DownloadOutcome::TimedOut { .. } => {
            if mode == OutputMode::Text {
                println!("Download stopped after user-specified timeout.");
            }
        }
        DownloadOutcome::Failed(DownloadError::Aborted) => {
            if mode == OutputMode::Text {
                eprintln!("Download aborted by user.");
            }
        }
        DownloadOutcome::Failed(err) => eprintln!("mmsdl error: {}", err),
    }
    status
}

fn outcome_json(outcome: &DownloadOutcome) -> serde_json::Value {
    match outcome {
        DownloadOutcome::Completed { elapsed, bytes } => json!({
            "outcome": "completed",
            "bytes": bytes,
            "elapsed_secs": elapsed.as_secs_f64(),
        }),
        DownloadOutcome::TimedOut { elapsed, bytes } => json!({
            "outcome": "timed_out",
            "bytes": bytes,
            "elapsed_secs": elapsed.as_secs_f64(),
        }),
        DownloadOutcome::Failed(err) => json!({
            "outcome": "failed",
            "error": err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn flags_override_config() {
        let cfg = MmsdlConfig::default();
        let c = cli(&["mmsdl", "-n", "3", "-b", "56000", "-t", "2", "--strict-segments", "mms://h/a"]);
        let r = build_request(&c, &cfg, "mms://h/a", PathBuf::from("a.wmv"));
        assert_eq!(r.segments, 3);
        assert_eq!(r.bandwidth, 56000);
        assert_eq!(r.timeout, Some(Duration::from_secs(120)));
        assert!(r.strict_segments);
        assert!(!r.resume);
    }

    #[test]
    fn zero_minutes_is_no_limit() {
        let cfg = MmsdlConfig::default();
        let r = build_request(&cli(&["mmsdl", "-t", "0", "mms://h/a"]), &cfg, "mms://h/a", PathBuf::from("a.wmv"));
        assert_eq!(r.timeout, None);
    }

    #[test]
    fn huge_time_limit_does_not_overflow() {
        let cfg = MmsdlConfig::default();
        let max = u64::MAX.to_string();
        let r = build_request(&cli(&["mmsdl", "-t", &max, "mms://h/a"]), &cfg, "mms://h/a", PathBuf::from("a.wmv"));
        assert_eq!(r.timeout, None);
        let big = (u64::MAX / 60).to_string();
        let r = build_request(&cli(&["mmsdl", "-t", &big, "mms://h/a"]), &cfg, "mms://h/a", PathBuf::from("a.wmv"));
        assert_eq!(r.timeout, Some(Duration::from_secs(u64::MAX / 60 * 60)));
    }

    #[test]
    fn config_defaults_apply() {
        let cfg = MmsdlConfig {
            default_segments: 6,
            ..MmsdlConfig::default()
        };
        let r = build_request(&cli(&["mmsdl", "mms://h/a"]), &cfg, "mms://h/a", PathBuf::from("a.wmv"));
        assert_eq!(r.segments, 6);
        assert_eq!(r.bandwidth, cfg.bandwidth);
        assert_eq!(r.timeout, None);
    }

    #[test]
    fn resume_forces_one_connection() {
        let cfg = MmsdlConfig::default();
        let r = build_request(&cli(&["mmsdl", "-r", "mms://h/a"]), &cfg, "mms://h/a", PathBuf::from("a.wmv"));
        assert!(r.resume);
        assert_eq!(r.segments, 1);
    }

    #[test]
    fn exit_status_per_outcome() {
        let done = DownloadOutcome::Completed {
            elapsed: Duration::from_secs(1),
            bytes: 10,
        };
        let late = DownloadOutcome::TimedOut {
            elapsed: Duration::from_secs(60),
            bytes: 5,
        };
        assert_eq!(report(&done, OutputMode::Quiet), RunStatus::Completed);
        assert_eq!(report(&late, OutputMode::Quiet), RunStatus::TimedOut);
        assert_eq!(
            report(&DownloadOutcome::Failed(DownloadError::Aborted), OutputMode::Quiet),
            RunStatus::Aborted
        );
        assert_eq!(
            report(&DownloadOutcome::Failed(DownloadError::NotResumable), OutputMode::Quiet),
            RunStatus::Failed
        );
    }

    #[test]
    fn json_outcome_shape() {
        let v = outcome_json(&DownloadOutcome::TimedOut {
            elapsed: Duration::from_secs(2),
            bytes: 7,
        });
        assert_eq!(v["outcome"], "timed_out");
        assert_eq!(v["bytes"], 7);
    }
}
