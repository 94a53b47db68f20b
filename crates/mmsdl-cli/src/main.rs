use std::process::ExitCode;

use clap::Parser;
use mmsdl_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = cli.validate() {
        err.exit();
    }

    // Initialize logging as early as possible.
    if cli.verbose {
        logging::init_logging_stderr(true);
    } else if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr(false);
        tracing::warn!("file logging unavailable, using stderr: {:#}", err);
    }

    match cli::run(cli).await {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("mmsdl error: {:#}", err);
            ExitCode::from(1)
        }
    }
}
