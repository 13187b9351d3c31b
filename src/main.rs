use std::process;

use anyhow::anyhow;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskboard::cli::{self, Cli};

const LOG_ENV: &str = "TASKBOARD_LOG";

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn main() {
    if let Err(e) = init_logging() {
        eprintln!("Warning: {e:#}");
    }

    let cli_args = Cli::parse();
    let exit_code = cli::run(cli_args);

    process::exit(exit_code);
}
