//! edgecheck - connectivity checks against telephony edge servers.
//!
//! Usage:
//!   edgecheck probe [--targets <LIST> | --site <NAME>] [--ports <LIST>] [--output plain|json|csv]
//!   edgecheck hosts [--site <NAME>]

use anyhow::Context as _;
use clap::Parser;
use edgecheck::cli::Cli;
use edgecheck::output;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flags
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    cli.execute().await.context("edgecheck failed")
}
