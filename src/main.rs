use clap::Parser;
use fileops::cli::{Cli, run_cli};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // FILEOPS_LOG overrides the default level; --verbose raises it to debug.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("FILEOPS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("fileops={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run_cli(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
