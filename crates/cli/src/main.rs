//! `fx-bars` binary.
//!
//! Exit status 0 with a confirmation on stdout on success; exit status 1 with
//! the error on stderr otherwise. Logs go to stderr (`RUST_LOG`, default `info`).

mod cli;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = cli::Cli::parse();
    let label = cli.command.label();

    let status = cli::report(
        label,
        cli::run(cli),
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    );
    ExitCode::from(status)
}
