mod application;
mod domain;
mod infrastructure;
mod presentation;

use clap::Parser;
use colored::Colorize;
use crate::presentation::cli::Cli;

/// hurlsh: HTTP requests against named service connections
///
/// Connections (a service URL, an optional auth token and headers) are defined
/// in a config file. Requests go to the current connection, chosen by the
/// `--connection` flag, a `set connection` command, or the configured default.
/// Run `hurlsh interactive` for a prompt where the selection persists between
/// commands.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = cli.run().await {
        eprintln!("{}", format!("{:#}", err).red());
        std::process::exit(1);
    }
}
