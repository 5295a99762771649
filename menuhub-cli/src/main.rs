//! Menuhub CLI
//!
//! Signs in against a Menuhub API, keeps the session in a local file and
//! exercises the authenticated endpoints. Expired access tokens are refreshed
//! transparently by the client.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use menuhub_client::ClientError;
use tracing_subscriber::EnvFilter;

mod catalog_commands;
mod cli;
mod commands;
mod session_commands;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = commands::run(cli).await;

    if let Err(err) = &result {
        if err.downcast_ref::<ClientError>().is_some_and(ClientError::is_auth_terminal) {
            eprintln!("{} Session expired or invalid, run `menuhub login`", "!".yellow());
        }
    }
    result
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
