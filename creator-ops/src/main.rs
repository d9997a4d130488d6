use cja::setup::{setup_error_reporting, setup_tracing};
use clap::Parser;
use commands::Command;

pub use cja::Result;

mod commands;
mod config;
mod cron;
mod discord;
mod jobs;
mod notifier;
mod state;
mod video_stats;
mod youtube;

#[derive(Parser)]
#[command(author, version, about)]
struct CliArgs {
    #[clap(subcommand)]
    command: Option<Command>,
}

fn main() -> Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?
        .block_on(async { _main().await })
}

async fn _main() -> Result<()> {
    let dotenv_result = dotenvy::dotenv();
    setup_error_reporting()?;
    setup_tracing("creator-ops")?;

    match dotenv_result {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => return Err(err.into()),
    }

    let cli = CliArgs::parse();
    let command = cli.command.unwrap_or_default();

    command.run().await
}
