//! jobcompass CLI
//!
//! Manual-operation and smoke-testing entry point over the retrieval core.

use anyhow::Result;
use clap::Parser;
use jobcompass_core::Config;

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref())?;

    match cli.command {
        Commands::Search(args) => commands::search::run(args, &config, cli.format).await,
        Commands::Classify(args) => commands::classify::run(args, &config, cli.format).await,
        Commands::Company(args) => commands::company::run(args, &config, cli.format),
        Commands::Status => commands::status::run(&config, cli.format),
    }
}
