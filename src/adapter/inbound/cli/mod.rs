//! CLI module graph.

pub mod command;
pub mod events;
pub mod run;
pub mod seed;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use command::{Cli, Commands};

/// Dispatch a parsed command.
pub async fn execute(cli: &Cli, config: Config, cancel: CancellationToken) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => run::execute(args, config, cli.json, cancel).await,
        Commands::Events(_) => events::execute(&config, cli.json).await,
        Commands::Seed(_) => seed::execute(&config, cli.json).await,
    }
}
