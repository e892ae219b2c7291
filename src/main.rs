use clap::Parser;
use scoreline::adapter::inbound::cli::{self, command::Cli};
use scoreline::infrastructure::config::settings::Config;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match Config::load(cli.config_path()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    config.init_logging();
    info!("scoreline starting");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            on_signal.cancel();
        }
    });

    if let Err(e) = cli::execute(&cli, config, cancel).await {
        error!(error = %e, "Fatal error");
        std::process::exit(1);
    }

    info!("scoreline stopped");
}
