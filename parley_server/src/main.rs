use clap::Parser;
use parley_server::{commands::Command, config::read_config, state::AppState};
use tracing_subscriber::prelude::*;


#[derive(Parser)]
#[command(name = "parley_server", about = "Negotiation result reconciliation and ranking server")]
struct Cli {
    /// YAML config file. Falls back to PARLEY_SERVER_CONFIG.
    #[arg(long)]
    config: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = read_config(cli.config.as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging_config.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app_state = AppState::new(&config).await?;
    cli.command.unwrap_or(Command::Serve).run(app_state, &config).await
}
