use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskdeck::auth::AuthStore;
use taskdeck::gateway::{run_gateway, AppState};
use taskdeck::tasks::TaskStore;
use taskdeck::token::TokenService;
use taskdeck::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskdeck", version, about = "Multi-user kanban task board server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway (the default).
    Serve {
        /// Bind host (overrides TASKDECK_HOST).
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides TASKDECK_PORT).
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskdeck=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let (host, port) = match cli.command {
        Some(Command::Serve { host, port }) => (
            host.unwrap_or_else(|| config.host.clone()),
            port.unwrap_or(config.port),
        ),
        None => (config.host.clone(), config.port),
    };

    let state = AppState {
        auth: Arc::new(AuthStore::open(&config.database_path)?),
        tasks: Arc::new(TaskStore::open(&config.database_path)?),
        tokens: Arc::new(TokenService::new(&config.token_secret)),
    };
    tracing::info!("stores opened at {}", config.database_path.display());

    run_gateway(&host, port, state).await
}
