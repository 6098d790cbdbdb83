//! # WishCraft API Main Entry Point

use clap::{Parser, Subcommand};
use migration::MigratorTrait;
use wishcraft::{config::ConfigLoader, db, server, telemetry};

#[derive(Parser)]
#[command(name = "wishcraft", about = "WishCraft gift registry reconciliation service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load()?;
    telemetry::init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "effective configuration");
    }

    let pool = db::init_pool(&config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            migration::Migrator::up(&pool, None).await?;
            server::run_server(config, pool).await
        }
        Command::Migrate => {
            migration::Migrator::up(&pool, None).await?;
            tracing::info!("migrations applied");
            Ok(())
        }
    }
}
