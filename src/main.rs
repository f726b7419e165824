//! # Maintenance API Main Entry Point
//!
//! `maintenance-api serve` (the default) runs the HTTP server;
//! `maintenance-api migrate` applies pending schema migrations and exits.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use maintenance_api::{
    config::ConfigLoader,
    db,
    migration::{Migrator, MigratorTrait},
    server::run_server,
    telemetry,
};

#[derive(Debug, Parser)]
#[command(name = "maintenance-api", version, about = "Multi-tenant maintenance backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("Failed to load configuration")?;

    telemetry::init_tracing(&config).context("Failed to initialise tracing")?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = db::init_pool(&config).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Migrate => {
            Migrator::up(&db, None)
                .await
                .context("Failed to apply migrations")?;
            tracing::info!("Migrations applied");
            Ok(())
        }
        Commands::Serve => {
            if config.run_migrations {
                Migrator::up(&db, None)
                    .await
                    .context("Failed to apply migrations")?;
                tracing::info!("Migrations applied");
            }

            run_server(Arc::new(config), db).await
        }
    }
}
