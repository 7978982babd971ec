use std::{io, process::ExitCode};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use users_api_config::load as load_config;
use users_api_runtime::{telemetry, SdkServices};

mod commands;

#[derive(Parser)]
#[command(name = "users-api")]
#[command(about = "Users API cache maintenance")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh User Cache. Users are fetched from the Users API and written into the Cache.
    RefreshUserCache,
    /// Refresh Subsidiary Cache. Subsidiaries are fetched from the Users API and written into the Cache.
    RefreshSubsidiaryCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;
    let services = SdkServices::initialise(&config)
        .await
        .context("failed to initialise users api services")?;

    let mut stdout = io::stdout();
    let outcome = match cli.command {
        Commands::RefreshUserCache => {
            info!("refreshing users cache");
            commands::refresh_user_cache(&services.client, &mut stdout).await
        }
        Commands::RefreshSubsidiaryCache => {
            info!("refreshing subsidiary cache");
            commands::refresh_subsidiary_cache(&services.client, &mut stdout).await
        }
    }
    .context("failed to write command output")?;

    Ok(outcome.exit_code())
}
