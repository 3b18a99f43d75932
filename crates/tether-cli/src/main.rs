mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg, StorageBackendArg};
use crate::commands::App;
use anyhow::Context;
use clap::Parser;
use tether_core::Repository;
use tether_storage::{InMemoryRepository, MySqlRepository};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse();
    init_tracing(config.log_format);

    info!(
        storage_backend = %config.storage,
        base_url = %config.base_url,
        "starting tether"
    );

    match config.storage {
        StorageBackendArg::InMemory => {
            if let Command::Op(operation) = &config.command {
                commands::ensure_runnable_in_memory(operation)?;
            }
            serve(InMemoryRepository::new(), &config).await
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(mysql_dsn)
                .await
                .context("failed to connect to mysql")?;
            if matches!(config.command, Command::InitSchema) {
                repository.init_schema().await?;
                info!("mysql schema created");
                return Ok(());
            }
            serve(repository, &config).await
        }
    }
}

async fn serve<R: Repository>(repository: R, config: &Cli) -> anyhow::Result<()> {
    match &config.command {
        Command::InitSchema => {
            info!(storage_backend = %config.storage, "storage has no schema to create");
            Ok(())
        }
        Command::Batch => {
            let app = App::new(repository, config)?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            commands::run_batch(&app, stdin, &mut std::io::stdout()).await
        }
        Command::Op(operation) => {
            let app = App::new(repository, config)?;
            let document = app.execute(operation).await?;
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(())
        }
    }
}

/// Logs go to stderr so that stdout carries only command output.
fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormatArg::Json => builder.json().init(),
        LogFormatArg::Pretty => builder.init(),
    }
}
