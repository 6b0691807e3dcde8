//! Recall application binary - composition root.
//!
//! Ties the Recall crates into a single executable:
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Open the memory store (SQLite file or in-process)
//! 3. Build a chat session over the template responder
//! 4. Run the interactive loop on stdin/stdout

mod cli;
mod repl;

use std::sync::Arc;

use clap::Parser;
use recall_chat::{ChatSession, TemplateResponder};
use recall_core::config::{RecallConfig, StorageBackend};
use recall_storage::{InMemoryStore, KeyValueStore, SqliteStore};

use crate::cli::CliArgs;

/// Open the configured key-value backend.
fn open_store(config: &RecallConfig) -> Result<Arc<dyn KeyValueStore>, Box<dyn std::error::Error>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory store; memory will not persist");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageBackend::Sqlite => {
            let data_dir = config.general.data_path();
            if let Err(e) = std::fs::create_dir_all(&data_dir) {
                tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
                return Err(e.into());
            }
            let db_path = data_dir.join(&config.storage.database_file);
            let store = SqliteStore::open(&db_path)?;
            tracing::info!(path = %db_path.display(), "SQLite memory store opened");
            Ok(Arc::new(store))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = RecallConfig::load_or_default(&config_file);
    args.apply(&mut config);

    // Tracing goes to stderr so chat output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Recall v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Storage.
    let store = open_store(&config)?;

    // Session.
    let session = ChatSession::from_config(&config, Arc::new(TemplateResponder::new()), store);
    let memory = session.memory()?;
    tracing::info!(
        turns = memory.conversation_history.len(),
        "Chat session ready"
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    repl::run(&session, stdin, tokio::io::stdout()).await?;

    tracing::info!("Goodbye");
    Ok(())
}
