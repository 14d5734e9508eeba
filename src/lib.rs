pub mod aggregator;
pub mod catalog;
pub mod cli;
pub mod core;
pub mod estimator;
pub mod fetcher;
pub mod providers;
pub mod resolver;
pub mod server;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

use crate::core::config::AppConfig;
use crate::providers::RestQuoteClient;
use crate::service::QuoteService;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Quotes { category: Option<String> },
    Indices,
    Serve { bind: Option<String> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("quotebatch starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        base_url = %config.provider.base_url,
        chunk_size = config.batch.chunk_size,
        proxies = config.proxies.len(),
        "Loaded config"
    );

    let client = Arc::new(RestQuoteClient::from_config(&config.provider)?);
    let service = Arc::new(QuoteService::from_config(&config, client));

    match command {
        AppCommand::Quotes { category } => {
            cli::quotes::run_batch(&service, category.as_deref()).await
        }
        AppCommand::Indices => cli::quotes::run_indices(&service).await,
        AppCommand::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            server::serve(server::AppState::new(service), &bind).await
        }
    }
}
