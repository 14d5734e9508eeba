use crate::aggregator::{BatchResult, aggregate};
use crate::catalog::InstrumentCatalog;
use crate::core::config::{AppConfig, BatchConfig};
use crate::core::{FetchError, InstrumentRef, ProxyMapping, QuoteClient};
use crate::fetcher::{BatchRequest, RateLimitedBatchFetcher};
use crate::resolver::PriceResolver;
use std::sync::Arc;
use tracing::info;

/// Entry point for callers: selects instruments, runs the batch and aggregates the outcomes.
pub struct QuoteService {
    resolver: Arc<PriceResolver>,
    fetcher: RateLimitedBatchFetcher,
    catalog: InstrumentCatalog,
    batch: BatchConfig,
}

impl QuoteService {
    pub fn new(
        client: Arc<dyn QuoteClient>,
        proxies: Arc<ProxyMapping>,
        catalog: InstrumentCatalog,
        batch: BatchConfig,
    ) -> Self {
        let resolver = Arc::new(PriceResolver::new(client, batch.call_timeout()));
        let fetcher = RateLimitedBatchFetcher::new(Arc::clone(&resolver), proxies);
        QuoteService {
            resolver,
            fetcher,
            catalog,
            batch,
        }
    }

    pub fn from_config(config: &AppConfig, client: Arc<dyn QuoteClient>) -> Self {
        Self::new(
            client,
            Arc::new(config.proxy_mapping()),
            InstrumentCatalog::from_config(config),
            config.batch.clone(),
        )
    }

    pub fn catalog(&self) -> &InstrumentCatalog {
        &self.catalog
    }

    pub async fn batch(&self, category: Option<&str>) -> Result<BatchResult, FetchError> {
        let instruments = self.catalog.select(category);
        info!(
            category = category.unwrap_or("all"),
            count = instruments.len(),
            "Fetching batch"
        );
        self.fetch(instruments).await
    }

    pub async fn indices(&self) -> Result<BatchResult, FetchError> {
        self.fetch(self.catalog.indices().to_vec()).await
    }

    /// Only batch-wide conditions fail the call; per-instrument failures land in
    /// [`BatchResult::failed`].
    pub async fn fetch(&self, instruments: Vec<InstrumentRef>) -> Result<BatchResult, FetchError> {
        self.resolver.check_credentials()?;

        let request = BatchRequest::new(
            instruments,
            self.batch.chunk_size,
            self.batch.inter_chunk_delay(),
        )?
        .with_deadline(self.batch.batch_timeout());
        let outcomes = self.fetcher.fetch_all(&request).await;
        let result = aggregate(&outcomes, request.instruments());

        info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "Batch complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Market;
    use crate::core::config::CategoryConfig;
    use crate::testing::{Reply, ScriptedClient};
    use rust_decimal_macros::dec;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.batch.inter_chunk_delay_ms = 0;
        config.categories = vec![CategoryConfig {
            name: "etf".to_string(),
            instruments: ["SPY", "QQQ", "DIA"]
                .map(|s| InstrumentRef::equity(s, Market::Nyse))
                .to_vec(),
        }];
        config
    }

    #[tokio::test]
    async fn test_batch_partitions_category() {
        let client = Arc::new(
            ScriptedClient::new()
                .reply("SPY", Reply::price(dec!(600)))
                .reply("QQQ", Reply::Unauthorized)
                .reply("DIA", Reply::price(dec!(440))),
        );
        let service = QuoteService::from_config(&config(), client);

        let result = service.batch(Some("etf")).await.unwrap();
        assert_eq!(result.succeeded.len(), 2);
        assert_eq!(result.failed, vec![InstrumentRef::equity("QQQ", Market::Nyse)]);
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_any_call() {
        let client = Arc::new(ScriptedClient::new().without_credentials());
        let service = QuoteService::from_config(&config(), client.clone());

        let err = service.batch(None).await.unwrap_err();
        assert!(matches!(err, FetchError::Configuration(_)));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_indices_use_proxy_fallback() {
        let client = Arc::new(
            ScriptedClient::new()
                .reply("SPX", Reply::price(dec!(6010.50)))
                .reply("NDX", Reply::quote(dec!(0), dec!(0), dec!(0)))
                .reply("QQQ", Reply::quote(dec!(620.00), dec!(5.00), dec!(0.81)))
                .reply("DJI", Reply::Business),
        );
        let service = QuoteService::from_config(&config(), client);

        let result = service.indices().await.unwrap();
        // RUT and its proxy have no script and fail
        assert_eq!(result.succeeded.len(), 2);
        assert_eq!(result.succeeded[0].instrument.symbol, "SPX");
        assert!(!result.succeeded[0].is_estimated);
        assert_eq!(result.succeeded[1].instrument.symbol, "NDX");
        assert!(result.succeeded[1].is_estimated);
        assert_eq!(result.succeeded[1].current_value, dec!(21700.00));
        let failed: Vec<&str> = result.failed.iter().map(|i| i.symbol.as_str()).collect();
        assert_eq!(failed, ["DJI", "RUT"]);
    }

    #[tokio::test]
    async fn test_unknown_category_is_empty_success() {
        let service = QuoteService::from_config(&config(), Arc::new(ScriptedClient::new()));
        let result = service.batch(Some("crypto")).await.unwrap();
        assert!(result.is_empty());
    }
}
