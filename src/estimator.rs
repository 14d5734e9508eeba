//! Estimation of index values the upstream reports as unsupported.
//!
//! The per-index endpoint answers `0` for indices it cannot price. For those, the value is
//! derived from a correlated proxy instrument (usually a tracking ETF) scaled by a fixed
//! multiplier. A failure to reach the index endpoint is a real failure; a failure to reach the
//! proxy is not, and the degenerate quote is returned as-is.

use crate::core::{FetchError, InstrumentRef, ProxyEntry, ProxyMapping, Quote};
use crate::resolver::PriceResolver;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct IndexFallbackEstimator {
    resolver: Arc<PriceResolver>,
    proxies: Arc<ProxyMapping>,
}

impl IndexFallbackEstimator {
    pub fn new(resolver: Arc<PriceResolver>, proxies: Arc<ProxyMapping>) -> Self {
        IndexFallbackEstimator { resolver, proxies }
    }

    #[instrument(name = "ResolveIndex", skip(self), fields(symbol = %index))]
    pub async fn resolve_index(&self, index: &InstrumentRef) -> Result<Quote, FetchError> {
        let primary = self.resolver.resolve(index).await?;
        if !primary.is_degenerate() {
            return Ok(primary);
        }

        let Some(entry) = self.proxies.get(index) else {
            debug!("No proxy configured for degenerate index value");
            return Ok(primary);
        };

        match self.resolver.resolve(&entry.proxy).await {
            Ok(proxy_quote) => {
                let estimated = estimate(primary, &proxy_quote, entry);
                info!(
                    proxy = %entry.proxy,
                    value = %estimated.current_value,
                    "Estimated index value from proxy"
                );
                Ok(estimated)
            }
            Err(e) => {
                warn!(
                    proxy = %entry.proxy,
                    error = %e,
                    "Proxy lookup failed, keeping degenerate index value"
                );
                Ok(primary)
            }
        }
    }
}

/// Scales the proxy quote into an index estimate. Percentage change is invariant under a
/// constant multiplier and is carried through.
pub fn estimate(primary: Quote, proxy_quote: &Quote, entry: &ProxyEntry) -> Quote {
    Quote {
        current_value: round_price(proxy_quote.current_value * entry.multiplier),
        change: round_price(proxy_quote.change * entry.multiplier),
        change_percent: proxy_quote.change_percent,
        is_estimated: true,
        label: entry.label.clone(),
        observed_at: proxy_quote.observed_at,
        ..primary
    }
}

fn round_price(value: Decimal) -> Decimal {
    value.round_dp(2)
}
