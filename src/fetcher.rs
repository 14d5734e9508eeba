//! Chunked, rate-limited fan-out over the resolver.
//!
//! Instruments are processed in consecutive chunks. Calls inside a chunk run concurrently and
//! the chunk is joined before the cooldown, so chunk `k + 1` never starts while a call from
//! chunk `k` is in flight. Per-instrument failures are recorded, never propagated.

use crate::core::{FetchError, InstrumentRef, ProxyMapping, Quote};
use crate::estimator::IndexFallbackEstimator;
use crate::resolver::PriceResolver;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
pub struct BatchRequest {
    instruments: Vec<InstrumentRef>,
    chunk_size: usize,
    inter_chunk_delay: Duration,
    deadline: Option<Duration>,
}

impl BatchRequest {
    pub fn new(
        instruments: Vec<InstrumentRef>,
        chunk_size: usize,
        inter_chunk_delay: Duration,
    ) -> Result<Self, FetchError> {
        if chunk_size == 0 {
            return Err(FetchError::Configuration(
                "Chunk size must be greater than zero".to_string(),
            ));
        }
        Ok(BatchRequest {
            instruments,
            chunk_size,
            inter_chunk_delay,
            deadline: None,
        })
    }

    /// Chunks not started within `deadline` of the batch start are reported as failed.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn instruments(&self) -> &[InstrumentRef] {
        &self.instruments
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        self.instruments.len().div_ceil(self.chunk_size)
    }

    /// Number of cooldowns a full run issues: one between each pair of chunks.
    pub fn delay_count(&self) -> usize {
        self.chunk_count().saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Quote),
    Failure(InstrumentRef, FetchError),
}

impl Outcome {
    pub fn instrument(&self) -> &InstrumentRef {
        match self {
            Outcome::Success(quote) => &quote.instrument,
            Outcome::Failure(instrument, _) => instrument,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

pub struct RateLimitedBatchFetcher {
    resolver: Arc<PriceResolver>,
    estimator: IndexFallbackEstimator,
}

impl RateLimitedBatchFetcher {
    pub fn new(resolver: Arc<PriceResolver>, proxies: Arc<ProxyMapping>) -> Self {
        let estimator = IndexFallbackEstimator::new(Arc::clone(&resolver), proxies);
        RateLimitedBatchFetcher {
            resolver,
            estimator,
        }
    }

    /// One outcome per requested instrument, in request order.
    pub async fn fetch_all(&self, request: &BatchRequest) -> Vec<Outcome> {
        let started = Instant::now();
        let chunks: Vec<&[InstrumentRef]> =
            request.instruments.chunks(request.chunk_size).collect();
        let mut outcomes = Vec::with_capacity(request.instruments.len());

        for (i, chunk) in chunks.iter().enumerate() {
            if let Some(deadline) = request.deadline
                && started.elapsed() >= deadline
            {
                outcomes.extend(expire(&chunks[i..]));
                break;
            }

            outcomes.extend(self.fetch_chunk(i, chunk).await);

            if i + 1 < chunks.len() && !request.inter_chunk_delay.is_zero() {
                // The next chunk could not start before the deadline anyway.
                if let Some(deadline) = request.deadline
                    && started.elapsed() + request.inter_chunk_delay >= deadline
                {
                    outcomes.extend(expire(&chunks[i + 1..]));
                    break;
                }
                debug!(
                    delay_ms = request.inter_chunk_delay.as_millis() as u64,
                    "Cooling down before next chunk"
                );
                tokio::time::sleep(request.inter_chunk_delay).await;
            }
        }

        outcomes
    }

    #[instrument(name = "FetchChunk", skip(self, chunk), fields(size = chunk.len()))]
    async fn fetch_chunk(&self, chunk_index: usize, chunk: &[InstrumentRef]) -> Vec<Outcome> {
        let outcomes = join_all(chunk.iter().map(|instrument| self.fetch_one(instrument))).await;
        debug!(
            succeeded = outcomes.iter().filter(|o| o.is_success()).count(),
            "Chunk settled"
        );
        outcomes
    }

    async fn fetch_one(&self, instrument: &InstrumentRef) -> Outcome {
        let result = if instrument.is_index() {
            self.estimator.resolve_index(instrument).await
        } else {
            self.resolver.resolve(instrument).await
        };

        match result {
            Ok(quote) => Outcome::Success(quote),
            Err(e) => {
                warn!(symbol = %instrument, kind = e.kind(), error = %e, "Quote fetch failed");
                Outcome::Failure(instrument.clone(), e)
            }
        }
    }
}

fn expire(chunks: &[&[InstrumentRef]]) -> Vec<Outcome> {
    let skipped: Vec<&InstrumentRef> = chunks.iter().flat_map(|c| c.iter()).collect();
    warn!(
        remaining = skipped.len(),
        "Batch deadline exceeded, skipping remaining chunks"
    );
    skipped
        .into_iter()
        .map(|instrument| {
            Outcome::Failure(
                instrument.clone(),
                FetchError::Unknown("Batch deadline exceeded".to_string()),
            )
        })
        .collect()
}
