use crate::core::{ClientError, FetchError, InstrumentRef, Quote, QuoteClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Resolves a single instrument through the upstream client, one call, no retry.
pub struct PriceResolver {
    client: Arc<dyn QuoteClient>,
    call_timeout: Duration,
}

impl PriceResolver {
    pub fn new(client: Arc<dyn QuoteClient>, call_timeout: Duration) -> Self {
        PriceResolver {
            client,
            call_timeout,
        }
    }

    #[instrument(name = "ResolveQuote", skip(self), fields(symbol = %instrument))]
    pub async fn resolve(&self, instrument: &InstrumentRef) -> Result<Quote, FetchError> {
        match tokio::time::timeout(self.call_timeout, self.client.get_quote(instrument)).await {
            Ok(Ok(snapshot)) => {
                debug!(value = %snapshot.current_value, "Resolved quote");
                Ok(Quote::from_snapshot(instrument.clone(), snapshot))
            }
            Ok(Err(e)) => Err(classify(e)),
            Err(_) => Err(FetchError::Unknown(format!(
                "Request for {} timed out after {}ms",
                instrument,
                self.call_timeout.as_millis()
            ))),
        }
    }

    /// Batch-wide credential check, run before any call is issued.
    pub fn check_credentials(&self) -> Result<(), FetchError> {
        self.client.check_credentials().map_err(classify)
    }
}

/// Maps a client failure onto the error taxonomy. Only [`ClientError`]s anywhere in the
/// chain carry meaning; everything else is unknown.
pub fn classify(err: anyhow::Error) -> FetchError {
    let client_error = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ClientError>());
    match client_error {
        Some(ClientError::MissingCredentials(msg)) => FetchError::Configuration(msg.clone()),
        Some(ClientError::Unauthorized(msg)) => FetchError::Authentication(msg.clone()),
        Some(ClientError::Business { code, message }) => FetchError::Upstream {
            code: code.clone(),
            message: message.clone(),
        },
        None => FetchError::Unknown(format!("{err:#}")),
    }
}
