use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::config::ProviderConfig;
use crate::core::{ClientError, InstrumentClass, InstrumentRef, QuoteClient, QuoteSnapshot};

/// Quote provider speaking the broker REST API: one endpoint for instruments, one for indices.
pub struct RestQuoteClient {
    base_url: String,
    api_key: Option<String>,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl RestQuoteClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        access_token: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("quotebatch/0.1")
            .build()?;
        Ok(RestQuoteClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            access_token,
            client,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.api_key.clone(),
            config.access_token.clone(),
        )
    }

    fn credentials(&self) -> Result<(&str, &str), ClientError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ClientError::MissingCredentials("API key is not configured".into()))?;
        let token = self
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ClientError::MissingCredentials("Access token is not configured".into())
            })?;
        Ok((api_key, token))
    }

    fn endpoint(&self, instrument: &InstrumentRef) -> String {
        let resource = match instrument.class {
            InstrumentClass::Equity => "quotes",
            InstrumentClass::Index => "indices",
        };
        format!(
            "{}/v1/{}/{}/{}",
            self.base_url, resource, instrument.market, instrument.symbol
        )
    }
}

#[derive(Deserialize, Debug)]
struct QuoteEnvelope {
    status: String,
    code: Option<String>,
    message: Option<String>,
    quote: Option<QuotePayload>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct QuotePayload {
    name: Option<String>,
    last: Decimal,
    change: Decimal,
    change_percent: Decimal,
    time: Option<DateTime<Utc>>,
}

impl QuoteEnvelope {
    fn business_error(&self) -> Option<ClientError> {
        (self.status != "ok").then(|| ClientError::Business {
            code: self.code.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
            message: self
                .message
                .clone()
                .unwrap_or_else(|| "no message".to_string()),
        })
    }
}

#[async_trait]
impl QuoteClient for RestQuoteClient {
    #[instrument(name = "RestQuoteFetch", skip(self), fields(symbol = %instrument))]
    async fn get_quote(&self, instrument: &InstrumentRef) -> Result<QuoteSnapshot> {
        let (api_key, token) = self.credentials()?;

        let url = self.endpoint(instrument);
        debug!("Requesting quote from {}", url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for {} URL: {}", e, instrument, url))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = format!("HTTP {status} for {instrument}");
            return Err(ClientError::Unauthorized(message).into());
        }

        let text = response.text().await?;
        let envelope = serde_json::from_str::<QuoteEnvelope>(&text);

        if !status.is_success() {
            // Business errors are sometimes reported with a 4xx/5xx status.
            if let Ok(envelope) = &envelope
                && let Some(err) = envelope.business_error()
            {
                return Err(err.into());
            }
            return Err(anyhow!("HTTP error: {} for {}", status, instrument));
        }

        let envelope = envelope
            .map_err(|e| anyhow!("Failed to parse quote response for {}: {}", instrument, e))?;
        if let Some(err) = envelope.business_error() {
            return Err(err.into());
        }

        let payload = envelope
            .quote
            .ok_or_else(|| anyhow!("No quote data found for {}", instrument))?;

        Ok(QuoteSnapshot {
            name: payload.name,
            current_value: payload.last,
            change: payload.change,
            change_percent: payload.change_percent,
            observed_at: payload.time.unwrap_or_else(Utc::now),
        })
    }

    fn check_credentials(&self) -> Result<()> {
        self.credentials()?;
        Ok(())
    }
}
