//! Scripted quote client for unit tests.

use crate::core::{ClientError, InstrumentRef, QuoteClient, QuoteSnapshot};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Quote {
        value: Decimal,
        change: Decimal,
        change_percent: Decimal,
    },
    Unauthorized,
    Business,
    Transport,
    Hang,
}

impl Reply {
    pub fn quote(value: Decimal, change: Decimal, change_percent: Decimal) -> Self {
        Reply::Quote {
            value,
            change,
            change_percent,
        }
    }

    pub fn price(value: Decimal) -> Self {
        Reply::quote(value, Decimal::ONE, Decimal::ONE)
    }
}

/// Replies per symbol; symbols without a script fail like a transport error.
#[derive(Default)]
pub struct ScriptedClient {
    replies: HashMap<String, Reply>,
    latency: Duration,
    missing_credentials: bool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, symbol: &str, reply: Reply) -> Self {
        self.replies.insert(symbol.to_string(), reply);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.missing_credentials = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn observed_at() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 15, 30, 0).unwrap()
    }
}

#[async_trait]
impl QuoteClient for ScriptedClient {
    async fn get_quote(&self, instrument: &InstrumentRef) -> Result<QuoteSnapshot> {
        self.calls.lock().unwrap().push(instrument.symbol.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.replies.get(&instrument.symbol) {
            Some(Reply::Quote {
                value,
                change,
                change_percent,
            }) => Ok(QuoteSnapshot {
                name: None,
                current_value: *value,
                change: *change,
                change_percent: *change_percent,
                observed_at: Self::observed_at(),
            }),
            Some(Reply::Unauthorized) => {
                Err(ClientError::Unauthorized("token expired".into()).into())
            }
            Some(Reply::Business) => Err(ClientError::Business {
                code: "E404".into(),
                message: format!("unknown symbol {}", instrument.symbol),
            }
            .into()),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Transport) | None => Err(anyhow!("connection reset for {instrument}")),
        }
    }

    fn check_credentials(&self) -> Result<()> {
        if self.missing_credentials {
            return Err(ClientError::MissingCredentials("api key not set".into()).into());
        }
        Ok(())
    }
}
