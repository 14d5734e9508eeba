//! Instrument identity types

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Nyse,
    Nasdaq,
    Amex,
    Krx,
}

impl Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Market::Nyse => "NYSE",
                Market::Nasdaq => "NASDAQ",
                Market::Amex => "AMEX",
                Market::Krx => "KRX",
            }
        )
    }
}

impl FromStr for Market {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NYSE" => Ok(Market::Nyse),
            "NASDAQ" => Ok(Market::Nasdaq),
            "AMEX" => Ok(Market::Amex),
            "KRX" => Ok(Market::Krx),
            _ => Err(anyhow::anyhow!("Invalid market: {}", s)),
        }
    }
}

/// Whether the upstream serves the instrument from the per-instrument or the per-index endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentClass {
    #[default]
    Equity,
    Index,
}

/// Identity key for every lookup in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentRef {
    pub symbol: String,
    pub market: Market,
    #[serde(default)]
    pub class: InstrumentClass,
}

impl InstrumentRef {
    pub fn equity(symbol: &str, market: Market) -> Self {
        Self {
            symbol: symbol.to_string(),
            market,
            class: InstrumentClass::Equity,
        }
    }

    pub fn index(symbol: &str, market: Market) -> Self {
        Self {
            symbol: symbol.to_string(),
            market,
            class: InstrumentClass::Index,
        }
    }

    pub fn is_index(&self) -> bool {
        self.class == InstrumentClass::Index
    }

    /// Same symbol and market, reclassified as an index.
    pub fn into_index(self) -> Self {
        Self {
            class: InstrumentClass::Index,
            ..self
        }
    }
}

impl Display for InstrumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.market, self.symbol)
    }
}
