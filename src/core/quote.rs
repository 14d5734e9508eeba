//! Quote types and the upstream client abstraction

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::instrument::InstrumentRef;

/// Raw values reported by the upstream for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSnapshot {
    pub name: Option<String>,
    pub current_value: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub instrument: InstrumentRef,
    pub current_value: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub is_estimated: bool,
    pub label: String,
    pub observed_at: DateTime<Utc>,
}

impl Quote {
    pub fn from_snapshot(instrument: InstrumentRef, snapshot: QuoteSnapshot) -> Self {
        let label = snapshot
            .name
            .unwrap_or_else(|| instrument.symbol.clone());
        Self {
            instrument,
            current_value: snapshot.current_value,
            change: snapshot.change,
            change_percent: snapshot.change_percent,
            is_estimated: false,
            label,
            observed_at: snapshot.observed_at,
        }
    }

    /// Non-positive value, which the index endpoint uses to mean "unsupported".
    pub fn is_degenerate(&self) -> bool {
        self.current_value <= Decimal::ZERO
    }
}

/// One network call per instrument against the upstream quote provider.
#[async_trait]
pub trait QuoteClient: Send + Sync {
    async fn get_quote(&self, instrument: &InstrumentRef) -> Result<QuoteSnapshot>;

    /// Verifies that credentials are present without issuing a request.
    fn check_credentials(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::Market;
    use rust_decimal_macros::dec;

    fn snapshot(value: Decimal, name: Option<&str>) -> QuoteSnapshot {
        QuoteSnapshot {
            name: name.map(str::to_string),
            current_value: value,
            change: dec!(1.5),
            change_percent: dec!(0.25),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_label_falls_back_to_symbol() {
        let spy = InstrumentRef::equity("SPY", Market::Nyse);
        let quote = Quote::from_snapshot(spy.clone(), snapshot(dec!(600), None));
        assert_eq!(quote.label, "SPY");
        assert!(!quote.is_estimated);

        let named = Quote::from_snapshot(spy, snapshot(dec!(600), Some("SPDR S&P 500")));
        assert_eq!(named.label, "SPDR S&P 500");
    }

    #[test]
    fn test_degenerate_values() {
        let ndx = InstrumentRef::index("NDX", Market::Nasdaq);
        assert!(Quote::from_snapshot(ndx.clone(), snapshot(dec!(0), None)).is_degenerate());
        assert!(Quote::from_snapshot(ndx.clone(), snapshot(dec!(-1), None)).is_degenerate());
        assert!(!Quote::from_snapshot(ndx, snapshot(dec!(0.01), None)).is_degenerate());
    }

    #[test]
    fn test_serializes_camel_case() {
        let quote = Quote::from_snapshot(
            InstrumentRef::equity("QQQ", Market::Nasdaq),
            snapshot(dec!(620.00), None),
        );
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["currentValue"], "620.00");
        assert_eq!(json["isEstimated"], false);
        assert_eq!(json["instrument"]["market"], "NASDAQ");
        assert_eq!(json["instrument"]["class"], "equity");
    }
}
