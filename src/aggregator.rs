use crate::core::{InstrumentRef, Quote};
use crate::fetcher::Outcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub succeeded: Vec<Quote>,
    pub failed: Vec<InstrumentRef>,
    pub observed_at: DateTime<Utc>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partitions outcomes into succeeded and failed lists, stamped with the current time.
pub fn aggregate(outcomes: &[Outcome], instruments: &[InstrumentRef]) -> BatchResult {
    aggregate_at(outcomes, instruments, Utc::now())
}

/// Both lists follow `instruments` order. Every requested instrument lands in exactly one
/// list; one without an outcome counts as failed and outcomes for unrequested instruments
/// are ignored.
pub fn aggregate_at(
    outcomes: &[Outcome],
    instruments: &[InstrumentRef],
    observed_at: DateTime<Utc>,
) -> BatchResult {
    // Queues keep duplicate requests for the same instrument paired with their own outcomes.
    let mut by_instrument: HashMap<&InstrumentRef, VecDeque<&Outcome>> = HashMap::new();
    for outcome in outcomes {
        by_instrument
            .entry(outcome.instrument())
            .or_default()
            .push_back(outcome);
    }

    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for instrument in instruments {
        match by_instrument
            .get_mut(instrument)
            .and_then(VecDeque::pop_front)
        {
            Some(Outcome::Success(quote)) => succeeded.push(quote.clone()),
            Some(Outcome::Failure(..)) | None => failed.push(instrument.clone()),
        }
    }

    BatchResult {
        succeeded,
        failed,
        observed_at,
    }
}
