//! Index to proxy-instrument table used when the upstream cannot price an index.

use rust_decimal::Decimal;
use std::collections::HashMap;

use super::instrument::InstrumentRef;

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyEntry {
    pub proxy: InstrumentRef,
    pub multiplier: Decimal,
    pub label: String,
}

/// Read-only after construction; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ProxyMapping {
    entries: HashMap<InstrumentRef, ProxyEntry>,
}

impl ProxyMapping {
    /// Keys are reclassified as indices, so callers may pass bare symbol/market pairs.
    pub fn new(entries: impl IntoIterator<Item = (InstrumentRef, ProxyEntry)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(index, entry)| (index.into_index(), entry))
                .collect(),
        }
    }

    pub fn get(&self, index: &InstrumentRef) -> Option<&ProxyEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
