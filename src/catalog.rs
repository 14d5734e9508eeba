//! Named instrument groups served by the batch endpoint, plus the fixed index set.

use crate::core::InstrumentRef;
use crate::core::config::{AppConfig, CategoryConfig};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct InstrumentCatalog {
    categories: Vec<CategoryConfig>,
    indices: Vec<InstrumentRef>,
}

impl InstrumentCatalog {
    pub fn new(categories: Vec<CategoryConfig>, indices: Vec<InstrumentRef>) -> Self {
        InstrumentCatalog {
            categories,
            indices: indices.into_iter().map(InstrumentRef::into_index).collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.categories.clone(), config.indices.clone())
    }

    /// Instruments for `category`, or every category in order when `None`. Unknown names
    /// select nothing.
    pub fn select(&self, category: Option<&str>) -> Vec<InstrumentRef> {
        match category {
            Some(name) => self
                .categories
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
                .map(|c| c.instruments.clone())
                .unwrap_or_default(),
            None => {
                let mut seen = HashSet::new();
                self.categories
                    .iter()
                    .flat_map(|c| c.instruments.iter())
                    .filter(|instrument| seen.insert(*instrument))
                    .cloned()
                    .collect()
            }
        }
    }

    pub fn indices(&self) -> &[InstrumentRef] {
        &self.indices
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }
}
