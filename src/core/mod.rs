//! Core types shared by the resolver, fetcher and HTTP surface

pub mod config;
pub mod error;
pub mod instrument;
pub mod log;
pub mod proxy;
pub mod quote;

// Re-export main types for cleaner imports
pub use error::{ClientError, FetchError};
pub use instrument::{InstrumentClass, InstrumentRef, Market};
pub use proxy::{ProxyEntry, ProxyMapping};
pub use quote::{Quote, QuoteClient, QuoteSnapshot};
