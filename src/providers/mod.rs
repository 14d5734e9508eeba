pub mod rest;

pub use rest::RestQuoteClient;
