//! Error taxonomy for quote retrieval.

use thiserror::Error;

/// Typed failure for a single instrument (or a whole batch, for `Configuration`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Credentials or API key absent. Fatal to the process, never per-call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Token invalid or expired. Surfaced to the caller, not retried.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The remote returned an application-level error.
    #[error("Upstream error {code}: {message}")]
    Upstream { code: String, message: String },

    /// Anything else, including transport faults and timeouts.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Authentication(_) => "authentication_error",
            Self::Upstream { .. } => "upstream_error",
            Self::Unknown(_) => "unknown_error",
        }
    }

    /// HTTP status used when the error fails a whole request.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Configuration(_) | Self::Unknown(_) => 500,
            Self::Authentication(_) => 401,
            Self::Upstream { .. } => 502,
        }
    }
}

/// Failures raised by concrete quote clients. Anything a client raises that is not one of
/// these is treated as an unknown failure.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upstream rejected request ({code}): {message}")]
    Business { code: String, message: String },
}
