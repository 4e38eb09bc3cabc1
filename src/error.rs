//! Error types for the load harness.

use thiserror::Error;

/// Result type alias using the volley error type.
pub type Result<T> = std::result::Result<T, VolleyError>;

/// Main error type for the load harness.
///
/// Only `Configuration` is fatal to the process: it is raised before any
/// request is dispatched. Everything that can go wrong during dispatch is
/// contained inside the owning request task and converted to an
/// [`Outcome`](crate::outcome::Outcome) instead of propagating.
#[derive(Error, Debug)]
pub enum VolleyError {
    /// Batch specification missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP client error
    #[error("HTTP request failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
