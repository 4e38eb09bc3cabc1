//! Batch specification loading and validation.
//!
//! The harness consumes a JSON file describing the target endpoint, the
//! merchant on whose behalf orders are submitted, and the order payloads to
//! fire. The specification is immutable after construction and shared
//! read-only across all dispatch tasks.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VolleyError};

/// The parsed batch specification driving one harness run.
///
/// A failure to obtain or parse this is the only fatal error in the system:
/// the process reports it and exits before any request is dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSpec {
    /// Base URL of the order-intake API (e.g., <http://localhost:8080/api>).
    /// Requests are POSTed to `{api_base_url}/orders`.
    pub api_base_url: String,

    /// Merchant identifier stamped into every order payload before send.
    pub merchant_id: String,

    /// Order payloads, one concurrent request each. May be empty, which
    /// yields a degenerate 0/0 report.
    pub orders: Vec<OrderPayload>,
}

/// A single order to be submitted.
///
/// Beyond `customer_id`, order fields are opaque to the harness and are
/// forwarded verbatim to the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    /// Identifies the customer placing the order; used in per-request output.
    pub customer_id: String,

    /// Set exactly once by the dispatcher from [`BatchSpec::merchant_id`]
    /// immediately before send. Absent in the input file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,

    /// Remaining order fields (items, notes, ...), forwarded as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BatchSpec {
    /// Load and validate a batch specification from a JSON file.
    ///
    /// # Errors
    /// Returns [`VolleyError::Configuration`] if the file cannot be read,
    /// is not valid JSON, or fails validation.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            VolleyError::Configuration(format!(
                "failed to read batch specification {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate a batch specification from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self> {
        let spec: BatchSpec = serde_json::from_str(raw).map_err(|e| {
            VolleyError::Configuration(format!("invalid batch specification: {}", e))
        })?;
        spec.validate()
    }

    /// Check invariants and normalize the base URL.
    ///
    /// A trailing slash on `api_base_url` is trimmed so that URL joining in
    /// the dispatcher never produces `//orders`.
    fn validate(mut self) -> Result<Self> {
        if self.api_base_url.trim().is_empty() {
            return Err(VolleyError::Configuration(
                "api_base_url must not be empty".to_string(),
            ));
        }
        if self.merchant_id.trim().is_empty() {
            return Err(VolleyError::Configuration(
                "merchant_id must not be empty".to_string(),
            ));
        }
        for (i, order) in self.orders.iter().enumerate() {
            if order.customer_id.trim().is_empty() {
                return Err(VolleyError::Configuration(format!(
                    "orders[{}] is missing a customer_id",
                    i
                )));
            }
        }
        while self.api_base_url.ends_with('/') {
            self.api_base_url.pop();
        }
        Ok(self)
    }
}
