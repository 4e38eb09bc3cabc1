//! Terminal classification of a single dispatched request.
//!
//! Every request ends in exactly one [`Outcome`], produced by [`classify`].
//! Classification is a pure function of the completed exchange: it performs
//! no I/O and never panics, so a bad response can never unwind the batch.

use serde::Serialize;

use crate::error::Result;
use crate::http::HttpResponse;

/// Expected success status from the order-intake API.
const STATUS_CREATED: u16 = 201;

/// The terminal state of one dispatched request.
///
/// Created once per request, immutable thereafter, consumed only by the
/// aggregator. Server rejections and transport failures are both "not
/// successful" in aggregate statistics; the distinction exists for the
/// per-request output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "details")]
pub enum Outcome {
    /// The server accepted the order (HTTP 201) and returned a JSON body.
    Succeeded(serde_json::Value),

    /// An HTTP response arrived with a non-201 status.
    Rejected {
        status: u16,
        /// Response body read best-effort as text; empty if unreadable.
        body: String,
    },

    /// No HTTP exchange completed: connection, timeout, or DNS failure,
    /// a request that could not be built, or a 201 whose body was not
    /// valid JSON.
    TransportFailed { error: String },
}

impl Outcome {
    /// True only for `Succeeded`; this is what the aggregator counts.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }

    /// A human-readable description of a non-success outcome.
    pub fn to_error_message(&self) -> Option<String> {
        match self {
            Outcome::Succeeded(_) => None,
            Outcome::Rejected { status, body } => {
                Some(format!("server rejected the order: {} - {}", status, body))
            }
            Outcome::TransportFailed { error } => Some(format!("transport failure: {}", error)),
        }
    }
}

/// Classify a completed HTTP exchange (or a caught transport error) into an
/// [`Outcome`].
///
/// A 201 response whose body fails to parse as JSON is classified as
/// `TransportFailed` rather than crashing the owning task: a malformed
/// success response is a transport-layer defect from the harness's point of
/// view.
pub fn classify(exchange: Result<HttpResponse>) -> Outcome {
    match exchange {
        Ok(response) if response.status == STATUS_CREATED => {
            match serde_json::from_str::<serde_json::Value>(&response.body) {
                Ok(parsed) => Outcome::Succeeded(parsed),
                Err(e) => Outcome::TransportFailed {
                    error: format!("malformed success response body: {}", e),
                },
            }
        }
        Ok(response) => Outcome::Rejected {
            status: response.status,
            body: response.body,
        },
        Err(e) => Outcome::TransportFailed {
            error: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VolleyError;

    #[test]
    fn test_created_with_json_body_succeeds() {
        let outcome = classify(Ok(HttpResponse {
            status: 201,
            body: r#"{"order_id": 42}"#.to_string(),
        }));

        assert!(outcome.is_success());
        assert_eq!(
            outcome,
            Outcome::Succeeded(serde_json::json!({"order_id": 42}))
        );
    }

    #[test]
    fn test_created_with_malformed_body_is_transport_failure() {
        let outcome = classify(Ok(HttpResponse {
            status: 201,
            body: "<html>oops</html>".to_string(),
        }));

        assert!(!outcome.is_success());
        assert!(matches!(outcome, Outcome::TransportFailed { .. }));
    }

    #[test]
    fn test_non_created_status_is_rejection() {
        let outcome = classify(Ok(HttpResponse {
            status: 400,
            body: "merchant closed".to_string(),
        }));

        assert_eq!(
            outcome,
            Outcome::Rejected {
                status: 400,
                body: "merchant closed".to_string(),
            }
        );
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_success_status_other_than_201_is_rejection() {
        // The intake API contract is 201 Created; a plain 200 is not a success.
        let outcome = classify(Ok(HttpResponse {
            status: 200,
            body: "{}".to_string(),
        }));
        assert!(matches!(outcome, Outcome::Rejected { status: 200, .. }));
    }

    #[test]
    fn test_transport_error_is_transport_failure() {
        let outcome = classify(Err(VolleyError::Other(anyhow::anyhow!(
            "connection refused"
        ))));

        match outcome {
            Outcome::TransportFailed { error } => {
                assert!(error.contains("connection refused"));
            }
            other => panic!("expected TransportFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_error_messages_identify_the_cause() {
        let rejected = Outcome::Rejected {
            status: 503,
            body: "busy".to_string(),
        };
        assert!(rejected.to_error_message().unwrap().contains("503"));

        let succeeded = Outcome::Succeeded(serde_json::json!({}));
        assert!(succeeded.to_error_message().is_none());
    }
}
