//! HTTP transport abstraction for submitting orders.
//!
//! This module defines the `HttpClient` trait to abstract HTTP request
//! execution, enabling testability with mock implementations. The production
//! implementation wraps a shared `reqwest` client (connection pool) that is
//! used concurrently by all dispatch tasks.

use crate::dispatch::RequestId;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Response from an HTTP exchange that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as a string
    pub body: String,
}

/// An outbound order submission: one stamped payload bound for the intake
/// endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    /// Identifier for this dispatch attempt, for log correlation.
    pub id: RequestId,
    /// The customer placing the order; identifies the request in output.
    pub customer_id: String,
    /// Full URL of the intake endpoint (`{api_base_url}/orders`).
    pub url: String,
    /// The JSON payload, with `merchant_id` already stamped.
    pub body: serde_json::Value,
}

/// Trait for executing order submissions.
///
/// This abstraction allows for different implementations (production vs.
/// testing) and makes the dispatch engine testable without making real
/// HTTP calls.
///
/// # Example
/// ```ignore
/// let client = ReqwestHttpClient::new(Duration::from_secs(30));
/// let response = client.execute(&order_request).await?;
/// println!("Status: {}, Body: {}", response.status, response.body);
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync + Clone {
    /// POST the order payload to the intake endpoint.
    ///
    /// # Errors
    /// Returns an error if the request fails below the application protocol
    /// layer: connection failure, timeout, or an invalid URL. A response
    /// with a non-success status is NOT an error at this level.
    async fn execute(&self, request: &OrderRequest) -> Result<HttpResponse>;
}

// ============================================================================
// Production Implementation using reqwest
// ============================================================================

/// Production HTTP client using reqwest.
///
/// Holds one `reqwest::Client` whose connection pool is shared across all
/// concurrent dispatch tasks. The per-request timeout comes from the shared
/// transport configuration; a timed-out request surfaces as a transport
/// error, not a distinct outcome kind.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestHttpClient {
    /// Create a new reqwest-based HTTP client with the given per-request
    /// timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    #[tracing::instrument(skip(self, request), fields(request_id = %request.id, customer_id = %request.customer_id))]
    async fn execute(&self, request: &OrderRequest) -> Result<HttpResponse> {
        tracing::debug!(
            url = %request.url,
            timeout_ms = self.timeout.as_millis() as u64,
            "Executing HTTP request"
        );

        let response = self
            .client
            .post(&request.url)
            .timeout(self.timeout)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    request_id = %request.id,
                    url = %request.url,
                    error = %e,
                    "HTTP request failed"
                );
                e
            })?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::info!(
            request_id = %request.id,
            status = status,
            response_len = body.len(),
            "HTTP request completed"
        );

        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// Test/Mock Implementation
// ============================================================================

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

/// Mock HTTP client for testing.
///
/// Responses are keyed by the `customer_id` of the submitted order, so a
/// test can script a different fate for each order in a batch without making
/// actual HTTP calls.
///
/// # Example
/// ```ignore
/// let mock = MockHttpClient::new();
/// mock.add_response(
///     "c-1",
///     Ok(HttpResponse {
///         status: 201,
///         body: r#"{"order_id": 42}"#.to_string(),
///     }),
/// );
/// ```
#[derive(Clone)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, Vec<MockResponse>>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    in_flight: Arc<AtomicUsize>,
}

/// A mock response that can optionally wait for a trigger before completing.
enum MockResponse {
    /// Immediate response
    Immediate(Result<HttpResponse>),
    /// Response that waits for a trigger signal before completing
    Triggered {
        response: Result<HttpResponse>,
        trigger: Arc<Mutex<Option<oneshot::Receiver<()>>>>,
    },
}

/// Record of a call made to the mock HTTP client.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub customer_id: String,
    pub url: String,
    pub body: serde_json::Value,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a predetermined response for a specific customer's order.
    ///
    /// Multiple responses can be added for the same customer - they will be
    /// returned in FIFO order.
    pub fn add_response(&self, customer_id: &str, response: Result<HttpResponse>) {
        self.responses
            .lock()
            .entry(customer_id.to_string())
            .or_default()
            .push(MockResponse::Immediate(response));
    }

    /// Add a response that will wait for a manual trigger before completing.
    ///
    /// Returns a sender that when triggered (by sending `()` or dropping)
    /// will cause the request to complete with the given response. Useful
    /// for holding several requests in flight at once to observe true
    /// concurrency.
    pub fn add_response_with_trigger(
        &self,
        customer_id: &str,
        response: Result<HttpResponse>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.responses
            .lock()
            .entry(customer_id.to_string())
            .or_default()
            .push(MockResponse::Triggered {
                response,
                trigger: Arc::new(Mutex::new(Some(rx))),
            });
        tx
    }

    /// Get all calls that have been made to this mock client.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Clear all recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Get the number of requests currently in-flight (executing).
    ///
    /// Requests parked behind a trigger count as in-flight, which lets tests
    /// assert that the dispatcher launches every task before awaiting any.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(&self, request: &OrderRequest) -> Result<HttpResponse> {
        // Increment in-flight counter
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        // Guard to ensure we decrement even if cancelled/panicked
        let _guard = InFlightGuard {
            in_flight: self.in_flight.clone(),
        };

        // Record this call
        self.calls.lock().push(MockCall {
            customer_id: request.customer_id.clone(),
            url: request.url.clone(),
            body: request.body.clone(),
        });

        // Look up the response
        let mock_response = {
            let mut responses = self.responses.lock();
            match responses.get_mut(&request.customer_id) {
                Some(queue) if !queue.is_empty() => Some(queue.remove(0)),
                _ => None,
            }
        };

        match mock_response {
            Some(MockResponse::Immediate(response)) => response,
            Some(MockResponse::Triggered { response, trigger }) => {
                // Wait for the trigger signal before returning the response
                let rx = trigger.lock().take();
                if let Some(rx) = rx {
                    // Wait for trigger (ignore the result - we proceed either way)
                    let _ = rx.await;
                }
                response
            }
            None => Err(crate::error::VolleyError::Other(anyhow::anyhow!(
                "No mock response configured for customer {}",
                request.customer_id
            ))),
        }
    }
}

/// Guard that decrements the in-flight counter when dropped.
/// This ensures the counter is decremented even if the task is cancelled or
/// panics.
struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn order_request(customer_id: &str) -> OrderRequest {
        OrderRequest {
            id: RequestId::from(Uuid::new_v4()),
            customer_id: customer_id.to_string(),
            url: "http://localhost:8080/api/orders".to_string(),
            body: serde_json::json!({"customer_id": customer_id, "merchant_id": "m-1"}),
        }
    }

    #[tokio::test]
    async fn test_mock_client_basic() {
        let mock = MockHttpClient::new();
        mock.add_response(
            "c-1",
            Ok(HttpResponse {
                status: 201,
                body: r#"{"order_id": 1}"#.to_string(),
            }),
        );

        let response = mock.execute(&order_request("c-1")).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, r#"{"order_id": 1}"#);

        // Verify call was recorded
        let calls = mock.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].customer_id, "c-1");
        assert_eq!(calls[0].url, "http://localhost:8080/api/orders");
        assert_eq!(calls[0].body["merchant_id"], "m-1");
    }

    #[tokio::test]
    async fn test_mock_client_fifo_responses() {
        let mock = MockHttpClient::new();
        mock.add_response(
            "c-1",
            Ok(HttpResponse {
                status: 201,
                body: "first".to_string(),
            }),
        );
        mock.add_response(
            "c-1",
            Ok(HttpResponse {
                status: 500,
                body: "second".to_string(),
            }),
        );

        let response1 = mock.execute(&order_request("c-1")).await.unwrap();
        assert_eq!(response1.body, "first");

        let response2 = mock.execute(&order_request("c-1")).await.unwrap();
        assert_eq!(response2.status, 500);

        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_client_no_response() {
        let mock = MockHttpClient::new();
        let result = mock.execute(&order_request("c-unknown")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_client_with_trigger() {
        let mock = MockHttpClient::new();

        let trigger = mock.add_response_with_trigger(
            "c-1",
            Ok(HttpResponse {
                status: 201,
                body: "triggered".to_string(),
            }),
        );

        // Spawn the request execution (it will block waiting for trigger)
        let mock_clone = mock.clone();
        let handle = tokio::spawn(async move { mock_clone.execute(&order_request("c-1")).await });

        // Give it a moment to start executing
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        // Verify it hasn't completed yet and counts as in-flight
        assert!(!handle.is_finished());
        assert_eq!(mock.in_flight_count(), 1);

        // Now trigger the response
        trigger.send(()).unwrap();

        // Wait for completion
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, "triggered");
        assert_eq!(mock.in_flight_count(), 0);
    }
}
