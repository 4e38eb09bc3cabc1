//! Concurrent fan-out of order submissions.
//!
//! The dispatcher spawns one task per order, all before any completion is
//! awaited, then joins the whole batch. Failures are contained at the task
//! boundary: every task returns an [`Outcome`], never an error, so one bad
//! request cannot cancel or abort its siblings.

use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::config::{BatchSpec, OrderPayload};
use crate::http::{HttpClient, OrderRequest};
use crate::outcome::{Outcome, classify};
use crate::report::{self, BatchResult};

/// Unique identifier for one dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(pub Uuid);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display only first 8 characters for readability in logs
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        RequestId(uuid)
    }
}

/// Unique identifier for one batch run, correlating its log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl From<Uuid> for RunId {
    fn from(uuid: Uuid) -> Self {
        RunId(uuid)
    }
}

/// The terminal record of one dispatched order.
///
/// Collected in launch order (the order of `BatchSpec::orders`), regardless
/// of the order in which requests completed.
#[derive(Debug, Clone, Serialize)]
pub struct OrderOutcome {
    pub request_id: RequestId,
    pub customer_id: String,
    pub outcome: Outcome,
}

/// Everything a batch run produces: per-request outcomes plus the aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    /// One entry per order, in launch order.
    pub outcomes: Vec<OrderOutcome>,
    /// Aggregate statistics, computed after every task reached a terminal
    /// outcome.
    pub result: BatchResult,
}

/// Fans a batch specification out into concurrent order submissions.
///
/// The HTTP client is shared read-only across all tasks; each order payload
/// is moved into exactly one task. The specification itself is never
/// mutated, so no locking is needed anywhere in the engine.
pub struct Dispatcher<C: HttpClient> {
    client: C,
    run_id: RunId,
}

impl<C: HttpClient + 'static> Dispatcher<C> {
    /// Create a dispatcher over a shared transport client.
    pub fn new(client: C) -> Self {
        Self {
            client,
            run_id: RunId::from(Uuid::new_v4()),
        }
    }

    /// The identifier correlating this run's log lines.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Dispatch every order in the batch concurrently and wait for all of
    /// them.
    ///
    /// All tasks are spawned before any completion is awaited, so total
    /// wall-clock time approximates the slowest single request. The join is
    /// a barrier: a `DispatchReport` is only produced once every request has
    /// reached a terminal outcome.
    #[tracing::instrument(skip(self, spec), fields(run_id = %self.run_id, orders = spec.orders.len()))]
    pub async fn dispatch(&self, spec: &BatchSpec) -> DispatchReport {
        let url = format!("{}/orders", spec.api_base_url);
        let started_at = Utc::now();
        let started = Instant::now();

        // Launch phase: one task per order, none awaited yet. The identity
        // of each launch is kept on the side so a task that dies without
        // returning can still be attributed to its customer.
        let mut handles = Vec::with_capacity(spec.orders.len());
        let mut launched = Vec::with_capacity(spec.orders.len());
        for order in &spec.orders {
            let request_id = RequestId::from(Uuid::new_v4());
            launched.push((request_id, order.customer_id.clone()));
            handles.push(tokio::spawn(submit_order(
                self.client.clone(),
                request_id,
                order.clone(),
                spec.merchant_id.clone(),
                url.clone(),
            )));
        }

        tracing::debug!(spawned = handles.len(), "All request tasks launched");

        // Join phase: join_all preserves launch order even though requests
        // complete in arbitrary order.
        let joined = join_all(handles).await;
        let duration = started.elapsed();

        let outcomes = joined
            .into_iter()
            .zip(launched)
            .map(|(result, (request_id, customer_id))| match result {
                Ok(outcome) => OrderOutcome {
                    request_id,
                    customer_id,
                    outcome,
                },
                Err(join_error) => {
                    // The task died before classifying its own result, so it
                    // never printed a per-request line either.
                    tracing::error!(
                        request_id = %request_id,
                        customer_id = %customer_id,
                        error = %join_error,
                        "Request task terminated unexpectedly"
                    );
                    let outcome = Outcome::TransportFailed {
                        error: format!("request task terminated unexpectedly: {}", join_error),
                    };
                    println!("{}", report::outcome_lines(&customer_id, &outcome, None));
                    OrderOutcome {
                        request_id,
                        customer_id,
                        outcome,
                    }
                }
            })
            .collect::<Vec<_>>();

        let result =
            BatchResult::from_outcomes(outcomes.iter().map(|o| &o.outcome), started_at, duration);

        tracing::info!(
            total = result.total_attempts,
            successful = result.successful_count,
            duration_ms = duration.as_millis() as u64,
            "Batch complete"
        );

        DispatchReport { outcomes, result }
    }
}

/// Submit one order and classify the result.
///
/// This is the failure boundary for a single request: whatever goes wrong in
/// here - serialization, connection, timeout, a malformed response - becomes
/// part of the returned [`Outcome`]. The per-request console line is emitted
/// from the owning task, interleaved non-deterministically with its
/// siblings.
#[tracing::instrument(skip(client, order, merchant_id, url), fields(request_id = %request_id, customer_id = %order.customer_id))]
async fn submit_order<C: HttpClient>(
    client: C,
    request_id: RequestId,
    mut order: OrderPayload,
    merchant_id: String,
    url: String,
) -> Outcome {
    // The one mutation in the system: stamp the batch's merchant onto the
    // payload, exactly once, immediately before send.
    order.merchant_id = Some(merchant_id);
    let customer_id = order.customer_id.clone();

    let (outcome, submitted) = match serde_json::to_value(&order) {
        Ok(body) => {
            let request = OrderRequest {
                id: request_id,
                customer_id: customer_id.clone(),
                url,
                body,
            };
            let outcome = classify(client.execute(&request).await);
            (outcome, Some(request.body))
        }
        Err(e) => (
            Outcome::TransportFailed {
                error: format!("failed to serialize order payload: {}", e),
            },
            None,
        ),
    };

    match &outcome {
        Outcome::Succeeded(_) => {
            tracing::info!("Order created");
        }
        Outcome::Rejected { status, .. } => {
            tracing::warn!(status = *status, "Order rejected by server");
        }
        Outcome::TransportFailed { error } => {
            tracing::warn!(error = %error, "Order submission failed");
        }
    }

    // One println per task; lines from concurrent tasks interleave, but each
    // line is emitted atomically.
    println!(
        "{}",
        report::outcome_lines(&customer_id, &outcome, submitted.as_ref())
    );

    outcome
}
