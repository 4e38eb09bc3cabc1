//! Aggregation and console rendering of batch results.
//!
//! The aggregator is a full-batch join point: it only runs after every
//! dispatched task has reached a terminal [`Outcome`]. Per-request lines are
//! rendered here but emitted by the owning task, so they interleave across
//! concurrent requests; the summary block is emitted once at the end.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::outcome::Outcome;

/// Aggregate statistics for one batch run.
///
/// Derived, read-only, computed once after all outcomes are known.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// Number of requests dispatched; equals the number of orders exactly.
    pub total_attempts: usize,
    /// Number of outcomes tagged `Succeeded`.
    pub successful_count: usize,
    /// Wall-clock time bracketing dispatch: approximately the slowest single
    /// request, not the sum of all requests.
    pub duration: Duration,
    /// When dispatch began.
    pub started_at: DateTime<Utc>,
}

impl BatchResult {
    /// Compute the aggregate from the collected outcomes.
    pub fn from_outcomes<'a>(
        outcomes: impl IntoIterator<Item = &'a Outcome>,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        let mut total_attempts = 0;
        let mut successful_count = 0;
        for outcome in outcomes {
            total_attempts += 1;
            if outcome.is_success() {
                successful_count += 1;
            }
        }
        Self {
            total_attempts,
            successful_count,
            duration,
            started_at,
        }
    }

    /// Success rate as a percentage.
    ///
    /// `None` for a degenerate batch of zero attempts - the rate is
    /// undefined there and is rendered as "N/A", never as a division by
    /// zero or NaN.
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_attempts == 0 {
            None
        } else {
            Some(self.successful_count as f64 / self.total_attempts as f64 * 100.0)
        }
    }

    /// Render the summary block printed after all outcomes are aggregated.
    pub fn summary(&self) -> String {
        let rate = match self.success_rate() {
            Some(rate) => format!("{:.2}%", rate),
            None => "N/A".to_string(),
        };
        format!(
            "\n=== Test Results ===\n\
             Duration: {:.2} seconds\n\
             Successful orders: {}/{}\n\
             Success rate: {}",
            self.duration.as_secs_f64(),
            self.successful_count,
            self.total_attempts,
            rate
        )
    }
}

/// Render the per-request console lines for one outcome.
///
/// For a successful submission the stamped payload is echoed back, matching
/// what the intake API received.
pub fn outcome_lines(
    customer_id: &str,
    outcome: &Outcome,
    submitted: Option<&serde_json::Value>,
) -> String {
    match outcome {
        Outcome::Succeeded(_) => {
            let mut lines = format!("Customer {} created order successfully", customer_id);
            if let Some(payload) = submitted {
                let details = serde_json::to_string_pretty(payload)
                    .unwrap_or_else(|_| payload.to_string());
                lines.push_str(&format!("\nOrder details: {}", details));
            }
            lines
        }
        Outcome::Rejected { status, body } => format!(
            "Failed to create order for customer {}. Status: {}, Error: {}",
            customer_id, status, body
        ),
        Outcome::TransportFailed { error } => {
            format!("Error creating order for customer {}: {}", customer_id, error)
        }
    }
}

// TODO: track per-request latency in OrderOutcome so the summary can report
// slowest/median request times alongside the success rate.

#[cfg(test)]
mod tests {
    use super::*;

    fn succeeded() -> Outcome {
        Outcome::Succeeded(serde_json::json!({"order_id": 1}))
    }

    fn rejected() -> Outcome {
        Outcome::Rejected {
            status: 400,
            body: "bad order".to_string(),
        }
    }

    #[test]
    fn test_counts_only_succeeded_outcomes() {
        let outcomes = vec![
            succeeded(),
            rejected(),
            Outcome::TransportFailed {
                error: "timeout".to_string(),
            },
            succeeded(),
        ];

        let result =
            BatchResult::from_outcomes(outcomes.iter(), Utc::now(), Duration::from_secs(1));

        assert_eq!(result.total_attempts, 4);
        assert_eq!(result.successful_count, 2);
        assert!(result.successful_count <= result.total_attempts);
    }

    #[test]
    fn test_success_rate_two_decimal_rendering() {
        let outcomes = vec![succeeded(), succeeded(), rejected()];
        let result =
            BatchResult::from_outcomes(outcomes.iter(), Utc::now(), Duration::from_millis(1234));

        let rate = result.success_rate().unwrap();
        assert!((rate - 66.666).abs() < 0.01);

        let summary = result.summary();
        assert!(summary.contains("Successful orders: 2/3"));
        assert!(summary.contains("Success rate: 66.67%"));
        assert!(summary.contains("Duration: 1.23 seconds"));
    }

    #[test]
    fn test_degenerate_batch_reports_na() {
        let outcomes: Vec<Outcome> = Vec::new();
        let result = BatchResult::from_outcomes(outcomes.iter(), Utc::now(), Duration::ZERO);

        assert_eq!(result.total_attempts, 0);
        assert_eq!(result.successful_count, 0);
        assert!(result.success_rate().is_none());

        let summary = result.summary();
        assert!(summary.contains("Successful orders: 0/0"));
        assert!(summary.contains("Success rate: N/A"));
    }

    #[test]
    fn test_all_failures_is_zero_percent() {
        let outcomes = vec![rejected(), rejected()];
        let result =
            BatchResult::from_outcomes(outcomes.iter(), Utc::now(), Duration::from_secs(2));
        assert_eq!(result.success_rate(), Some(0.0));
        assert!(result.summary().contains("Success rate: 0.00%"));
    }

    #[test]
    fn test_outcome_lines_for_each_variant() {
        let payload = serde_json::json!({"customer_id": "c-1", "merchant_id": "m-1"});
        let success = outcome_lines("c-1", &succeeded(), Some(&payload));
        assert!(success.contains("Customer c-1 created order successfully"));
        assert!(success.contains("Order details:"));
        assert!(success.contains("\"merchant_id\": \"m-1\""));

        let rejection = outcome_lines("c-2", &rejected(), None);
        assert!(rejection.contains("Failed to create order for customer c-2"));
        assert!(rejection.contains("Status: 400"));
        assert!(rejection.contains("bad order"));

        let failure = outcome_lines(
            "c-3",
            &Outcome::TransportFailed {
                error: "connection refused".to_string(),
            },
            None,
        );
        assert!(failure.contains("Error creating order for customer c-3"));
        assert!(failure.contains("connection refused"));
    }
}
