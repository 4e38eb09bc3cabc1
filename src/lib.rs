//! Concurrent load-generation harness for an order-intake API.
//!
//! Given a batch of order records and a target endpoint, volley dispatches
//! one HTTP POST per record concurrently over a shared transport session,
//! collects per-request outcomes, and reports aggregate success statistics.
//! It is a one-shot, fire-and-report tool: no retries, no rate limiting, no
//! persistence.
//!
//! The flow is: [`config::BatchSpec`] -> [`dispatch::Dispatcher`] (spawns N
//! concurrent calls) -> [`outcome::classify`] per call ->
//! [`report::BatchResult`] (joins all N outcomes) -> console report.
//!
//! Failures are contained per request: a connection error, timeout, or
//! malformed response in one call becomes a [`outcome::Outcome`] for that
//! call alone and never aborts the batch. Only a missing or malformed batch
//! specification is fatal.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod outcome;
pub mod report;

// Re-export commonly used types
pub use config::{BatchSpec, OrderPayload};
pub use dispatch::{DispatchReport, Dispatcher, OrderOutcome, RequestId, RunId};
pub use error::{Result, VolleyError};
pub use http::{HttpClient, HttpResponse, MockHttpClient, OrderRequest, ReqwestHttpClient};
pub use outcome::{Outcome, classify};
pub use report::BatchResult;
