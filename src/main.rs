//! Command-line entry point for the volley load harness.
//!
//! Loads a batch specification from a JSON file, fires all orders
//! concurrently at `{api_base_url}/orders`, and prints per-request lines
//! followed by a summary block. A specification that cannot be obtained or
//! parsed terminates the process with a non-zero status before any request
//! is dispatched.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use volley::config::BatchSpec;
use volley::dispatch::Dispatcher;
use volley::http::ReqwestHttpClient;

#[derive(Parser, Debug)]
#[command(name = "volley", version, about = "Concurrent order-submission load harness")]
struct Args {
    /// Path to the batch specification file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // The only fatal precondition: no spec, no run.
    let spec = match BatchSpec::from_path(&args.config) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        api_base_url = %spec.api_base_url,
        merchant_id = %spec.merchant_id,
        orders = spec.orders.len(),
        "Loaded batch specification"
    );

    let client = ReqwestHttpClient::new(Duration::from_millis(args.timeout_ms));
    let dispatcher = Dispatcher::new(client);
    let report = dispatcher.dispatch(&spec).await;

    println!("{}", report.result.summary());
}
