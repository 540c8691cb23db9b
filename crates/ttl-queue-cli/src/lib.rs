//! # TTL Queue Load Generator
//!
//! Floods a running TTL queue service with `POST /push/{ttl}` requests.
//!
//! Requests run concurrently, bounded by `--max-conn` in-flight requests.
//! Every request that receives an HTTP response counts as a success, whatever
//! its status code; transport failures count as errors.

use bytes::Bytes;
use clap::Parser;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::{Duration, Instant};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, info};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Requests between progress log lines
pub const PROGRESS_INTERVAL: usize = 10_000;

// ============================================================================
// CLI Structure
// ============================================================================

/// TTL queue load generator
#[derive(Parser, Debug, Clone)]
#[command(name = "ttl-queue-load")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Load generator for the TTL queue service")]
pub struct Cli {
    /// Number of maximum concurrent connections
    #[arg(short, long = "max-conn", default_value = "100")]
    pub max_conn: usize,

    /// Number of requests to be performed
    #[arg(short, long, default_value = "1000")]
    pub count: usize,

    /// Scheme and host of the service, without the port
    #[arg(short, long = "base-url", default_value = "http://localhost")]
    pub base_url: String,

    /// Port the service listens on
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Time to live passed in the request path, in milliseconds
    #[arg(short, long, default_value = "5000", allow_negative_numbers = true)]
    pub ttl: i64,

    /// Logging level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Full push URL, e.g. `http://localhost:3000/push/5000`
    pub fn push_url(&self) -> String {
        format!(
            "{}:{}/push/{}",
            self.base_url.trim_end_matches('/'),
            self.port,
            self.ttl
        )
    }

    /// Validate argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), CliError> {
        if self.max_conn == 0 {
            return Err(CliError::InvalidArgument {
                argument: "max-conn".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(CliError::InvalidArgument {
                argument: "base-url".to_string(),
                message: format!("'{}' must start with http:// or https://", self.base_url),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Load generator errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request task failed: {message}")]
    Task { message: String },
}

// ============================================================================
// Statistics
// ============================================================================

/// Outcome counters shared by all request tasks
#[derive(Debug, Default)]
pub struct Statistics {
    success: AtomicUsize,
    error: AtomicUsize,
}

impl Statistics {
    fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.error.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests that received a response
    pub fn successes(&self) -> usize {
        self.success.load(Ordering::Relaxed)
    }

    /// Requests that failed in transport
    pub fn errors(&self) -> usize {
        self.error.load(Ordering::Relaxed)
    }
}

/// Summary of a finished load run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub successes: usize,
    pub errors: usize,
    pub elapsed: Duration,
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Successes: {}\nErrors: {}\nElapsed: {:.2?}",
            self.successes, self.errors, self.elapsed
        )
    }
}

// ============================================================================
// Load Generation
// ============================================================================

/// Payload sent with every push: a mix of nesting, large numbers and nulls
pub fn sample_payload() -> serde_json::Value {
    serde_json::json!({
        "say": "Hello world!",
        "square": {"width": 3000000, "height": 3000000},
        "some": {"very": {"deep": {"nested": {"prop": 69}}}},
        "ok": true,
        "sadness_level": null
    })
}

/// Run the configured number of push requests and report the outcome
pub async fn run_load(cli: &Cli) -> Result<LoadReport, CliError> {
    cli.validate()?;

    let client = reqwest::Client::builder().build()?;
    let semaphore = Arc::new(Semaphore::new(cli.max_conn));
    let statistics = Arc::new(Statistics::default());
    let url: Arc<str> = Arc::from(cli.push_url());
    let body = Bytes::from(sample_payload().to_string());
    let started = Instant::now();

    info!(url = %url, count = cli.count, max_conn = cli.max_conn, "Starting load run");

    let mut tasks = JoinSet::new();
    for i in 0..cli.count {
        if i % PROGRESS_INTERVAL == 0 {
            info!(performed = i, "Performed {} requests", i);
        }

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CliError::Task {
                message: e.to_string(),
            })?;

        let client = client.clone();
        let url = Arc::clone(&url);
        let body = body.clone();
        let stats = Arc::clone(&statistics);

        tasks.spawn(async move {
            perform_request(&client, &url, body, &stats).await;
            drop(permit);
        });

        while let Some(finished) = tasks.try_join_next() {
            finished.map_err(|e| CliError::Task {
                message: e.to_string(),
            })?;
        }
    }

    while let Some(finished) = tasks.join_next().await {
        finished.map_err(|e| CliError::Task {
            message: e.to_string(),
        })?;
    }

    Ok(LoadReport {
        successes: statistics.successes(),
        errors: statistics.errors(),
        elapsed: started.elapsed(),
    })
}

async fn perform_request(client: &reqwest::Client, url: &str, body: Bytes, stats: &Statistics) {
    match client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
    {
        Ok(_) => stats.record_success(),
        Err(e) => {
            debug!(error = %e, "Push request failed");
            stats.record_error();
        }
    }
}

/// Parse arguments, run the load and print the summary
pub async fn run_cli() -> Result<LoadReport, CliError> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let report = run_load(&cli).await?;
    println!("{}", report);
    Ok(report)
}
