//! # TTL Queue HTTP Service
//!
//! HTTP front end for the in-memory TTL queue.
//!
//! This service provides:
//! - `GET /status`: post-sweep queue size as plain text
//! - `POST /push/{ttl}`: enqueue the JSON body, expiring `ttl` milliseconds from now
//! - `GET /peek` and `POST /pop`: optional consume routes, off by default
//!
//! Handlers only translate between HTTP and [`QueueService`]; the sweep that
//! hides expired entries runs inside every queue operation.

pub mod config;
pub mod errors;

pub use crate::config::{LoggingConfig, QueueConfig, ServerConfig, ServiceConfig};
pub use crate::errors::{ConfigError, QueueHandlerError, ServiceError};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use serde_json::Value;
use std::{future::Future, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument, warn};
use ttl_queue_core::{Clock, QueueService, SystemClock, Ttl};

/// Queue of opaque JSON payloads shared by all request handlers
pub type PayloadQueue = QueueService<Value>;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// The queue this server instance works with
    pub queue: Arc<PayloadQueue>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServiceConfig, queue: Arc<PayloadQueue>) -> Self {
        Self { config, queue }
    }

    /// Create state with a fresh queue driven by the given clock
    pub fn with_clock(config: ServiceConfig, clock: Arc<dyn Clock>) -> Self {
        let queue = Arc::new(QueueService::new(clock, config.queue.sweep_mode));
        Self::new(config, queue)
    }

    /// Create state with a fresh queue driven by the system clock
    pub fn from_config(config: ServiceConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/status", get(handle_status))
        .route("/push/{ttl}", post(handle_push));

    if state.config.server.enable_consume_routes {
        router = router
            .route("/peek", get(handle_peek))
            .route("/pop", post(handle_pop));
    }

    let body_limit = match state.config.server.max_body_size {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    request_logging_middleware,
                ))
                .into_inner(),
        )
        .layer(body_limit)
        .with_state(state)
}

/// Serve the router on an already bound listener until `shutdown` resolves
///
/// In-flight requests are allowed to finish once shutdown starts.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    shutdown: F,
) -> Result<(), ServiceError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })
}

/// Start HTTP server
///
/// Binds to the configured host and port and runs until SIGINT or SIGTERM.
pub async fn start_server(
    config: ServiceConfig,
    queue: Arc<PayloadQueue>,
) -> Result<(), ServiceError> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!(address = %address, "Server running on port {}", config.server.port);

    let state = AppState::new(config, queue);
    serve(listener, state, shutdown_signal()).await?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolve on SIGINT (Ctrl+C) or, on Unix, SIGTERM
///
/// If a handler cannot be installed that signal is never delivered, and the
/// other one still triggers shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

// ============================================================================
// Queue Handlers
// ============================================================================

/// Report the post-sweep queue size
#[instrument(skip_all)]
pub async fn handle_status(State(state): State<AppState>) -> String {
    let status = state.queue.status();
    debug!(size = status.size, "Reporting queue status");
    format!("Queue size: {}", status.size)
}

/// Push the request body with an expiration `ttl` milliseconds from now
///
/// The body is stored verbatim; an empty body is stored as JSON `null`.
#[instrument(skip_all)]
pub async fn handle_push(
    State(state): State<AppState>,
    Path(ttl): Path<String>,
    body: Bytes,
) -> Result<StatusCode, QueueHandlerError> {
    let ttl: Ttl = ttl.parse()?;
    let payload = parse_payload(&body)?;
    let expires_at = state.queue.push(ttl, payload)?;

    debug!(
        ttl_ms = ttl.as_millis(),
        expires_at = %expires_at,
        payload_bytes = body.len(),
        "Queued payload"
    );

    Ok(StatusCode::OK)
}

/// Return the live head payload without removing it
#[instrument(skip_all)]
pub async fn handle_peek(State(state): State<AppState>) -> Response {
    match state.queue.peek() {
        Some(payload) => Json(payload).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Remove the live head and return its payload
#[instrument(skip_all)]
pub async fn handle_pop(State(state): State<AppState>) -> Response {
    match state.queue.pop() {
        Some(payload) => Json(payload).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Decode a request body into an opaque JSON payload
fn parse_payload(body: &[u8]) -> Result<Value, QueueHandlerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(body).map_err(|e| QueueHandlerError::InvalidPayload {
        message: e.to_string(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Header carrying the request correlation ID
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Request logging middleware with correlation ID tracking
///
/// Reads or generates the correlation ID, echoes it on the response and logs
/// completion together with the number of entries the queue holds. The size
/// is read without sweeping, so it may still count expired entries.
#[instrument(skip(state, request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());

    let mut response = next.run(request).await;

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    let status = response.status();
    let held = state.queue.held();
    let duration_ms = start.elapsed().as_millis() as u64;

    match status.as_u16() {
        500..=u16::MAX => error!(%status, held, duration_ms, "Request failed"),
        400..=499 => warn!(%status, held, duration_ms, "Request rejected"),
        _ => info!(%status, held, duration_ms, "Request completed"),
    }

    response
}
