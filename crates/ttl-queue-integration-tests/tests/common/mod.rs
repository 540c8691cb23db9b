//! Common test utilities for ttl-queue-api integration tests
//!
//! This module provides:
//! - App state builders driven by a manual clock
//! - Request builders for the queue endpoints
//! - Response body helpers

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use std::sync::Arc;
use tower::ServiceExt;
use ttl_queue_api::{create_router, AppState, ServiceConfig};
use ttl_queue_core::{ManualClock, SweepMode};

/// Fixed starting instant for every manual clock, in Unix milliseconds
pub const START_MILLIS: i64 = 1_700_000_000_000;

/// Queue under test plus the clock that drives its expiry
#[derive(Clone)]
pub struct TestApp {
    pub clock: Arc<ManualClock>,
    pub state: AppState,
}

impl TestApp {
    /// Default configuration: head-only sweep, consume routes off
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        let clock = Arc::new(ManualClock::at_unix_millis(START_MILLIS));
        let state = AppState::with_clock(config, clock.clone());
        Self { clock, state }
    }

    #[allow(dead_code)]
    pub fn with_consume_routes() -> Self {
        let mut config = ServiceConfig::default();
        config.server.enable_consume_routes = true;
        Self::with_config(config)
    }

    #[allow(dead_code)]
    pub fn with_sweep_mode(mode: SweepMode) -> Self {
        let mut config = ServiceConfig::default();
        config.queue.sweep_mode = mode;
        Self::with_config(config)
    }

    /// Move the manual clock forward
    #[allow(dead_code)]
    pub fn advance(&self, millis: i64) {
        self.clock.advance_millis(millis);
    }

    /// Send one request through a freshly built router sharing this state
    pub async fn send(&self, request: Request<Body>) -> Response {
        create_router(self.state.clone())
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// `GET /status` and return the body text
    #[allow(dead_code)]
    pub async fn status_text(&self) -> String {
        body_text(self.send(get("/status")).await).await
    }

    /// `POST /push/{ttl}` with a JSON body and return the status code
    #[allow(dead_code)]
    pub async fn push(&self, ttl: &str, body: &str) -> axum::http::StatusCode {
        self.send(push(ttl, body)).await.status()
    }
}

/// Build a `POST /push/{ttl}` request with a JSON content type
#[allow(dead_code)]
pub fn push(ttl: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/push/{}", ttl))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Build a bodyless GET request
#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

/// Build a bodyless POST request
#[allow(dead_code)]
pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

/// Collect a response body as UTF-8 text
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Collect a response body as JSON
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}
