//! Common utilities for end-to-end tests
//!
//! Each test starts the real HTTP server on an ephemeral loopback port and
//! talks to it with reqwest. Time is the system clock, so expiry tests use
//! short TTLs and real sleeps.

use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use ttl_queue_api::{serve, AppState, ServiceConfig, ServiceError};

/// Running server handle that shuts the server down on drop
pub struct TestServer {
    pub base_url: String,
    pub port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<(), ServiceError>>>,
}

impl TestServer {
    /// Start a server with the default configuration
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with_config(ServiceConfig::default()).await
    }

    /// Start a server with a custom configuration
    ///
    /// The configured host and port are ignored; the server always binds an
    /// ephemeral port on 127.0.0.1.
    pub async fn start_with_config(config: ServiceConfig) -> anyhow::Result<Self> {
        Self::start_with_state(AppState::from_config(config)).await
    }

    /// Start a server around prepared state, e.g. a queue built by the test
    pub async fn start_with_state(state: AppState) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, state, async move {
            let _ = rx.await;
        }));

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            port,
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    /// Full URL for a path on this server
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Signal shutdown and wait for the server task to finish
    #[allow(dead_code)]
    pub async fn stop(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            tokio::time::timeout(Duration::from_secs(5), handle).await???;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// HTTP client with a timeout suitable for tests
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}

/// `GET /status` and return the body text
pub async fn status_text(client: &reqwest::Client, server: &TestServer) -> anyhow::Result<String> {
    let response = client.get(server.url("/status")).send().await?;
    anyhow::ensure!(
        response.status() == reqwest::StatusCode::OK,
        "status returned {}",
        response.status()
    );
    Ok(response.text().await?)
}

/// `POST /push/{ttl}` with a JSON body and return the response status
#[allow(dead_code)]
pub async fn push(
    client: &reqwest::Client,
    server: &TestServer,
    ttl: &str,
    body: &serde_json::Value,
) -> anyhow::Result<reqwest::StatusCode> {
    let response = client
        .post(server.url(&format!("/push/{}", ttl)))
        .json(body)
        .send()
        .await?;
    Ok(response.status())
}
