//! # TTL Queue Service
//!
//! Binary entry point for the TTL queue HTTP service.
//!
//! This executable:
//! - Loads configuration from files and the environment (`PORT` picks the port)
//! - Initializes structured logging
//! - Creates the one queue this process serves
//! - Starts the HTTP server from ttl-queue-api

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ttl_queue_api::{start_server, LoggingConfig, ServiceConfig, ServiceError};
use ttl_queue_core::{QueueService, SystemClock};

#[tokio::main]
async fn main() {
    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Every field has a default, so an unconfigured environment serves on
    // 0.0.0.0:3000. A malformed file or an override that cannot be coerced to
    // the right type is a hard error.
    // -------------------------------------------------------------------------
    let service_config = match ServiceConfig::load() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!(error = %e, "Failed to load configuration; aborting");
            std::process::exit(3);
        }
    };

    init_tracing(&service_config.logging);

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        sweep_mode = ?service_config.queue.sweep_mode,
        consume_routes = service_config.server.enable_consume_routes,
        "Starting TTL queue service"
    );

    let queue = Arc::new(QueueService::new(
        Arc::new(SystemClock),
        service_config.queue.sweep_mode,
    ));

    if let Err(e) = start_server(service_config, queue).await {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when it is set.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ttl_queue_service={level},ttl_queue_api={level},ttl_queue_core={level},tower_http=warn",
            level = logging.level
        ))
    });

    let (json_layer, text_layer) = if logging.json_format {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
