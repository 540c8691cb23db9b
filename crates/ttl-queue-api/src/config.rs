//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use ttl_queue_core::SweepMode;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Prefix for structured environment overrides, e.g. `TTLQ__SERVER__HOST`
pub const ENV_PREFIX: &str = "TTLQ";

/// Environment variable naming an explicit YAML configuration file
pub const CONFIG_FILE_ENV: &str = "TTLQ_CONFIG_FILE";

/// Environment variable selecting the listening port
pub const PORT_ENV: &str = "PORT";

/// Service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Queue behaviour
    pub queue: QueueConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from files and the process environment
    ///
    /// Sources, later ones overriding earlier ones:
    ///  1. built-in defaults
    ///  2. `config/service.yaml`, if present
    ///  3. the file named by `TTLQ_CONFIG_FILE`, which must exist when set
    ///  4. `TTLQ__SECTION__KEY` environment variables
    ///  5. `PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let explicit_file = std::env::var(CONFIG_FILE_ENV)
            .ok()
            .filter(|path| !path.is_empty());
        let port = std::env::var(PORT_ENV).ok().filter(|port| !port.is_empty());

        Self::load_with(
            explicit_file.as_deref().map(Path::new),
            ::config::Environment::with_prefix(ENV_PREFIX).separator("__"),
            port,
        )
    }

    /// Load configuration from explicit sources
    ///
    /// `environment` is the structured override source and `port` the value
    /// of the single port knob, which wins over everything else.
    pub fn load_with(
        config_file: Option<&Path>,
        environment: ::config::Environment,
        port: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder().add_source(
            ::config::File::with_name("config/service")
                .required(false)
                .format(::config::FileFormat::Yaml),
        );

        if let Some(path) = config_file {
            info!(path = %path.display(), "Loading configuration from explicit path");
            builder = builder.add_source(
                ::config::File::from(path)
                    .required(true)
                    .format(::config::FileFormat::Yaml),
            );
        }

        let config: Self = builder
            .add_source(environment)
            .set_override_option("server.port", port)?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "server.host must not be empty".to_string(),
            });
        }

        if self.server.max_body_size == Some(0) {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be greater than zero when set".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes (unlimited when absent)
    pub max_body_size: Option<usize>,

    /// Expose `GET /peek` and `POST /pop`
    pub enable_consume_routes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_body_size: None,
            enable_consume_routes: false,
        }
    }
}

/// Queue configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// How expired entries are purged before each operation
    pub sweep_mode: SweepMode,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level, used when `RUST_LOG` is not set
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}
