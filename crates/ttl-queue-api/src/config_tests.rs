//! Tests for [`ServiceConfig`] loading and validation.

use super::*;
use serial_test::serial;
use std::io::Write;

fn environment(vars: &[(&str, &str)]) -> ::config::Environment {
    let source: ::config::Map<String, String> = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    ::config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .source(Some(source))
}

fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ============================================================================
// Defaults
// ============================================================================

mod defaults {
    use super::*;

    /// Verify the built-in defaults.
    #[test]
    fn test_default_values() {
        let config = ServiceConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.max_body_size, None);
        assert!(!config.server.enable_consume_routes);
        assert_eq!(config.queue.sweep_mode, SweepMode::HeadOnly);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
    }

    /// Verify that an unconfigured environment yields the defaults.
    #[test]
    fn test_empty_sources_yield_defaults() {
        let config = ServiceConfig::load_with(None, environment(&[]), None).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }
}

// ============================================================================
// Sources
// ============================================================================

mod sources {
    use super::*;

    /// Verify that the port knob overrides the default port.
    #[test]
    fn test_port_override() {
        let config =
            ServiceConfig::load_with(None, environment(&[]), Some("8081".to_string())).unwrap();
        assert_eq!(config.server.port, 8081);
    }

    /// Verify that structured environment variables set nested keys.
    #[test]
    fn test_structured_environment_overrides() {
        let config = ServiceConfig::load_with(
            None,
            environment(&[
                ("TTLQ__SERVER__HOST", "127.0.0.1"),
                ("TTLQ__SERVER__ENABLE_CONSUME_ROUTES", "true"),
                ("TTLQ__QUEUE__SWEEP_MODE", "full"),
                ("TTLQ__LOGGING__LEVEL", "debug"),
            ]),
            None,
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.server.enable_consume_routes);
        assert_eq!(config.queue.sweep_mode, SweepMode::Full);
        assert_eq!(config.logging.level, "debug");
    }

    /// Verify that the port knob wins over the structured port variable.
    #[test]
    fn test_port_knob_wins_over_structured_port() {
        let config = ServiceConfig::load_with(
            None,
            environment(&[("TTLQ__SERVER__PORT", "9000")]),
            Some("9001".to_string()),
        )
        .unwrap();
        assert_eq!(config.server.port, 9001);
    }

    /// Verify that an explicit YAML file is applied below environment overrides.
    #[test]
    fn test_explicit_file_then_environment() {
        let file = yaml_file(
            "server:\n  port: 4000\n  max_body_size: 1024\nlogging:\n  json_format: true\n",
        );

        let config = ServiceConfig::load_with(
            Some(file.path()),
            environment(&[("TTLQ__SERVER__PORT", "4001")]),
            None,
        )
        .unwrap();

        assert_eq!(config.server.port, 4001);
        assert_eq!(config.server.max_body_size, Some(1024));
        assert!(config.logging.json_format);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    /// Verify that a missing explicit file is an error.
    #[test]
    fn test_missing_explicit_file_fails() {
        let result = ServiceConfig::load_with(
            Some(Path::new("/definitely/not/here/service.yaml")),
            environment(&[]),
            None,
        );
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    /// Verify that a non-numeric port is an error.
    #[test]
    fn test_non_numeric_port_fails() {
        let result =
            ServiceConfig::load_with(None, environment(&[]), Some("not-a-port".to_string()));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    /// Verify that `load` honours the process `PORT` variable.
    #[test]
    #[serial]
    fn test_load_reads_port_from_process_environment() {
        std::env::set_var(PORT_ENV, "3555");
        let result = ServiceConfig::load();
        std::env::remove_var(PORT_ENV);

        assert_eq!(result.unwrap().server.port, 3555);
    }

    /// Verify that `load` falls back to the default port.
    #[test]
    #[serial]
    fn test_load_defaults_port_when_unset() {
        std::env::remove_var(PORT_ENV);
        let config = ServiceConfig::load().unwrap();
        assert_eq!(config.server.port, 3000);
    }
}

// ============================================================================
// Validation
// ============================================================================

mod validation {
    use super::*;

    /// Verify that an empty host is rejected.
    #[test]
    fn test_empty_host_is_invalid() {
        let mut config = ServiceConfig::default();
        config.server.host = "  ".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    /// Verify that a zero body limit is rejected.
    #[test]
    fn test_zero_body_limit_is_invalid() {
        let mut config = ServiceConfig::default();
        config.server.max_body_size = Some(0);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    /// Verify that validation failures surface from loading.
    #[test]
    fn test_load_rejects_invalid_config() {
        let result = ServiceConfig::load_with(
            None,
            environment(&[("TTLQ__SERVER__HOST", "")]),
            None,
        );
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
