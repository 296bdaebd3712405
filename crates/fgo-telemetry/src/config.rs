//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Whether engine counters are reported to the Prometheus registry
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "fgo-sync".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FGO_SERVICE_NAME`: Service name (default: fgo-sync)
    /// - `FGO_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `FGO_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `FGO_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `FGO_METRICS_ENABLED`: Report engine counters (default: true)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("FGO_SERVICE_NAME").unwrap_or_else(|_| "fgo-sync".to_string()),

            log_level: env::var("FGO_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("FGO_CONSOLE_OUTPUT")
                .map(|v| flag_enabled(&v, true))
                .unwrap_or(true),

            json_logs: env::var("FGO_JSON_LOGS")
                .map(|v| flag_enabled(&v, false))
                .unwrap_or(is_container),

            metrics_enabled: env::var("FGO_METRICS_ENABLED")
                .map(|v| flag_enabled(&v, true))
                .unwrap_or(true),
        }
    }
}

/// `true`/`1` and `false`/`0` in any case; anything else yields `default`.
fn flag_enabled(raw: &str, default: bool) -> bool {
    match raw.to_lowercase().as_str() {
        "true" | "1" => true,
        "false" | "0" => false,
        _ => default,
    }
}
