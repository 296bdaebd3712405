//! # FGO Telemetry
//!
//! Observability for the sync engine.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an `EnvFilter` and a
//!   JSON or human-readable layer
//! - **Metrics**: Prometheus counters fed through the engine's
//!   `EngineMetrics` port
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fgo_telemetry::{init_telemetry, PrometheusMetrics, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! let metrics = PrometheusMetrics::new(config.metrics_enabled);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FGO_SERVICE_NAME` | `fgo-sync` | Service name in logs |
//! | `FGO_LOG_LEVEL` | `info` | Log level filter |
//! | `FGO_JSON_LOGS` | `false` (`true` in containers) | JSON log output |
//! | `FGO_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `FGO_METRICS_ENABLED` | `true` | Report engine counters |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, PrometheusMetrics, EVENTS_APPLIED, EVENTS_SKIPPED,
    GATE_FLIPS, PROPAGATION_FANOUT, REGISTRY, RESOLVER_TRUNCATIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if config.metrics_enabled {
        register_metrics()?;
    }
    init_logging(config)
}
