//! Prometheus metrics for the sync engine.
//!
//! All metrics follow the naming convention: `fgo_sync_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **CounterVec**: events applied and skipped, gate flips, by label
//! - **Counter**: resolver truncations, propagation fan-out

use fgo_sync::domain::value_objects::Role;
use fgo_sync::EngineMetrics;
use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Events that changed the graph, by event kind
    pub static ref EVENTS_APPLIED: CounterVec = CounterVec::new(
        Opts::new("fgo_sync_events_applied_total", "Events applied to the entity graph"),
        &["kind"]
    ).expect("metric creation failed");

    /// Events that left the graph untouched
    pub static ref EVENTS_SKIPPED: CounterVec = CounterVec::new(
        Opts::new("fgo_sync_events_skipped_total", "Events skipped by the sync engine"),
        &["kind", "reason"]  // reason: unchanged/missing_entity/unbound_contract/...
    ).expect("metric creation failed");

    pub static ref GATE_FLIPS: CounterVec = CounterVec::new(
        Opts::new("fgo_sync_gate_flips_total", "Authority gate flips"),
        &["role", "gated"]
    ).expect("metric creation failed");

    /// Points where reference resolution stopped short
    pub static ref RESOLVER_TRUNCATIONS: Counter = Counter::new(
        "fgo_sync_resolver_truncations_total",
        "Reference walks cut by cycles, depth limit, missing targets or overflow"
    ).expect("metric creation failed");

    /// Principals rewritten by gate flips and contract deployments
    pub static ref PROPAGATION_FANOUT: Counter = Counter::new(
        "fgo_sync_propagation_principals_total",
        "Principals whose authorized contracts were rewritten"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry. Calling it again is a
/// no-op.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(EVENTS_APPLIED.clone()),
        Box::new(EVENTS_SKIPPED.clone()),
        Box::new(GATE_FLIPS.clone()),
        Box::new(RESOLVER_TRUNCATIONS.clone()),
        Box::new(PROPAGATION_FANOUT.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// `EngineMetrics` backed by the global Prometheus counters.
#[derive(Debug, Clone, Copy)]
pub struct PrometheusMetrics {
    enabled: bool,
}

impl PrometheusMetrics {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl EngineMetrics for PrometheusMetrics {
    fn event_applied(&self, kind: &'static str) {
        if self.enabled {
            EVENTS_APPLIED.with_label_values(&[kind]).inc();
        }
    }

    fn event_skipped(&self, kind: &'static str, reason: &'static str) {
        if self.enabled {
            EVENTS_SKIPPED.with_label_values(&[kind, reason]).inc();
        }
    }

    fn gate_flipped(&self, role: Role, gated: bool) {
        if self.enabled {
            let gated = if gated { "on" } else { "off" };
            GATE_FLIPS.with_label_values(&[role.as_str(), gated]).inc();
        }
    }

    fn resolver_truncated(&self, count: usize) {
        if self.enabled {
            RESOLVER_TRUNCATIONS.inc_by(count as f64);
        }
    }

    fn propagation_fanout(&self, principals: usize) {
        if self.enabled {
            PROPAGATION_FANOUT.inc_by(principals as f64);
        }
    }
}
