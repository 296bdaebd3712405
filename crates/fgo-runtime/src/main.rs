//! # FGO Runtime
//!
//! Replays a recorded event stream through the sync engine.
//!
//! ## Startup Sequence
//!
//! 1. Load telemetry configuration from env and install logging
//! 2. Load engine configuration (file, then env overrides)
//! 3. Load the ledger snapshot and the event stream
//! 4. Apply every event in file order
//! 5. Report stats, pending metadata fetches and optionally the store

mod replay;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fgo_sync::{InMemoryEntityStore, MetadataQueue, SyncEngineApi, SyncService};
use fgo_telemetry::{init_telemetry, PrometheusMetrics, TelemetryConfig};

/// Replay ledger events into the FGO entity graph
#[derive(Parser, Debug)]
#[command(name = "fgo-runtime")]
#[command(about = "Replay ledger events into the FGO entity graph")]
struct Args {
    /// Newline-delimited JSON event stream
    #[arg(short, long)]
    events: PathBuf,

    /// JSON ledger snapshot answering profile, resource, request and position reads
    #[arg(short, long)]
    ledger: Option<PathBuf>,

    /// JSON engine configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final store as JSON
    #[arg(long)]
    dump: bool,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    metrics: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = replay::load_config(args.config.as_deref())?;
    let ledger = replay::load_ledger(args.ledger.as_deref())?;
    let events = replay::load_events(&args.events)?;
    info!(
        events = events.len(),
        max_reference_depth = config.max_reference_depth,
        max_flattened_refs = config.max_flattened_refs,
        enforce_ordering = config.enforce_ordering,
        "Starting replay"
    );

    let mut service = SyncService::new(
        InMemoryEntityStore::new(),
        ledger,
        MetadataQueue::new(),
        PrometheusMetrics::new(telemetry.metrics_enabled),
        config,
    );
    let stats = service.apply_all(&events).context("Replay aborted by store failure")?;

    info!(
        applied = stats.applied,
        skipped = stats.skipped,
        last_position = ?stats.last_position,
        entities = service.store().len(),
        pending_metadata = service.metadata().pending().len(),
        "Replay finished"
    );

    if args.metrics {
        print!("{}", fgo_telemetry::encode_metrics()?);
    }
    if args.dump {
        let exported = replay::export_store(service.store())?;
        println!("{}", serde_json::to_string_pretty(&exported)?);
    }
    Ok(())
}
