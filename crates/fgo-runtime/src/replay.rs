//! Input loading and store export for replay runs.

use anyhow::{Context, Result};
use fgo_sync::domain::entities::{
    Authority, AuthorizationRequest, CompositeResource, ContractBinding, DeployedContract, Entity,
    GlobalRegistry, Order, Payment, PhysicalRights, Principal, SupplierProposal, SupplyRequest,
};
use fgo_sync::{EntityStoreExt, InMemoryEntityStore, LedgerEvent, SnapshotLedger, SyncConfig};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Read newline-delimited JSON events. Blank lines and `#` comments are
/// ignored.
pub fn load_events(path: &Path) -> Result<Vec<LedgerEvent>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read events from {}", path.display()))?;
    parse_events(&raw).with_context(|| format!("Invalid event stream {}", path.display()))
}

pub fn parse_events(raw: &str) -> Result<Vec<LedgerEvent>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("Malformed event on line {}", n + 1))
        })
        .collect()
}

/// Ledger snapshot, or an empty ledger when no path is given.
pub fn load_ledger(path: Option<&Path>) -> Result<SnapshotLedger> {
    let Some(path) = path else {
        return Ok(SnapshotLedger::new());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ledger snapshot from {}", path.display()))?;
    SnapshotLedger::from_json(&raw)
        .with_context(|| format!("Invalid ledger snapshot {}", path.display()))
}

/// Engine configuration from an optional JSON file, then the environment.
pub fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    let base = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => SyncConfig::default(),
    };
    Ok(base.with_env_overrides())
}

/// Every stored entity as JSON, grouped by kind.
pub fn export_store(store: &InMemoryEntityStore) -> Result<Value> {
    let mut out = Map::new();
    export_kind::<Authority>(store, &mut out)?;
    export_kind::<GlobalRegistry>(store, &mut out)?;
    export_kind::<ContractBinding>(store, &mut out)?;
    export_kind::<DeployedContract>(store, &mut out)?;
    export_kind::<Principal>(store, &mut out)?;
    export_kind::<CompositeResource>(store, &mut out)?;
    export_kind::<AuthorizationRequest>(store, &mut out)?;
    export_kind::<SupplyRequest>(store, &mut out)?;
    export_kind::<SupplierProposal>(store, &mut out)?;
    export_kind::<PhysicalRights>(store, &mut out)?;
    export_kind::<Order>(store, &mut out)?;
    export_kind::<Payment>(store, &mut out)?;
    Ok(Value::Object(out))
}

fn export_kind<E: Entity>(store: &InMemoryEntityStore, out: &mut Map<String, Value>) -> Result<()> {
    let mut entities = Map::new();
    for (id, _) in store.entries_of(E::KIND) {
        let entity = store
            .load::<E>(id)?
            .with_context(|| format!("{} {} vanished during export", E::KIND, id))?;
        entities.insert(id.to_string(), serde_json::to_value(&entity)?);
    }
    if !entities.is_empty() {
        out.insert(E::KIND.as_str().to_string(), Value::Object(entities));
    }
    Ok(())
}
