//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the sync engine requires the host to provide.
//!
//! - [`EntityStore`]: keyed persistence, no query API, no cross-key
//!   transactions
//! - [`LedgerReader`]: synchronous, fallible reads of authoritative state
//! - [`MetadataSink`]: fire-and-forget registration of off-chain content
//! - [`EngineMetrics`]: counters for the telemetry layer

use crate::domain::entities::{Entity, OrderLine, Reference};
use crate::domain::errors::{LedgerReadError, StoreError};
use crate::domain::value_objects::{EntityKind, ResourceStatus, Role, TargetKind};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, EntityId, U256};

// =============================================================================
// ENTITY STORE
// =============================================================================

/// Raw keyed persistence.
///
/// Production: a key-value database keyed by `(kind, id)`.
/// Testing: `InMemoryEntityStore`.
pub trait EntityStore {
    /// Load the encoded entity stored under `(kind, id)`.
    fn load_raw(&self, kind: EntityKind, id: &EntityId) -> Result<Option<Vec<u8>>, StoreError>;

    /// Create or overwrite the entity stored under `(kind, id)`.
    fn save_raw(&mut self, kind: EntityKind, id: &EntityId, bytes: Vec<u8>)
        -> Result<(), StoreError>;

    /// Delete the entity stored under `(kind, id)`. Deleting a missing key is
    /// not an error.
    fn delete_raw(&mut self, kind: EntityKind, id: &EntityId) -> Result<(), StoreError>;
}

/// Typed access on top of [`EntityStore`], encoding entities with bincode.
pub trait EntityStoreExt: EntityStore {
    fn load<E: Entity>(&self, id: &EntityId) -> Result<Option<E>, StoreError> {
        match self.load_raw(E::KIND, id)? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Codec {
                    kind: E::KIND,
                    id: id.clone(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn save<E: Entity>(&mut self, entity: &E) -> Result<(), StoreError> {
        let bytes = bincode::serialize(entity).map_err(|e| StoreError::Codec {
            kind: E::KIND,
            id: entity.id().clone(),
            message: e.to_string(),
        })?;
        self.save_raw(E::KIND, entity.id(), bytes)
    }

    fn delete<E: Entity>(&mut self, id: &EntityId) -> Result<(), StoreError> {
        self.delete_raw(E::KIND, id)
    }

    fn exists<E: Entity>(&self, id: &EntityId) -> Result<bool, StoreError> {
        Ok(self.load_raw(E::KIND, id)?.is_some())
    }
}

impl<S: EntityStore + ?Sized> EntityStoreExt for S {}

// =============================================================================
// LEDGER READER
// =============================================================================

/// A principal's on-ledger profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PrincipalProfile {
    pub is_active: bool,
    pub uri: String,
    pub version: U256,
    pub base_price: Amount,
    pub vig_basis_points: U256,
}

/// One reference line as stored on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub contract: Address,
    pub token_id: U256,
    pub amount: Amount,
    #[serde(default)]
    pub unit_price_digital: Amount,
    #[serde(default)]
    pub unit_price_physical: Amount,
    #[serde(default)]
    pub is_composite: bool,
}

impl ReferenceData {
    pub fn to_reference(&self) -> Reference {
        let reference = Reference::new(self.contract, self.token_id, self.amount)
            .with_prices(self.unit_price_digital, self.unit_price_physical);
        if self.is_composite {
            reference.composite()
        } else {
            reference
        }
    }
}

/// Authoritative state of a composite resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResourceState {
    pub owner: Address,
    pub status: ResourceStatus,
    pub digital_price: Amount,
    pub physical_price: Amount,
    pub usage_count: U256,
    pub supply_count: U256,
    pub current_physical_editions: U256,
    pub uri: String,
    pub references: Vec<ReferenceData>,
}

/// Identifies one authorization request on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLookup {
    pub resource_contract: Address,
    pub resource_token_id: U256,
    pub target_kind: TargetKind,
    pub target_contract: Address,
    pub target_token_id: Option<U256>,
    pub is_physical: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestData {
    pub requested_amount: Amount,
    pub timestamp: u64,
}

/// A supply-coordination position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyPosition {
    pub parent_contract: Address,
    pub parent_id: U256,
    #[serde(default)]
    pub quantity: Amount,
    #[serde(default)]
    pub preferred_max_price: Amount,
    #[serde(default)]
    pub deadline: u64,
    #[serde(default)]
    pub is_physical: bool,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub matched_child_contract: Option<Address>,
    #[serde(default)]
    pub matched_child_id: Option<U256>,
    #[serde(default)]
    pub matched_supplier: Option<Address>,
}

/// One recipient's share in an order receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentData {
    pub recipient: Address,
    #[serde(default)]
    pub fulfiller_id: U256,
    pub amount: Amount,
    #[serde(default)]
    pub payment_type: u8,
}

/// A market's receipt for one executed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OrderReceipt {
    pub status: u8,
    pub is_physical: bool,
    pub fulfillment_data: String,
    pub lines: Vec<OrderLine>,
    pub payments: Vec<PaymentData>,
}

/// Gate state of one access-control contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GateFlags {
    pub designer_gated: bool,
    pub supplier_gated: bool,
}

impl GateFlags {
    pub const OPEN: GateFlags = GateFlags {
        designer_gated: false,
        supplier_gated: false,
    };

    /// Used when the ledger cannot be read.
    pub const RESTRICTIVE: GateFlags = GateFlags {
        designer_gated: true,
        supplier_gated: true,
    };
}

/// Synchronous reads of authoritative ledger state.
///
/// Every call may fail; callers fall back to a safe default and log.
pub trait LedgerReader {
    fn principal_profile(
        &self,
        registry_contract: Address,
        role: Role,
        profile_id: U256,
    ) -> Result<PrincipalProfile, LedgerReadError>;

    fn resource(&self, contract: Address, token_id: U256) -> Result<ResourceState, LedgerReadError>;

    fn authority_gates(&self, access_control: Address) -> Result<GateFlags, LedgerReadError>;

    fn authorization_request(&self, lookup: &RequestLookup) -> Result<RequestData, LedgerReadError>;

    fn supply_position(
        &self,
        coordination: Address,
        position_id: U256,
    ) -> Result<SupplyPosition, LedgerReadError>;

    fn order_receipt(&self, market: Address, order_id: U256) -> Result<OrderReceipt, LedgerReadError>;
}

// =============================================================================
// METADATA + METRICS
// =============================================================================

/// Registers off-chain content for background retrieval. Never blocks.
pub trait MetadataSink {
    fn register(&mut self, content_hash: &str, owner: &EntityId);
}

/// Counters reported by the service. Implementations must be cheap.
pub trait EngineMetrics {
    fn event_applied(&self, kind: &'static str);

    fn event_skipped(&self, kind: &'static str, reason: &'static str);

    fn gate_flipped(&self, role: Role, gated: bool);

    fn resolver_truncated(&self, count: usize);

    fn propagation_fanout(&self, principals: usize);
}
