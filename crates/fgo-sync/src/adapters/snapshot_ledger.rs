//! # Snapshot Ledger
//!
//! `LedgerReader` backed by a static snapshot of authoritative state, loaded
//! from JSON. Used by the replay binary and by tests. A missing record reads
//! as `LedgerReadError::NotFound`, which exercises the engine's fallbacks.

use crate::domain::errors::LedgerReadError;
use crate::domain::value_objects::Role;
use crate::ports::outbound::{
    GateFlags, LedgerReader, OrderReceipt, PrincipalProfile, RequestData, RequestLookup, ResourceState,
    SupplyPosition,
};
use serde::{Deserialize, Serialize};
use shared_types::{keys, Address, U256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub contract: Address,
    pub profile_id: U256,
    pub profile: PrincipalProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRecord {
    pub access_control: Address,
    pub flags: GateFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub contract: Address,
    pub token_id: U256,
    pub state: ResourceState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub resource_contract: Address,
    pub resource_token_id: U256,
    pub target_contract: Address,
    #[serde(default)]
    pub target_token_id: Option<U256>,
    #[serde(default)]
    pub is_physical: bool,
    pub data: RequestData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub coordination: Address,
    pub position_id: U256,
    pub position: SupplyPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub market: Address,
    pub order_id: U256,
    pub receipt: OrderReceipt,
}

/// Static ledger state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotLedger {
    pub profiles: Vec<ProfileRecord>,
    pub gates: Vec<GateRecord>,
    pub resources: Vec<ResourceRecord>,
    pub requests: Vec<RequestRecord>,
    pub positions: Vec<PositionRecord>,
    pub orders: Vec<OrderRecord>,
}

impl SnapshotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn with_profile(mut self, contract: Address, profile_id: U256, profile: PrincipalProfile) -> Self {
        self.profiles.retain(|r| !(r.contract == contract && r.profile_id == profile_id));
        self.profiles.push(ProfileRecord {
            contract,
            profile_id,
            profile,
        });
        self
    }

    pub fn with_gates(mut self, access_control: Address, flags: GateFlags) -> Self {
        self.set_gates(access_control, flags);
        self
    }

    pub fn set_gates(&mut self, access_control: Address, flags: GateFlags) {
        self.gates.retain(|r| r.access_control != access_control);
        self.gates.push(GateRecord {
            access_control,
            flags,
        });
    }

    pub fn has_gates(&self, access_control: &Address) -> bool {
        self.gates.iter().any(|r| r.access_control == *access_control)
    }

    pub fn with_resource(mut self, contract: Address, token_id: U256, state: ResourceState) -> Self {
        self.set_resource(contract, token_id, state);
        self
    }

    /// Replace a resource's state in place, as a later block would.
    pub fn set_resource(&mut self, contract: Address, token_id: U256, state: ResourceState) {
        self.resources.retain(|r| !(r.contract == contract && r.token_id == token_id));
        self.resources.push(ResourceRecord {
            contract,
            token_id,
            state,
        });
    }

    pub fn with_request(mut self, record: RequestRecord) -> Self {
        self.requests.push(record);
        self
    }

    pub fn with_position(mut self, coordination: Address, position_id: U256, position: SupplyPosition) -> Self {
        self.set_position(coordination, position_id, position);
        self
    }

    pub fn set_position(&mut self, coordination: Address, position_id: U256, position: SupplyPosition) {
        self.positions
            .retain(|r| !(r.coordination == coordination && r.position_id == position_id));
        self.positions.push(PositionRecord {
            coordination,
            position_id,
            position,
        });
    }

    pub fn with_order(mut self, market: Address, order_id: U256, receipt: OrderReceipt) -> Self {
        self.orders.retain(|r| !(r.market == market && r.order_id == order_id));
        self.orders.push(OrderRecord {
            market,
            order_id,
            receipt,
        });
        self
    }
}

impl LedgerReader for SnapshotLedger {
    fn principal_profile(
        &self,
        registry_contract: Address,
        role: Role,
        profile_id: U256,
    ) -> Result<PrincipalProfile, LedgerReadError> {
        self.profiles
            .iter()
            .find(|r| r.contract == registry_contract && r.profile_id == profile_id)
            .map(|r| r.profile.clone())
            .ok_or_else(|| {
                LedgerReadError::NotFound(format!(
                    "{} profile {} on {}",
                    role,
                    profile_id,
                    keys::hex_address(&registry_contract)
                ))
            })
    }

    fn resource(&self, contract: Address, token_id: U256) -> Result<ResourceState, LedgerReadError> {
        self.resources
            .iter()
            .find(|r| r.contract == contract && r.token_id == token_id)
            .map(|r| r.state.clone())
            .ok_or_else(|| {
                LedgerReadError::NotFound(format!("resource {}", keys::resource(&contract, &token_id)))
            })
    }

    fn authority_gates(&self, access_control: Address) -> Result<GateFlags, LedgerReadError> {
        self.gates
            .iter()
            .find(|r| r.access_control == access_control)
            .map(|r| r.flags)
            .ok_or_else(|| {
                LedgerReadError::NotFound(format!("gates on {}", keys::hex_address(&access_control)))
            })
    }

    fn authorization_request(&self, lookup: &RequestLookup) -> Result<RequestData, LedgerReadError> {
        self.requests
            .iter()
            .find(|r| {
                r.resource_contract == lookup.resource_contract
                    && r.resource_token_id == lookup.resource_token_id
                    && r.target_contract == lookup.target_contract
                    && r.target_token_id == lookup.target_token_id
                    && r.is_physical == lookup.is_physical
            })
            .map(|r| r.data.clone())
            .ok_or_else(|| {
                LedgerReadError::NotFound(format!(
                    "request for {} on {}",
                    keys::resource(&lookup.resource_contract, &lookup.resource_token_id),
                    keys::hex_address(&lookup.target_contract)
                ))
            })
    }

    fn supply_position(
        &self,
        coordination: Address,
        position_id: U256,
    ) -> Result<SupplyPosition, LedgerReadError> {
        self.positions
            .iter()
            .find(|r| r.coordination == coordination && r.position_id == position_id)
            .map(|r| r.position.clone())
            .ok_or_else(|| {
                LedgerReadError::NotFound(format!(
                    "position {}",
                    keys::supply_request(&coordination, &position_id)
                ))
            })
    }

    fn order_receipt(&self, market: Address, order_id: U256) -> Result<OrderReceipt, LedgerReadError> {
        self.orders
            .iter()
            .find(|r| r.market == market && r.order_id == order_id)
            .map(|r| r.receipt.clone())
            .ok_or_else(|| LedgerReadError::NotFound(format!("order {}", keys::order(&market, &order_id))))
    }
}
