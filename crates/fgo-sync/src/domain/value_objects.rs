//! # Value Objects
//!
//! Small enums and configuration shared by every component of the engine.

use serde::{Deserialize, Serialize};
use shared_types::TxHash;
use std::env;
use std::fmt;

/// Discriminates entity families inside the store. Two entities of different
/// kinds may share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Authority,
    Principal,
    GlobalRegistry,
    CompositeResource,
    AuthorizationRequest,
    ContractBinding,
    DeployedContract,
    SupplyRequest,
    SupplierProposal,
    PhysicalRights,
    Order,
    Payment,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Authority => "authority",
            EntityKind::Principal => "principal",
            EntityKind::GlobalRegistry => "global_registry",
            EntityKind::CompositeResource => "composite_resource",
            EntityKind::AuthorizationRequest => "authorization_request",
            EntityKind::ContractBinding => "contract_binding",
            EntityKind::DeployedContract => "deployed_contract",
            EntityKind::SupplyRequest => "supply_request",
            EntityKind::SupplierProposal => "supplier_proposal",
            EntityKind::PhysicalRights => "physical_rights",
            EntityKind::Order => "order",
            EntityKind::Payment => "payment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role a principal is enrolled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Designer,
    Supplier,
    Fulfiller,
}

impl Role {
    /// Contract families whose references a principal of this role may see.
    pub fn visible_contract_kinds(&self) -> &'static [ContractKind] {
        match self {
            Role::Designer => &[ContractKind::Parent],
            Role::Supplier => &[ContractKind::Child, ContractKind::Template],
            Role::Fulfiller => &[ContractKind::Market],
        }
    }

    /// Fulfillers have no gate and only ever see their own authority.
    pub fn is_gateable(&self) -> bool {
        !matches!(self, Role::Fulfiller)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Designer => "designer",
            Role::Supplier => "supplier",
            Role::Fulfiller => "fulfiller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a contract deployed under an authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    AccessControl,
    Designers,
    Suppliers,
    Fulfillers,
    Parent,
    Child,
    Template,
    Market,
    SupplyCoordination,
}

impl ContractKind {
    /// Role registered by a role-registry contract.
    pub fn registry_role(&self) -> Option<Role> {
        match self {
            ContractKind::Designers => Some(Role::Designer),
            ContractKind::Suppliers => Some(Role::Supplier),
            ContractKind::Fulfillers => Some(Role::Fulfiller),
            _ => None,
        }
    }

    /// Role whose principals see references of this contract kind.
    pub fn visible_to(&self) -> Option<Role> {
        match self {
            ContractKind::Parent => Some(Role::Designer),
            ContractKind::Child | ContractKind::Template => Some(Role::Supplier),
            ContractKind::Market => Some(Role::Fulfiller),
            _ => None,
        }
    }

    /// Resource family minted by this contract.
    pub fn resource_kind(&self) -> Option<ResourceKind> {
        match self {
            ContractKind::Parent => Some(ResourceKind::Parent),
            ContractKind::Child => Some(ResourceKind::Child),
            ContractKind::Template => Some(ResourceKind::Template),
            _ => None,
        }
    }
}

/// Composite resource family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Parent,
    Child,
    Template,
}

impl ResourceKind {
    /// Role of the principal that owns resources of this family.
    pub fn owner_role(&self) -> Role {
        match self {
            ResourceKind::Parent => Role::Designer,
            ResourceKind::Child | ResourceKind::Template => Role::Supplier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Created,
    Active,
    Disabled,
    Deleted,
}

/// State of an authorization request.
///
/// ```text
/// Requested ──→ Approved ──→ Revoked
///     │
///     └──────→ Rejected
///
/// any ──→ Requested (re-request, upsert in place)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Requested,
    Approved,
    Rejected,
    Revoked,
}

impl RequestState {
    pub fn can_transition_to(&self, next: RequestState) -> bool {
        matches!(
            (self, next),
            (_, RequestState::Requested)
                | (RequestState::Requested, RequestState::Approved)
                | (RequestState::Requested, RequestState::Rejected)
                | (RequestState::Approved, RequestState::Revoked)
        )
    }
}

/// What an authorization request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Parent,
    Template,
    Market,
}

impl TargetKind {
    /// Markets are contracts, not composite resources, and keep no reverse
    /// list.
    pub fn is_resource(&self) -> bool {
        !matches!(self, TargetKind::Market)
    }
}

/// Where and when an entity was last written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockProvenance {
    pub block_number: u64,
    pub block_timestamp: u64,
    pub transaction_hash: TxHash,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum composite nesting followed by the reference resolver.
    pub max_reference_depth: usize,
    /// Cap on references emitted by one resolver walk. Shared sub-composites
    /// are re-expanded per use, so a fan-out DAG grows multiplicatively.
    pub max_flattened_refs: usize,
    /// Skip events positioned before the last applied one.
    pub enforce_ordering: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_reference_depth: 16,
            max_flattened_refs: 4096,
            enforce_ordering: false,
        }
    }
}

impl SyncConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FGO_MAX_REFERENCE_DEPTH`: Resolver depth limit (default: 16)
    /// - `FGO_MAX_FLATTENED_REFS`: Resolver output budget (default: 4096)
    /// - `FGO_ENFORCE_ORDERING`: Skip out-of-order events (default: false)
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of an existing configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(depth) = env::var("FGO_MAX_REFERENCE_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.max_reference_depth = depth;
        }
        if let Some(budget) = env::var("FGO_MAX_FLATTENED_REFS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.max_flattened_refs = budget;
        }
        if let Ok(v) = env::var("FGO_ENFORCE_ORDERING") {
            self.enforce_ordering = v.to_lowercase() == "true" || v == "1";
        }
        self
    }
}
