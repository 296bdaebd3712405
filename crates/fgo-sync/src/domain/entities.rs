//! # Graph Entities
//!
//! Denormalized records persisted in the entity store. Relationship lists
//! are plain `Vec<EntityId>`: always present, possibly empty, unique and in
//! insertion order.
//!
//! ## Ownership
//!
//! The store owns persisted state. A handler loads the entities it touches,
//! mutates them and saves them back before returning.

use super::value_objects::{
    BlockProvenance, ContractKind, EntityKind, RequestState, ResourceKind, ResourceStatus, Role,
    TargetKind,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{keys, Address, Amount, EntityId, EventPosition, InfraId, U256};

/// A persistable record with a stable key.
pub trait Entity: Serialize + DeserializeOwned {
    const KIND: EntityKind;

    fn id(&self) -> &EntityId;
}

macro_rules! impl_entity {
    ($ty:ty, $kind:expr) => {
        impl Entity for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> &EntityId {
                &self.id
            }
        }
    };
}

// =============================================================================
// AUTHORITY
// =============================================================================

/// An independently governed namespace (infrastructure) owning contract lists
/// and two gating flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub id: EntityId,
    pub infra_id: InfraId,
    pub deployer: Address,
    pub is_active: bool,
    pub is_designer_gated: bool,
    pub is_supplier_gated: bool,
    pub access_control: Address,
    pub designers_contract: Address,
    pub suppliers_contract: Address,
    pub fulfillers_contract: Address,
    #[serde(default)]
    pub designers: Vec<EntityId>,
    #[serde(default)]
    pub suppliers: Vec<EntityId>,
    #[serde(default)]
    pub fulfillers: Vec<EntityId>,
    #[serde(default)]
    pub parents: Vec<EntityId>,
    #[serde(default)]
    pub children: Vec<EntityId>,
    #[serde(default)]
    pub templates: Vec<EntityId>,
    #[serde(default)]
    pub markets: Vec<EntityId>,
    pub provenance: BlockProvenance,
}

impl_entity!(Authority, EntityKind::Authority);

impl Authority {
    /// New, ungated, active authority with empty lists.
    pub fn new(infra_id: InfraId, deployer: Address, provenance: BlockProvenance) -> Self {
        Self {
            id: keys::authority(&infra_id),
            infra_id,
            deployer,
            is_active: true,
            is_designer_gated: false,
            is_supplier_gated: false,
            access_control: Address::zero(),
            designers_contract: Address::zero(),
            suppliers_contract: Address::zero(),
            fulfillers_contract: Address::zero(),
            designers: Vec::new(),
            suppliers: Vec::new(),
            fulfillers: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
            templates: Vec::new(),
            markets: Vec::new(),
            provenance,
        }
    }

    /// Gate flag for a role. Fulfillers are never gated.
    pub fn is_gated(&self, role: Role) -> bool {
        match role {
            Role::Designer => self.is_designer_gated,
            Role::Supplier => self.is_supplier_gated,
            Role::Fulfiller => false,
        }
    }

    /// Returns false when the role has no gate.
    pub fn set_gated(&mut self, role: Role, gated: bool) -> bool {
        match role {
            Role::Designer => self.is_designer_gated = gated,
            Role::Supplier => self.is_supplier_gated = gated,
            Role::Fulfiller => return false,
        }
        true
    }

    pub fn members(&self, role: Role) -> &Vec<EntityId> {
        match role {
            Role::Designer => &self.designers,
            Role::Supplier => &self.suppliers,
            Role::Fulfiller => &self.fulfillers,
        }
    }

    pub fn members_mut(&mut self, role: Role) -> &mut Vec<EntityId> {
        match role {
            Role::Designer => &mut self.designers,
            Role::Supplier => &mut self.suppliers,
            Role::Fulfiller => &mut self.fulfillers,
        }
    }

    /// Contract list holding references of the given kind, if the kind is
    /// listed on the authority at all.
    pub fn contracts_mut(&mut self, kind: ContractKind) -> Option<&mut Vec<EntityId>> {
        match kind {
            ContractKind::Parent => Some(&mut self.parents),
            ContractKind::Child => Some(&mut self.children),
            ContractKind::Template => Some(&mut self.templates),
            ContractKind::Market => Some(&mut self.markets),
            _ => None,
        }
    }

    pub fn contracts(&self, kind: ContractKind) -> Option<&Vec<EntityId>> {
        match kind {
            ContractKind::Parent => Some(&self.parents),
            ContractKind::Child => Some(&self.children),
            ContractKind::Template => Some(&self.templates),
            ContractKind::Market => Some(&self.markets),
            _ => None,
        }
    }

    /// All contract references visible to principals of `role`, in list order.
    pub fn contracts_for(&self, role: Role) -> Vec<EntityId> {
        role.visible_contract_kinds()
            .iter()
            .filter_map(|kind| self.contracts(*kind))
            .flat_map(|list| list.iter().cloned())
            .collect()
    }

    /// A principal is enrolled when created here or when its address is
    /// listed as a member, under either authority's namespace.
    pub fn has_enrolled(&self, principal: &Principal) -> bool {
        if principal.authority == self.id || principal.id.is_namespaced_under(&self.id) {
            return true;
        }
        let members = self.members(principal.role);
        members.contains(&principal.id)
            || members.contains(&keys::principal(&self.id, &principal.address))
    }
}

// =============================================================================
// PRINCIPAL
// =============================================================================

/// A designer, supplier or fulfiller enrolled with one authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: EntityId,
    pub authority: EntityId,
    pub role: Role,
    pub address: Address,
    pub is_active: bool,
    pub profile_id: U256,
    pub uri: String,
    pub version: U256,
    pub metadata: Option<String>,
    pub base_price: Amount,
    pub vig_basis_points: U256,
    /// Materialised cache of contract references this principal may use.
    #[serde(default)]
    pub authorized_contracts: Vec<EntityId>,
    #[serde(default)]
    pub resources: Vec<EntityId>,
    /// Orders paying this principal. Fulfillers only.
    #[serde(default)]
    pub orders: Vec<EntityId>,
    pub provenance: BlockProvenance,
}

impl_entity!(Principal, EntityKind::Principal);

impl Principal {
    pub fn new(
        authority: &EntityId,
        role: Role,
        address: Address,
        profile_id: U256,
        provenance: BlockProvenance,
    ) -> Self {
        Self {
            id: keys::principal(authority, &address),
            authority: authority.clone(),
            role,
            address,
            is_active: false,
            profile_id,
            uri: String::new(),
            version: U256::zero(),
            metadata: None,
            base_price: Amount::zero(),
            vig_basis_points: U256::zero(),
            authorized_contracts: Vec::new(),
            resources: Vec::new(),
            orders: Vec::new(),
            provenance,
        }
    }
}

// =============================================================================
// GLOBAL REGISTRY
// =============================================================================

/// Singleton index of every authority and principal, used for bulk gating
/// propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalRegistry {
    pub id: EntityId,
    #[serde(default)]
    pub all_authorities: Vec<EntityId>,
    #[serde(default)]
    pub all_designers: Vec<EntityId>,
    #[serde(default)]
    pub all_suppliers: Vec<EntityId>,
    #[serde(default)]
    pub all_fulfillers: Vec<EntityId>,
}

impl_entity!(GlobalRegistry, EntityKind::GlobalRegistry);

impl Default for GlobalRegistry {
    fn default() -> Self {
        Self {
            id: keys::registry(),
            all_authorities: Vec::new(),
            all_designers: Vec::new(),
            all_suppliers: Vec::new(),
            all_fulfillers: Vec::new(),
        }
    }
}

impl GlobalRegistry {
    pub fn principals(&self, role: Role) -> &Vec<EntityId> {
        match role {
            Role::Designer => &self.all_designers,
            Role::Supplier => &self.all_suppliers,
            Role::Fulfiller => &self.all_fulfillers,
        }
    }

    pub fn principals_mut(&mut self, role: Role) -> &mut Vec<EntityId> {
        match role {
            Role::Designer => &mut self.all_designers,
            Role::Supplier => &mut self.all_suppliers,
            Role::Fulfiller => &mut self.all_fulfillers,
        }
    }
}

// =============================================================================
// COMPOSITE RESOURCE
// =============================================================================

/// One line of a composite's bill of materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub target_id: EntityId,
    pub target_contract: Address,
    pub target_token_id: U256,
    pub amount: Amount,
    pub unit_price_digital: Amount,
    pub unit_price_physical: Amount,
    /// The target itself carries references.
    pub is_composite: bool,
}

impl Reference {
    pub fn new(target_contract: Address, target_token_id: U256, amount: Amount) -> Self {
        Self {
            target_id: keys::resource(&target_contract, &target_token_id),
            target_contract,
            target_token_id,
            amount,
            unit_price_digital: Amount::zero(),
            unit_price_physical: Amount::zero(),
            is_composite: false,
        }
    }

    pub fn with_prices(mut self, digital: Amount, physical: Amount) -> Self {
        self.unit_price_digital = digital;
        self.unit_price_physical = physical;
        self
    }

    pub fn composite(mut self) -> Self {
        self.is_composite = true;
        self
    }

    pub fn unit_price(&self, is_physical: bool) -> Amount {
        if is_physical {
            self.unit_price_physical
        } else {
            self.unit_price_digital
        }
    }
}

/// A parent design, child or template: a token whose reference list may
/// contain other composites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeResource {
    pub id: EntityId,
    pub kind: ResourceKind,
    pub contract: Address,
    pub token_id: U256,
    pub authority: EntityId,
    pub owner: Address,
    pub status: ResourceStatus,
    pub digital_price: Amount,
    pub physical_price: Amount,
    pub accumulated_digital_price: Amount,
    pub accumulated_physical_price: Amount,
    pub uri: String,
    pub metadata: Option<String>,
    pub usage_count: U256,
    pub supply_count: U256,
    #[serde(default)]
    pub current_physical_editions: U256,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub all_nested_refs: Vec<Reference>,
    /// Targets (parents, templates, markets) this resource is approved for.
    #[serde(default)]
    pub authorized_targets: Vec<EntityId>,
    /// Resources approved to be used by this one.
    #[serde(default)]
    pub authorized_children: Vec<EntityId>,
    #[serde(default)]
    pub request_history: Vec<EntityId>,
    #[serde(default)]
    pub supply_requests: Vec<EntityId>,
    #[serde(default)]
    pub physical_rights: Vec<EntityId>,
    pub created_at: u64,
    pub updated_at: u64,
    pub provenance: BlockProvenance,
}

impl_entity!(CompositeResource, EntityKind::CompositeResource);

impl CompositeResource {
    pub fn new(
        kind: ResourceKind,
        contract: Address,
        token_id: U256,
        authority: EntityId,
        provenance: BlockProvenance,
    ) -> Self {
        Self {
            id: keys::resource(&contract, &token_id),
            kind,
            contract,
            token_id,
            authority,
            owner: Address::zero(),
            status: ResourceStatus::Created,
            digital_price: Amount::zero(),
            physical_price: Amount::zero(),
            accumulated_digital_price: Amount::zero(),
            accumulated_physical_price: Amount::zero(),
            uri: String::new(),
            metadata: None,
            usage_count: U256::zero(),
            supply_count: U256::zero(),
            current_physical_editions: U256::zero(),
            references: Vec::new(),
            all_nested_refs: Vec::new(),
            authorized_targets: Vec::new(),
            authorized_children: Vec::new(),
            request_history: Vec::new(),
            supply_requests: Vec::new(),
            physical_rights: Vec::new(),
            created_at: provenance.block_timestamp,
            updated_at: provenance.block_timestamp,
            provenance,
        }
    }

    pub fn base_price(&self, is_physical: bool) -> Amount {
        if is_physical {
            self.physical_price
        } else {
            self.digital_price
        }
    }
}

// =============================================================================
// AUTHORIZATION REQUEST
// =============================================================================

/// Approval workflow record for one resource against one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub id: EntityId,
    pub resource: EntityId,
    pub target: EntityId,
    pub target_kind: TargetKind,
    pub target_contract: Address,
    pub is_physical: bool,
    pub state: RequestState,
    pub requested_amount: Amount,
    pub approved_amount: Amount,
    pub timestamp: u64,
    pub provenance: BlockProvenance,
}

impl_entity!(AuthorizationRequest, EntityKind::AuthorizationRequest);

// =============================================================================
// CONTRACTS
// =============================================================================

/// Maps an emitting contract address to its authority and kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractBinding {
    pub id: EntityId,
    pub contract: Address,
    pub authority: EntityId,
    pub kind: ContractKind,
}

impl_entity!(ContractBinding, EntityKind::ContractBinding);

impl ContractBinding {
    pub fn new(contract: Address, authority: EntityId, kind: ContractKind) -> Self {
        Self {
            id: keys::binding(&contract),
            contract,
            authority,
            kind,
        }
    }
}

/// A contract reference held in an authority's lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub id: EntityId,
    pub authority: EntityId,
    pub kind: ContractKind,
    pub address: Address,
    pub deployer: Address,
    /// Composite resources minted under this contract.
    #[serde(default)]
    pub members: Vec<EntityId>,
    pub provenance: BlockProvenance,
}

impl_entity!(DeployedContract, EntityKind::DeployedContract);

// =============================================================================
// SUPPLY COORDINATION
// =============================================================================

/// A parent design's request for supply of one child position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyRequest {
    pub id: EntityId,
    pub coordination: Address,
    pub position_id: U256,
    pub parent: EntityId,
    pub quantity: Amount,
    pub preferred_max_price: Amount,
    pub deadline: u64,
    pub is_physical: bool,
    pub paid: bool,
    pub matched_child: Option<EntityId>,
    pub matched_supplier: Option<Address>,
    #[serde(default)]
    pub proposals: Vec<EntityId>,
    pub provenance: BlockProvenance,
}

impl_entity!(SupplyRequest, EntityKind::SupplyRequest);

/// A supplier's offer of a child against a supply request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierProposal {
    pub id: EntityId,
    pub supply_request: EntityId,
    pub supplier: Address,
    pub child: EntityId,
    pub child_contract: Address,
    pub child_id: U256,
    pub price: Amount,
    pub is_active: bool,
    pub provenance: BlockProvenance,
}

impl_entity!(SupplierProposal, EntityKind::SupplierProposal);

// =============================================================================
// SALES
// =============================================================================

/// Physical editions of a resource a buyer is owed from one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalRights {
    pub id: EntityId,
    pub resource: EntityId,
    pub token_id: U256,
    pub buyer: Address,
    pub market: Address,
    pub guaranteed_amount: Amount,
    pub non_guaranteed_amount: Amount,
    /// Position of the last mint folded into the amounts. Mints at or
    /// before it are replays.
    pub last_mint: EventPosition,
    pub provenance: BlockProvenance,
}

impl_entity!(PhysicalRights, EntityKind::PhysicalRights);

/// One resource bought in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub contract: Address,
    pub token_id: U256,
    pub amount: Amount,
}

impl OrderLine {
    pub fn resource_id(&self) -> EntityId {
        keys::resource(&self.contract, &self.token_id)
    }
}

/// An executed market order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: EntityId,
    pub order_id: U256,
    pub market: Address,
    pub buyer: Address,
    pub total_payments: Amount,
    pub status: u8,
    pub is_physical: bool,
    pub fulfillment_data: String,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
    #[serde(default)]
    pub payments: Vec<EntityId>,
    pub provenance: BlockProvenance,
}

impl_entity!(Order, EntityKind::Order);

/// One recipient's share of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: EntityId,
    pub order: EntityId,
    pub recipient: Address,
    pub fulfiller_id: U256,
    pub amount: Amount,
    pub payment_type: u8,
}

impl_entity!(Payment, EntityKind::Payment);
