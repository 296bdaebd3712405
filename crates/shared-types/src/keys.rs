//! # Deterministic Key Construction
//!
//! Every persisted entity is keyed by a `"-"`-joined concatenation of
//! ledger-native identifiers in a fixed field order. Downstream queries join
//! on these keys, so any change here is a breaking change.
//!
//! | Entity | Key |
//! |--------|-----|
//! | Authority | `0x<infraId>` |
//! | Principal | `<authority>-<address>` |
//! | DeployedContract | `<authority>-<contract>` |
//! | ContractBinding | `<contract>` |
//! | CompositeResource | `<contract>-<tokenId>` |
//! | AuthorizationRequest | `<resource>-<target>-<targetContract>-<physical\|digital>` |
//! | SupplyRequest | `<coordination>-<positionId>` |
//! | SupplierProposal | `<supplyRequest>-<supplier>-<childContract>-<childId>` |
//! | PhysicalRights | `<resource>-<buyer>-<market>` |
//! | Order | `<market>-<orderId>` |
//! | Payment | `<order>-<index>` |
//! | GlobalRegistry | `global` |
//!
//! Addresses and infrastructure ids render as `0x`-prefixed lowercase hex;
//! token and position ids render as decimal.

use crate::entities::{Address, EntityId, InfraId, U256};

/// Key of the singleton registry of all authorities and principals.
pub const REGISTRY_KEY: &str = "global";

/// Separator between key segments.
pub const SEPARATOR: &str = "-";

/// `0x`-prefixed lowercase hex rendering of an address.
pub fn hex_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// `0x`-prefixed lowercase hex rendering of an infrastructure id.
pub fn hex_infra(infra_id: &InfraId) -> String {
    format!("0x{}", hex::encode(infra_id.as_bytes()))
}

fn join(segments: &[&str]) -> EntityId {
    EntityId::new(segments.join(SEPARATOR))
}

pub fn registry() -> EntityId {
    EntityId::from(REGISTRY_KEY)
}

pub fn authority(infra_id: &InfraId) -> EntityId {
    EntityId::new(hex_infra(infra_id))
}

/// Principal enrollment: `authority-address`.
pub fn principal(authority: &EntityId, address: &Address) -> EntityId {
    join(&[authority.as_str(), &hex_address(address)])
}

/// Contract reference held in authority lists: `authority-contract`.
pub fn deployed_contract(authority: &EntityId, contract: &Address) -> EntityId {
    join(&[authority.as_str(), &hex_address(contract)])
}

/// Emitting-contract binding: the contract address alone.
pub fn binding(contract: &Address) -> EntityId {
    EntityId::new(hex_address(contract))
}

/// Composite resource: `contract-tokenId`.
pub fn resource(contract: &Address, token_id: &U256) -> EntityId {
    join(&[&hex_address(contract), &token_id.to_string()])
}

/// Authorization request: `resource-target-targetContract-flag`.
pub fn request(
    resource: &EntityId,
    target: &EntityId,
    target_contract: &Address,
    is_physical: bool,
) -> EntityId {
    let flag = if is_physical { "physical" } else { "digital" };
    join(&[
        resource.as_str(),
        target.as_str(),
        &hex_address(target_contract),
        flag,
    ])
}

/// Supply request: `coordination-positionId`.
pub fn supply_request(coordination: &Address, position_id: &U256) -> EntityId {
    join(&[&hex_address(coordination), &position_id.to_string()])
}

/// Supplier proposal: `supplyRequest-supplier-childContract-childId`.
pub fn supplier_proposal(
    supply_request: &EntityId,
    supplier: &Address,
    child_contract: &Address,
    child_id: &U256,
) -> EntityId {
    join(&[
        supply_request.as_str(),
        &hex_address(supplier),
        &hex_address(child_contract),
        &child_id.to_string(),
    ])
}

/// Physical rights of one buyer to one resource bought through one market.
pub fn physical_rights(resource: &EntityId, buyer: &Address, market: &Address) -> EntityId {
    join(&[resource.as_str(), &hex_address(buyer), &hex_address(market)])
}

/// Market order: `market-orderId`.
pub fn order(market: &Address, order_id: &U256) -> EntityId {
    join(&[&hex_address(market), &order_id.to_string()])
}

/// Payment line of an order, by position in the receipt.
pub fn payment(order: &EntityId, index: usize) -> EntityId {
    join(&[order.as_str(), &index.to_string()])
}
