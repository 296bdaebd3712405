use crate::domain::value_objects::{BlockProvenance, ContractKind, Role, TargetKind};
use serde::{Deserialize, Serialize};
use shared_types::{keys, Address, Amount, EntityId, EventPosition, InfraId, TxHash, U256};

/// One decoded ledger log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub kind: EventKind,
    /// Contract that emitted the log.
    pub contract: Address,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub transaction_hash: TxHash,
    pub log_index: u32,
}

impl LedgerEvent {
    pub fn position(&self) -> EventPosition {
        EventPosition::new(self.block_number, self.log_index)
    }

    pub fn provenance(&self) -> BlockProvenance {
        BlockProvenance {
            block_number: self.block_number,
            block_timestamp: self.block_timestamp,
            transaction_hash: self.transaction_hash,
        }
    }

    /// Id of the composite `token_id` minted by the emitting contract.
    pub fn resource_id(&self, token_id: &U256) -> EntityId {
        keys::resource(&self.contract, token_id)
    }
}

/// Identifies the target side of an authorization request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSubject {
    /// Token on the emitting contract asking for approval.
    pub token_id: U256,
    pub target_kind: TargetKind,
    pub target_contract: Address,
    /// Absent for market targets.
    #[serde(default)]
    pub target_token_id: Option<U256>,
    #[serde(default)]
    pub is_physical: bool,
}

impl AuthorizationSubject {
    /// Markets are keyed by contract, everything else by resource key.
    pub fn target_id(&self) -> EntityId {
        match (self.target_kind, &self.target_token_id) {
            (TargetKind::Market, _) | (_, None) => keys::binding(&self.target_contract),
            (_, Some(token_id)) => keys::resource(&self.target_contract, token_id),
        }
    }
}

/// Identifies one supplier proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRef {
    pub position_id: U256,
    pub supplier: Address,
    pub child_contract: Address,
    pub child_id: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Emitted by the factory; `contract` is the factory.
    InfrastructureDeployed {
        infra_id: InfraId,
        deployer: Address,
        access_control: Address,
        designers_contract: Address,
        suppliers_contract: Address,
        fulfillers_contract: Address,
    },
    ContractDeployed {
        infra_id: InfraId,
        contract_kind: ContractKind,
        deployed: Address,
        deployer: Address,
    },
    /// Emitted by an access-control contract.
    GatingToggled { role: Role, is_gated: bool },
    MemberAdded { role: Role, member: Address },
    MemberRemoved { role: Role, member: Address },

    /// Emitted by a role-registry contract.
    PrincipalCreated { principal: Address, profile_id: U256 },
    PrincipalUpdated { principal: Address },
    WalletTransferred { old_address: Address, new_address: Address },
    PrincipalStatusChanged { principal: Address, is_active: bool },

    /// Emitted by a parent, child or template contract.
    ResourceCreated { token_id: U256 },
    ResourceUpdated { token_id: U256 },
    ResourceStatusChanged { token_id: U256 },
    ResourceUsageChanged { token_id: U256, usage_count: U256 },
    ResourceDeleted { token_id: U256 },

    AuthorizationRequested { subject: AuthorizationSubject },
    AuthorizationApproved { subject: AuthorizationSubject, approved_amount: Amount },
    AuthorizationRejected { subject: AuthorizationSubject },
    AuthorizationRevoked { subject: AuthorizationSubject },

    /// Emitted by a supply-coordination contract.
    SupplyRequestRegistered { position_id: U256 },
    ProposalSubmitted { proposal: ProposalRef, price: Amount },
    ProposalCancelled { proposal: ProposalRef },
    SupplyRequestPaid { position_id: U256 },
    ExpiredSupplyReleased { proposal: ProposalRef },

    /// Emitted by a child or template contract when editions are sold.
    ChildMinted {
        token_id: U256,
        amount: Amount,
        buyer: Address,
        market: Address,
        #[serde(default)]
        is_physical: bool,
    },
    /// Emitted by a market contract.
    OrderExecuted {
        buyer: Address,
        order_ids: Vec<U256>,
        total_payments: Amount,
    },
}

impl EventKind {
    /// Stable name used in spans and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::InfrastructureDeployed { .. } => "infrastructure_deployed",
            EventKind::ContractDeployed { .. } => "contract_deployed",
            EventKind::GatingToggled { .. } => "gating_toggled",
            EventKind::MemberAdded { .. } => "member_added",
            EventKind::MemberRemoved { .. } => "member_removed",
            EventKind::PrincipalCreated { .. } => "principal_created",
            EventKind::PrincipalUpdated { .. } => "principal_updated",
            EventKind::WalletTransferred { .. } => "wallet_transferred",
            EventKind::PrincipalStatusChanged { .. } => "principal_status_changed",
            EventKind::ResourceCreated { .. } => "resource_created",
            EventKind::ResourceUpdated { .. } => "resource_updated",
            EventKind::ResourceStatusChanged { .. } => "resource_status_changed",
            EventKind::ResourceUsageChanged { .. } => "resource_usage_changed",
            EventKind::ResourceDeleted { .. } => "resource_deleted",
            EventKind::AuthorizationRequested { .. } => "authorization_requested",
            EventKind::AuthorizationApproved { .. } => "authorization_approved",
            EventKind::AuthorizationRejected { .. } => "authorization_rejected",
            EventKind::AuthorizationRevoked { .. } => "authorization_revoked",
            EventKind::SupplyRequestRegistered { .. } => "supply_request_registered",
            EventKind::ProposalSubmitted { .. } => "proposal_submitted",
            EventKind::ProposalCancelled { .. } => "proposal_cancelled",
            EventKind::SupplyRequestPaid { .. } => "supply_request_paid",
            EventKind::ExpiredSupplyReleased { .. } => "expired_supply_released",
            EventKind::ChildMinted { .. } => "child_minted",
            EventKind::OrderExecuted { .. } => "order_executed",
        }
    }
}
