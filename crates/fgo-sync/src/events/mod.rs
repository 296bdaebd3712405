//! # Ledger Events
//!
//! The inbound event contract: a typed payload plus the position and
//! provenance of the log that emitted it.
//!
//! ## Families
//!
//! - **Infrastructure**: `InfrastructureDeployed`, `ContractDeployed`,
//!   `GatingToggled`, `MemberAdded`, `MemberRemoved`
//! - **Principals**: `PrincipalCreated`, `PrincipalUpdated`,
//!   `WalletTransferred`, `PrincipalStatusChanged`
//! - **Resources**: `ResourceCreated`, `ResourceUpdated`,
//!   `ResourceStatusChanged`, `ResourceUsageChanged`, `ResourceDeleted`
//! - **Authorization**: `AuthorizationRequested`, `AuthorizationApproved`,
//!   `AuthorizationRejected`, `AuthorizationRevoked`
//! - **Supply**: `SupplyRequestRegistered`, `ProposalSubmitted`,
//!   `ProposalCancelled`, `SupplyRequestPaid`, `ExpiredSupplyReleased`
//! - **Sales**: `ChildMinted`, `OrderExecuted`

pub mod payloads;

pub use payloads::*;
