pub mod authorization;
pub mod entities;
pub mod errors;
pub mod gating;
pub mod metadata;
pub mod registry;
pub mod relationships;
pub mod resolver;
pub mod value_objects;

pub use authorization::{RequestDraft, TransitionOutcome};
pub use entities::*;
pub use errors::*;
pub use gating::GateOutcome;
pub use relationships::MembershipChange;
pub use resolver::{ReferenceResolver, ReferenceSource, Resolution, TraversalGuard, Truncation, TruncationReason};
pub use value_objects::*;
