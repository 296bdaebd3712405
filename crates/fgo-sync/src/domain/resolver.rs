//! # Reference Resolver
//!
//! Flattens a composite resource's nested reference graph and accumulates
//! its price, in one read-only pre-order walk.
//!
//! ## Price
//!
//! ```text
//! accumulated(r, physical) = base_price(r, physical)
//!     + Σ unit_price(ref, physical) × ref.amount × multiplier
//! ```
//!
//! `multiplier` starts at 1 and is multiplied by `ref.amount` on every
//! descent, so a leaf used twice inside a composite used three times counts
//! six times.
//!
//! ## Malformed graphs
//!
//! The walk carries its current path in a [`TraversalGuard`]. A cycle edge is
//! skipped, a descent beyond the depth limit or into a missing composite is
//! cut, and arithmetic saturates at `U256::MAX`. Each case is logged at `warn`
//! and recorded as a [`Truncation`]; none aborts the event.
//!
//! Shared sub-composites are expanded once per use, so a DAG that fans out at
//! every level produces output exponential in its depth. A flattened-reference
//! budget ends the walk early once reached.

use super::entities::{CompositeResource, Reference};
use super::errors::StoreError;
use crate::ports::outbound::{EntityStore, EntityStoreExt};
use shared_types::{Amount, EntityId};
use tracing::warn;

/// Read access to composites, kept separate from writes.
pub trait ReferenceSource {
    fn composite(&self, id: &EntityId) -> Result<Option<CompositeResource>, StoreError>;
}

impl<S: EntityStore + ?Sized> ReferenceSource for S {
    fn composite(&self, id: &EntityId) -> Result<Option<CompositeResource>, StoreError> {
        self.load::<CompositeResource>(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationReason {
    Cycle,
    DepthExceeded,
    Unreachable,
    Overflow,
    BudgetExceeded,
}

/// A point where the walk stopped short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    pub at: EntityId,
    pub reason: TruncationReason,
    pub depth: usize,
}

/// The current root-to-node path of a walk.
#[derive(Debug, Clone)]
pub struct TraversalGuard {
    path: Vec<EntityId>,
    max_depth: usize,
}

impl TraversalGuard {
    pub fn new(root: &EntityId, max_depth: usize) -> Self {
        Self {
            path: vec![root.clone()],
            max_depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn on_path(&self, id: &EntityId) -> bool {
        self.path.contains(id)
    }

    pub fn can_descend(&self) -> bool {
        self.path.len() < self.max_depth
    }

    fn push(&mut self, id: &EntityId) {
        self.path.push(id.clone());
    }

    fn pop(&mut self) {
        self.path.pop();
    }
}

/// Output of one walk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    pub flattened: Vec<Reference>,
    pub accumulated_digital: Amount,
    pub accumulated_physical: Amount,
    pub truncations: Vec<Truncation>,
    exhausted: bool,
}

impl Resolution {
    pub fn accumulated(&self, is_physical: bool) -> Amount {
        if is_physical {
            self.accumulated_physical
        } else {
            self.accumulated_digital
        }
    }

    pub fn is_complete(&self) -> bool {
        self.truncations.is_empty()
    }

    fn truncate(&mut self, at: &EntityId, reason: TruncationReason, depth: usize) {
        warn!(at = %at, ?reason, depth, "Reference walk truncated");
        self.truncations.push(Truncation {
            at: at.clone(),
            reason,
            depth,
        });
    }

    fn add(&mut self, at: &EntityId, depth: usize, digital: Option<Amount>, physical: Option<Amount>) {
        let digital = digital.and_then(|d| self.accumulated_digital.checked_add(d));
        let physical = physical.and_then(|p| self.accumulated_physical.checked_add(p));
        if digital.is_none() || physical.is_none() {
            self.truncate(at, TruncationReason::Overflow, depth);
        }
        self.accumulated_digital = digital.unwrap_or(Amount::MAX);
        self.accumulated_physical = physical.unwrap_or(Amount::MAX);
    }
}

/// Walks composite reference graphs through a [`ReferenceSource`].
pub struct ReferenceResolver<'a, R: ReferenceSource + ?Sized> {
    source: &'a R,
    max_depth: usize,
    max_refs: usize,
}

impl<'a, R: ReferenceSource + ?Sized> ReferenceResolver<'a, R> {
    pub fn new(source: &'a R, max_depth: usize) -> Self {
        Self {
            source,
            max_depth,
            max_refs: usize::MAX,
        }
    }

    /// Stop the walk after `max_refs` references have been emitted.
    pub fn with_budget(mut self, max_refs: usize) -> Self {
        self.max_refs = max_refs;
        self
    }

    /// Flatten `root` and accumulate both prices.
    pub fn resolve(&self, root: &CompositeResource) -> Result<Resolution, StoreError> {
        let mut guard = TraversalGuard::new(&root.id, self.max_depth);
        let mut resolution = Resolution {
            accumulated_digital: root.digital_price,
            accumulated_physical: root.physical_price,
            ..Default::default()
        };
        self.walk(&root.references, Amount::one(), &mut guard, &mut resolution)?;
        Ok(resolution)
    }

    /// Pre-order list of every reachable reference.
    pub fn flatten(&self, root: &CompositeResource) -> Result<Vec<Reference>, StoreError> {
        Ok(self.resolve(root)?.flattened)
    }

    pub fn accumulated_price(
        &self,
        root: &CompositeResource,
        is_physical: bool,
    ) -> Result<Amount, StoreError> {
        Ok(self.resolve(root)?.accumulated(is_physical))
    }

    fn walk(
        &self,
        references: &[Reference],
        multiplier: Amount,
        guard: &mut TraversalGuard,
        resolution: &mut Resolution,
    ) -> Result<(), StoreError> {
        for reference in references {
            if resolution.exhausted {
                break;
            }
            let depth = guard.depth();
            if resolution.flattened.len() >= self.max_refs {
                resolution.truncate(&reference.target_id, TruncationReason::BudgetExceeded, depth);
                resolution.exhausted = true;
                break;
            }
            if reference.is_composite && guard.on_path(&reference.target_id) {
                resolution.truncate(&reference.target_id, TruncationReason::Cycle, depth);
                continue;
            }

            resolution.flattened.push(reference.clone());

            let scaled = multiplier.checked_mul(reference.amount);
            if scaled.is_none() {
                resolution.truncate(&reference.target_id, TruncationReason::Overflow, depth);
            }
            let scaled = scaled.unwrap_or(Amount::MAX);
            resolution.add(
                &reference.target_id,
                depth,
                reference.unit_price_digital.checked_mul(scaled),
                reference.unit_price_physical.checked_mul(scaled),
            );

            if !reference.is_composite {
                continue;
            }
            if !guard.can_descend() {
                resolution.truncate(&reference.target_id, TruncationReason::DepthExceeded, depth);
                continue;
            }
            let Some(nested) = self.source.composite(&reference.target_id)? else {
                resolution.truncate(&reference.target_id, TruncationReason::Unreachable, depth);
                continue;
            };

            guard.push(&nested.id);
            self.walk(&nested.references, scaled, guard, resolution)?;
            guard.pop();
        }
        Ok(())
    }
}
