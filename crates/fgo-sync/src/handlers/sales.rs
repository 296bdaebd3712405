use super::{skipped, HandlerContext};
use crate::domain::entities::{CompositeResource, Order, Payment, PhysicalRights, Principal};
use crate::domain::errors::StoreError;
use crate::domain::registry;
use crate::domain::relationships::insert_unique;
use crate::domain::value_objects::{ContractKind, ResourceKind, Role};
use crate::events::LedgerEvent;
use crate::ports::inbound::{ApplyOutcome, SkipReason};
use crate::ports::outbound::{EntityStoreExt, OrderReceipt};
use shared_types::{keys, Address, Amount, EntityId, U256};
use tracing::{debug, info, warn};

/// Re-reads edition counts and, for physical sales, adds the minted amount
/// to the buyer's rights from that market.
pub(super) fn child_minted(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    token_id: &U256,
    amount: &Amount,
    buyer: &Address,
    market: &Address,
    is_physical: bool,
) -> Result<ApplyOutcome, StoreError> {
    let id = event.resource_id(token_id);
    let Some(mut resource) = ctx.store.load::<CompositeResource>(&id)? else {
        return skipped(SkipReason::MissingEntity);
    };
    if resource.kind == ResourceKind::Parent {
        return skipped(SkipReason::NotApplicable);
    }

    let rights = if is_physical {
        let rights_id = keys::physical_rights(&id, buyer, market);
        match ctx.store.load::<PhysicalRights>(&rights_id)? {
            Some(existing) if existing.last_mint >= event.position() => {
                debug!(rights = %rights_id, position = %event.position(), "Mint already counted");
                return skipped(SkipReason::Unchanged);
            }
            Some(mut existing) => {
                existing.guaranteed_amount = existing.guaranteed_amount.saturating_add(*amount);
                existing.last_mint = event.position();
                existing.provenance = event.provenance();
                Some(existing)
            }
            None => Some(PhysicalRights {
                id: rights_id,
                resource: id.clone(),
                token_id: *token_id,
                buyer: *buyer,
                market: *market,
                guaranteed_amount: *amount,
                non_guaranteed_amount: Amount::zero(),
                last_mint: event.position(),
                provenance: event.provenance(),
            }),
        }
    } else {
        None
    };

    let before = resource.clone();
    match ctx.ledger.resource(event.contract, *token_id) {
        Ok(state) => {
            resource.supply_count = state.supply_count;
            resource.current_physical_editions = state.current_physical_editions;
        }
        Err(e) => warn!(resource = %id, error = %e, "Edition read failed, keeping stored counts"),
    }
    if let Some(rights) = &rights {
        insert_unique(&mut resource.physical_rights, &rights.id);
        ctx.store.save(rights)?;
    }
    if rights.is_none() && resource == before {
        return skipped(SkipReason::Unchanged);
    }

    resource.updated_at = event.block_timestamp;
    resource.provenance = event.provenance();
    ctx.store.save(&resource)?;
    debug!(
        resource = %id,
        supply = %resource.supply_count,
        physical = %resource.current_physical_editions,
        is_physical,
        "Child minted"
    );
    Ok(ApplyOutcome::Applied)
}

/// Records each order from its receipt and lists it on every fulfiller
/// the receipt pays.
pub(super) fn order_executed(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    buyer: &Address,
    order_ids: &[U256],
    total_payments: &Amount,
) -> Result<ApplyOutcome, StoreError> {
    let Some(binding) = ctx.binding(&event.contract)? else {
        return skipped(SkipReason::UnboundContract);
    };
    if binding.kind != ContractKind::Market {
        return skipped(SkipReason::NotApplicable);
    }
    if order_ids.is_empty() {
        return skipped(SkipReason::Unchanged);
    }

    let (registry, _) = registry::load_or_create(&*ctx.store)?;
    let fulfillers = registry.principals(Role::Fulfiller);

    for order_id in order_ids {
        let id = keys::order(&event.contract, order_id);
        let receipt = ctx
            .ledger
            .order_receipt(event.contract, *order_id)
            .unwrap_or_else(|e| {
                warn!(order = %id, error = %e, "Receipt read failed, recording order without lines");
                OrderReceipt::default()
            });

        let mut payments = Vec::with_capacity(receipt.payments.len());
        for (index, share) in receipt.payments.iter().enumerate() {
            let payment = Payment {
                id: keys::payment(&id, index),
                order: id.clone(),
                recipient: share.recipient,
                fulfiller_id: share.fulfiller_id,
                amount: share.amount,
                payment_type: share.payment_type,
            };
            ctx.store.save(&payment)?;
            credit_fulfillers(ctx, fulfillers, &share.recipient, &id)?;
            payments.push(payment.id);
        }

        ctx.store.save(&Order {
            id,
            order_id: *order_id,
            market: event.contract,
            buyer: *buyer,
            total_payments: *total_payments,
            status: receipt.status,
            is_physical: receipt.is_physical,
            fulfillment_data: receipt.fulfillment_data,
            lines: receipt.lines,
            payments,
            provenance: event.provenance(),
        })?;
    }

    info!(
        market = %keys::hex_address(&event.contract),
        buyer = %keys::hex_address(buyer),
        orders = order_ids.len(),
        "Order executed"
    );
    Ok(ApplyOutcome::Applied)
}

/// A recipient may be registered as a fulfiller at several authorities.
fn credit_fulfillers(
    ctx: &mut HandlerContext<'_>,
    fulfillers: &[EntityId],
    recipient: &Address,
    order: &EntityId,
) -> Result<(), StoreError> {
    for principal_id in fulfillers {
        let Some(mut principal) = ctx.store.load::<Principal>(principal_id)? else {
            continue;
        };
        if principal.address == *recipient && insert_unique(&mut principal.orders, order) {
            ctx.store.save(&principal)?;
        }
    }
    Ok(())
}
