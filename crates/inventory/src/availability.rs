//! Availability checking and all-or-nothing reservation over inventory blocks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use hotelsupply_core::{DateRange, DomainError, DomainResult};

use crate::block::{InventoryBlock, InventoryBlockId, ReservationId};
use crate::error::{InsufficientInventory, InventoryError};
use crate::request::AvailabilityRequest;

/// Rooms taken from one block on one date.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub block_id: InventoryBlockId,
    pub date: NaiveDate,
    pub quantity: u32,
}

/// Allocations decided for a request, not yet applied to any block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    request: AvailabilityRequest,
    allocations: Vec<Allocation>,
}

/// Confirmation of capacity reserved for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    request: AvailabilityRequest,
    allocations: Vec<Allocation>,
}

impl Reservation {
    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn request(&self) -> &AvailabilityRequest {
        &self.request
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// Total rooms reserved on `date` across blocks.
    pub fn quantity_on(&self, date: NaiveDate) -> u32 {
        self.allocations
            .iter()
            .filter(|a| a.date == date)
            .map(|a| a.quantity)
            .sum()
    }
}

/// Per-date capacity summary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAvailability {
    pub date: NaiveDate,
    pub capacity: u32,
    pub consumed: u32,
    pub free: u32,
}

/// Decide which blocks serve each date of `request`, without touching them.
///
/// Dates are checked in ascending order and planning stops at the first date whose
/// summed free capacity is below the requested quantity. Each date is filled from
/// the blocks in slice order.
pub fn plan_allocation(
    blocks: &[InventoryBlock],
    request: &AvailabilityRequest,
) -> Result<AllocationPlan, InsufficientInventory> {
    let quantity = request.quantity();
    let mut allocations = Vec::new();

    for date in request.range().days() {
        let covering: Vec<&InventoryBlock> = blocks
            .iter()
            .filter(|b| b.matches_room_type(request.room_type()) && b.covers(date))
            .collect();

        let available = covering
            .iter()
            .fold(0u32, |acc, b| acc.saturating_add(b.free_on(date)));
        if available < quantity {
            return Err(InsufficientInventory::new(date, quantity, available));
        }

        let mut remaining = quantity;
        for block in covering {
            if remaining == 0 {
                break;
            }
            let take = block.free_on(date).min(remaining);
            if take > 0 {
                allocations.push(Allocation {
                    block_id: block.id_typed(),
                    date,
                    quantity: take,
                });
                remaining -= take;
            }
        }
    }

    Ok(AllocationPlan {
        request: request.clone(),
        allocations,
    })
}

impl AllocationPlan {
    pub fn request(&self) -> &AvailabilityRequest {
        &self.request
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// Apply every allocation or none.
    ///
    /// Fails with an invariant violation, leaving `blocks` untouched, when the blocks
    /// changed since planning in a way that no longer fits the plan.
    pub fn apply(self, blocks: &mut [InventoryBlock]) -> Result<Reservation, DomainError> {
        let id = ReservationId::new();
        transact(blocks, |staged| {
            for allocation in &self.allocations {
                find_block(staged, allocation.block_id)?.reserve(
                    id,
                    allocation.date,
                    allocation.quantity,
                )?;
            }
            Ok(())
        })?;

        Ok(Reservation {
            id,
            request: self.request,
            allocations: self.allocations,
        })
    }
}

/// Check that every date of `request` has enough free capacity and reserve it.
///
/// On failure no consumed counter changes.
pub fn check_availability(
    blocks: &mut [InventoryBlock],
    request: &AvailabilityRequest,
) -> Result<Reservation, InventoryError> {
    let plan = plan_allocation(blocks, request)?;
    Ok(plan.apply(blocks)?)
}

/// Return the capacity held by `reservation`. All-or-nothing.
///
/// Fails with an invariant violation when the blocks no longer record the reservation
/// (already released, or never applied to these blocks).
pub fn release(blocks: &mut [InventoryBlock], reservation: &Reservation) -> DomainResult<()> {
    if !blocks.iter().any(|b| b.is_held_by(reservation.id())) {
        return Err(DomainError::invariant(format!(
            "reservation {} is not outstanding",
            reservation.id()
        )));
    }
    transact(blocks, |staged| {
        for allocation in reservation.allocations() {
            find_block(staged, allocation.block_id)?.release(
                reservation.id(),
                allocation.date,
                allocation.quantity,
            )?;
        }
        Ok(())
    })
}

/// Capacity, consumption and free rooms for every date of `range`.
pub fn daily_availability(
    blocks: &[InventoryBlock],
    range: DateRange,
    room_type: Option<&str>,
) -> Vec<DailyAvailability> {
    range
        .days()
        .map(|date| {
            let (capacity, consumed) = blocks
                .iter()
                .filter(|b| b.matches_room_type(room_type))
                .fold((0u32, 0u32), |(cap, used), b| {
                    (
                        cap.saturating_add(b.capacity_on(date)),
                        used.saturating_add(b.consumed_on(date)),
                    )
                });
            DailyAvailability {
                date,
                capacity,
                consumed,
                free: capacity.saturating_sub(consumed),
            }
        })
        .collect()
}

fn find_block(
    blocks: &mut [InventoryBlock],
    id: InventoryBlockId,
) -> DomainResult<&mut InventoryBlock> {
    blocks
        .iter_mut()
        .find(|b| b.id_typed() == id)
        .ok_or_else(|| DomainError::invariant(format!("block {id} is not part of this set")))
}

/// Run `f` against a staged copy and only write it back when every step succeeded.
fn transact<F>(blocks: &mut [InventoryBlock], f: F) -> DomainResult<()>
where
    F: FnOnce(&mut [InventoryBlock]) -> DomainResult<()>,
{
    let mut staged = blocks.to_vec();
    f(&mut staged)?;
    blocks.clone_from_slice(&staged);
    Ok(())
}
