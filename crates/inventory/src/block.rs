use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hotelsupply_contracts::ContractId;
use hotelsupply_core::{AggregateId, DateRange, DomainError, DomainResult, Entity};

/// Inventory block identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryBlockId(pub AggregateId);

impl InventoryBlockId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InventoryBlockId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Identifier of a committed reservation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(pub Uuid);

impl ReservationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Capacity allocation for one room type over a date range, owned by a contract.
///
/// Invariants: `consumed_on(d) <= capacity` for every date `d` in `range`, and
/// `consumed_on(d)` equals the sum of what the outstanding reservations hold on `d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryBlock {
    id: InventoryBlockId,
    contract_id: ContractId,
    room_type: String,
    range: DateRange,
    capacity: u32,
    consumed: BTreeMap<NaiveDate, u32>,
    holds: BTreeMap<ReservationId, BTreeMap<NaiveDate, u32>>,
}

impl InventoryBlock {
    pub fn new(
        id: InventoryBlockId,
        contract_id: ContractId,
        room_type: impl Into<String>,
        range: DateRange,
        capacity: u32,
    ) -> DomainResult<Self> {
        let room_type = room_type.into();
        if room_type.trim().is_empty() {
            return Err(DomainError::validation("room_type cannot be empty"));
        }
        Ok(Self {
            id,
            contract_id,
            room_type,
            range,
            capacity,
            consumed: BTreeMap::new(),
            holds: BTreeMap::new(),
        })
    }

    pub fn id_typed(&self) -> InventoryBlockId {
        self.id
    }

    pub fn contract_id(&self) -> ContractId {
        self.contract_id
    }

    pub fn room_type(&self) -> &str {
        &self.room_type
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.range.contains(date)
    }

    /// Matches when no room type filter is given.
    pub fn matches_room_type(&self, room_type: Option<&str>) -> bool {
        room_type.map_or(true, |rt| self.room_type == rt)
    }

    /// Capacity on `date` (zero outside the block's range).
    pub fn capacity_on(&self, date: NaiveDate) -> u32 {
        if self.covers(date) { self.capacity } else { 0 }
    }

    pub fn consumed_on(&self, date: NaiveDate) -> u32 {
        self.consumed.get(&date).copied().unwrap_or(0)
    }

    pub fn free_on(&self, date: NaiveDate) -> u32 {
        self.capacity_on(date).saturating_sub(self.consumed_on(date))
    }

    /// Rooms `reservation` still holds on `date`.
    pub fn held_by(&self, reservation: ReservationId, date: NaiveDate) -> u32 {
        self.holds
            .get(&reservation)
            .and_then(|dates| dates.get(&date))
            .copied()
            .unwrap_or(0)
    }

    /// Whether `reservation` holds any room in this block.
    pub fn is_held_by(&self, reservation: ReservationId) -> bool {
        self.holds.contains_key(&reservation)
    }

    /// Consume `quantity` rooms on `date` on behalf of `reservation`.
    pub fn reserve(
        &mut self,
        reservation: ReservationId,
        date: NaiveDate,
        quantity: u32,
    ) -> DomainResult<()> {
        if !self.covers(date) {
            return Err(DomainError::invariant(format!(
                "block {} does not cover {date}",
                self.id
            )));
        }
        let free = self.free_on(date);
        if quantity > free {
            return Err(DomainError::invariant(format!(
                "block {} would exceed capacity on {date} (free {free}, requested {quantity})",
                self.id
            )));
        }
        *self.consumed.entry(date).or_insert(0) += quantity;
        *self
            .holds
            .entry(reservation)
            .or_default()
            .entry(date)
            .or_insert(0) += quantity;
        Ok(())
    }

    /// Return `quantity` rooms that `reservation` holds on `date`.
    ///
    /// Only rooms the reservation still holds can be returned, so a released
    /// reservation cannot free capacity taken by another one.
    pub fn release(
        &mut self,
        reservation: ReservationId,
        date: NaiveDate,
        quantity: u32,
    ) -> DomainResult<()> {
        let held = self.held_by(reservation, date);
        if quantity > held {
            return Err(DomainError::invariant(format!(
                "reservation {reservation} holds {held} on {date} in block {}, cannot release {quantity}",
                self.id
            )));
        }

        decrement(&mut self.consumed, date, quantity);
        if let Some(dates) = self.holds.get_mut(&reservation) {
            decrement(dates, date, quantity);
            if dates.is_empty() {
                self.holds.remove(&reservation);
            }
        }
        Ok(())
    }
}

fn decrement(counts: &mut BTreeMap<NaiveDate, u32>, date: NaiveDate, quantity: u32) {
    if let Some(count) = counts.get_mut(&date) {
        *count = count.saturating_sub(quantity);
        if *count == 0 {
            counts.remove(&date);
        }
    }
}

impl Entity for InventoryBlock {
    type Id = InventoryBlockId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn test_contract_id() -> ContractId {
        ContractId::new(AggregateId::new())
    }

    pub(crate) fn block(first: NaiveDate, last: NaiveDate, capacity: u32) -> InventoryBlock {
        InventoryBlock::new(
            InventoryBlockId::new(AggregateId::new()),
            test_contract_id(),
            "double",
            DateRange::inclusive(first, last).unwrap(),
            capacity,
        )
        .unwrap()
    }

    #[test]
    fn capacity_is_zero_outside_range() {
        let b = block(date(2024, 7, 1), date(2024, 7, 5), 10);
        assert_eq!(b.capacity_on(date(2024, 7, 5)), 10);
        assert_eq!(b.capacity_on(date(2024, 7, 6)), 0);
        assert_eq!(b.free_on(date(2024, 6, 30)), 0);
    }

    #[test]
    fn reserve_and_release_track_consumption() {
        let mut b = block(date(2024, 7, 1), date(2024, 7, 5), 10);
        let d = date(2024, 7, 2);
        let r = ReservationId::new();

        b.reserve(r, d, 8).unwrap();
        assert_eq!(b.consumed_on(d), 8);
        assert_eq!(b.free_on(d), 2);
        assert_eq!(b.held_by(r, d), 8);

        b.release(r, d, 8).unwrap();
        assert!(!b.is_held_by(r));
        assert_eq!(b.consumed_on(d), 0);
        assert_eq!(b, block_like(&b));
    }

    fn block_like(b: &InventoryBlock) -> InventoryBlock {
        InventoryBlock::new(
            b.id_typed(),
            b.contract_id(),
            b.room_type(),
            b.range(),
            b.capacity(),
        )
        .unwrap()
    }

    #[test]
    fn reserve_never_exceeds_capacity() {
        let mut b = block(date(2024, 7, 1), date(2024, 7, 5), 10);
        let d = date(2024, 7, 1);
        b.reserve(ReservationId::new(), d, 10).unwrap();

        let err = b.reserve(ReservationId::new(), d, 1).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(b.consumed_on(d), 10);
    }

    #[test]
    fn reserve_outside_range_is_rejected() {
        let mut b = block(date(2024, 7, 1), date(2024, 7, 5), 10);
        assert!(b.reserve(ReservationId::new(), date(2024, 7, 6), 1).is_err());
    }

    #[test]
    fn release_more_than_consumed_is_rejected() {
        let mut b = block(date(2024, 7, 1), date(2024, 7, 5), 10);
        let d = date(2024, 7, 3);
        let r = ReservationId::new();
        b.reserve(r, d, 2).unwrap();
        assert!(b.release(r, d, 3).is_err());
        assert_eq!(b.consumed_on(d), 2);
    }

    #[test]
    fn release_only_returns_rooms_the_reservation_holds() {
        let mut b = block(date(2024, 7, 1), date(2024, 7, 5), 2);
        let d = date(2024, 7, 1);
        let first = ReservationId::new();
        let second = ReservationId::new();

        b.reserve(first, d, 2).unwrap();
        b.release(first, d, 2).unwrap();
        b.reserve(second, d, 2).unwrap();

        let err = b.release(first, d, 2).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(b.consumed_on(d), 2);
        assert_eq!(b.held_by(second, d), 2);
        assert_eq!(b.free_on(d), 0);
    }

    #[test]
    fn room_type_filter() {
        let b = block(date(2024, 7, 1), date(2024, 7, 5), 10);
        assert!(b.matches_room_type(None));
        assert!(b.matches_room_type(Some("double")));
        assert!(!b.matches_room_type(Some("suite")));
    }

    #[test]
    fn blank_room_type_is_rejected() {
        let err = InventoryBlock::new(
            InventoryBlockId::new(AggregateId::new()),
            test_contract_id(),
            " ",
            DateRange::inclusive(date(2024, 7, 1), date(2024, 7, 1)).unwrap(),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
