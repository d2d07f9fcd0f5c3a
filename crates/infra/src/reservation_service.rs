//! Inventory reservation over persisted contracts and blocks.
//!
//! Every mutation runs under the owning contract's lock: load blocks at version `v`,
//! check and apply in memory, commit with `ExpectedVersion::Exact(v)`. A lost commit
//! (a writer outside this service) is replanned from fresh state up to the configured
//! retry limit. A failed check commits nothing.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

use hotelsupply_contracts::{Contract, ContractId, ContractStatus};
use hotelsupply_core::{AggregateId, DateRange, ExpectedVersion};
use hotelsupply_events::{EventBus, EventEnvelope};
use hotelsupply_inventory::{
    AvailabilityRequest, DailyAvailability, InventoryBlock, InventoryBlockId, InventoryError,
    Reservation, check_availability, daily_availability, release,
};

use crate::config::InfraConfig;
use crate::contract_service::{ContractService, check_status};
use crate::errors::ServiceError;
use crate::event_store::EventStore;
use crate::inventory_store::{InventoryStore, InventoryStoreError, VersionedBlocks};

pub const INVENTORY_AGGREGATE_TYPE: &str = "inventory";

/// Statuses in which blocks may be added to a contract.
const OPEN_STATUSES: [ContractStatus; 3] = [
    ContractStatus::Draft,
    ContractStatus::Active,
    ContractStatus::Suspended,
];

pub struct ReservationService<S, I, B> {
    contracts: Arc<ContractService<S, B>>,
    inventory: I,
    config: InfraConfig,
}

impl<S, I, B> ReservationService<S, I, B> {
    pub fn new(contracts: Arc<ContractService<S, B>>, inventory: I, config: InfraConfig) -> Self {
        Self {
            contracts,
            inventory,
            config,
        }
    }

    pub fn contracts(&self) -> &Arc<ContractService<S, B>> {
        &self.contracts
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }
}

impl<S, I, B> ReservationService<S, I, B>
where
    S: EventStore,
    I: InventoryStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Allocate a new block of rooms to a contract that is not terminated or expired.
    pub fn add_block(
        &self,
        contract_id: ContractId,
        room_type: impl Into<String>,
        range: DateRange,
        capacity: u32,
    ) -> Result<InventoryBlock, ServiceError> {
        let room_type = room_type.into();
        self.contracts.locks().with_lock(contract_id, || {
            let contract = self.contracts.load(contract_id)?;
            check_status(&contract, &OPEN_STATUSES, "add inventory block")?;
            ensure_within_term(&contract, range)?;

            let block = InventoryBlock::new(
                InventoryBlockId::new(AggregateId::new()),
                contract_id,
                room_type.clone(),
                range,
                capacity,
            )?;
            let (_, version) = self.commit_with_retry(contract_id, |blocks| {
                blocks.push(block.clone());
                Ok(())
            })?;

            tracing::info!(
                contract_id = %contract_id,
                block_id = %block.id_typed(),
                room_type = block.room_type(),
                range = %range,
                capacity,
                version,
                "inventory block added"
            );
            self.publish(
                contract_id,
                "inventory.block_added",
                version,
                &json!({
                    "block_id": block.id_typed(),
                    "room_type": block.room_type(),
                    "range": range,
                    "capacity": capacity,
                }),
            )?;
            Ok(block)
        })
    }

    /// Check availability for `request` and reserve it on an `Active` contract.
    pub fn reserve(
        &self,
        contract_id: ContractId,
        request: &AvailabilityRequest,
    ) -> Result<Reservation, ServiceError> {
        self.contracts.locks().with_lock(contract_id, || {
            let contract = self.contracts.load(contract_id)?;
            check_status(&contract, &[ContractStatus::Active], "reserve inventory")?;
            ensure_within_term(&contract, request.range())?;

            let (reservation, version) = self.commit_with_retry(contract_id, |blocks| {
                match check_availability(blocks, request) {
                    Ok(reservation) => Ok(reservation),
                    Err(InventoryError::Insufficient(e)) => {
                        tracing::warn!(
                            contract_id = %contract_id,
                            date = %e.date(),
                            requested = e.requested(),
                            available = e.available(),
                            "insufficient inventory"
                        );
                        Err(e.into())
                    }
                    Err(e) => Err(e.into()),
                }
            })?;

            tracing::info!(
                contract_id = %contract_id,
                reservation_id = %reservation.id(),
                range = %request.range(),
                quantity = request.quantity(),
                version,
                "inventory reserved"
            );
            self.publish(contract_id, "inventory.reserved", version, &reservation)?;
            Ok(reservation)
        })
    }

    /// Give back the capacity held by `reservation`, whatever the contract's status.
    pub fn release(
        &self,
        contract_id: ContractId,
        reservation: &Reservation,
    ) -> Result<(), ServiceError> {
        self.contracts.locks().with_lock(contract_id, || {
            self.contracts.load(contract_id)?;
            let (_, version) = self.commit_with_retry(contract_id, |blocks| {
                release(blocks, reservation).map_err(ServiceError::from)
            })?;

            tracing::info!(
                contract_id = %contract_id,
                reservation_id = %reservation.id(),
                version,
                "inventory released"
            );
            self.publish(contract_id, "inventory.released", version, reservation)
        })
    }

    /// Drop all blocks of a terminated or expired contract.
    pub fn retire_inventory(&self, contract_id: ContractId) -> Result<(), ServiceError> {
        self.contracts.locks().with_lock(contract_id, || {
            let contract = self.contracts.load(contract_id)?;
            check_status(
                &contract,
                &[ContractStatus::Terminated, ContractStatus::Expired],
                "retire inventory",
            )?;
            self.inventory.remove(contract_id)?;
            tracing::info!(contract_id = %contract_id, "inventory retired");
            Ok(())
        })
    }

    pub fn blocks(&self, contract_id: ContractId) -> Result<Vec<InventoryBlock>, ServiceError> {
        Ok(self.inventory.load(contract_id)?.blocks)
    }

    /// Per-date capacity report (read only).
    pub fn availability(
        &self,
        contract_id: ContractId,
        range: DateRange,
        room_type: Option<&str>,
    ) -> Result<Vec<DailyAvailability>, ServiceError> {
        let VersionedBlocks { blocks, .. } = self.inventory.load(contract_id)?;
        Ok(daily_availability(&blocks, range, room_type))
    }

    fn commit_with_retry<T, F>(
        &self,
        contract_id: ContractId,
        mut mutate: F,
    ) -> Result<(T, u64), ServiceError>
    where
        F: FnMut(&mut Vec<InventoryBlock>) -> Result<T, ServiceError>,
    {
        let mut attempt = 0u32;
        loop {
            let VersionedBlocks {
                version,
                mut blocks,
            } = self.inventory.load(contract_id)?;
            let outcome = mutate(&mut blocks)?;
            tracing::debug!(contract_id = %contract_id, version, attempt, "committing inventory");

            match self
                .inventory
                .commit(contract_id, blocks, ExpectedVersion::Exact(version))
            {
                Ok(new_version) => return Ok((outcome, new_version)),
                Err(InventoryStoreError::Concurrency(msg))
                    if attempt < self.config.reservation_retry_limit =>
                {
                    attempt += 1;
                    tracing::warn!(
                        contract_id = %contract_id,
                        attempt,
                        reason = %msg,
                        "inventory changed concurrently, replanning"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn publish<T: Serialize>(
        &self,
        contract_id: ContractId,
        event_type: &'static str,
        version: u64,
        payload: &T,
    ) -> Result<(), ServiceError> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| ServiceError::Internal(format!("payload serialization failed: {e}")))?;
        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            contract_id.aggregate_id(),
            INVENTORY_AGGREGATE_TYPE,
            event_type,
            version,
            payload,
        );
        self.contracts
            .bus()
            .publish(envelope)
            .map_err(|e| ServiceError::Publish(format!("{e:?}")))
    }
}

fn ensure_within_term(contract: &Contract, range: DateRange) -> Result<(), ServiceError> {
    match contract.effective() {
        Some(term) if term.covers(&range) => Ok(()),
        Some(term) => Err(ServiceError::Validation(format!(
            "dates {range} fall outside the contract term {term}"
        ))),
        None => Err(ServiceError::InvariantViolation(format!(
            "contract {} has no effective term",
            contract.id_typed()
        ))),
    }
}
