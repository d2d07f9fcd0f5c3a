//! Service-level failure model.
//!
//! Callers branch on the variant: the two business rejections carry their structured
//! failures, everything else is a generic domain or infrastructure failure.

use thiserror::Error;

use hotelsupply_contracts::{ContractError, ContractStatusInvalid};
use hotelsupply_core::DomainError;
use hotelsupply_inventory::{InsufficientInventory, InventoryError};

use crate::event_store::EventStoreError;
use crate::inventory_store::InventoryStoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The contract's status does not permit the operation.
    #[error(transparent)]
    ContractStatusInvalid(ContractStatusInvalid),

    /// Some date of the requested range lacks free capacity.
    #[error(transparent)]
    InsufficientInventory(InsufficientInventory),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("not found")]
    NotFound,

    /// Concurrent modification detected (stale version, retries exhausted).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored events could not be decoded into the aggregate's event type.
    #[error("failed to decode stored event: {0}")]
    Deserialize(String),

    #[error(transparent)]
    EventStore(EventStoreError),

    #[error(transparent)]
    InventoryStore(InventoryStoreError),

    /// Publication failed after a successful commit (at-least-once; retry may duplicate).
    #[error("event publication failed: {0}")]
    Publish(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// HTTP-style status code a calling layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::ContractStatusInvalid(_) => 400,
            ServiceError::InsufficientInventory(_) => 409,
            ServiceError::Validation(_) => 400,
            ServiceError::InvariantViolation(_) => 422,
            ServiceError::NotFound => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::Publish(_) => 502,
            ServiceError::Deserialize(_)
            | ServiceError::EventStore(_)
            | ServiceError::InventoryStore(_)
            | ServiceError::Internal(_) => 500,
        }
    }

    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::ContractStatusInvalid(_) => "contract_status_invalid",
            ServiceError::InsufficientInventory(_) => "insufficient_inventory",
            ServiceError::Validation(_) => "validation_error",
            ServiceError::InvariantViolation(_) => "invariant_violation",
            ServiceError::NotFound => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Deserialize(_) => "deserialize_error",
            ServiceError::EventStore(_) => "event_store_error",
            ServiceError::InventoryStore(_) => "inventory_store_error",
            ServiceError::Publish(_) => "publish_error",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::NotFound => ServiceError::NotFound,
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<ContractStatusInvalid> for ServiceError {
    fn from(value: ContractStatusInvalid) -> Self {
        ServiceError::ContractStatusInvalid(value)
    }
}

impl From<InsufficientInventory> for ServiceError {
    fn from(value: InsufficientInventory) -> Self {
        ServiceError::InsufficientInventory(value)
    }
}

impl From<ContractError> for ServiceError {
    fn from(value: ContractError) -> Self {
        match value {
            ContractError::StatusInvalid(e) => e.into(),
            ContractError::Domain(e) => e.into(),
        }
    }
}

impl From<InventoryError> for ServiceError {
    fn from(value: InventoryError) -> Self {
        match value {
            InventoryError::Insufficient(e) => e.into(),
            InventoryError::Domain(e) => e.into(),
        }
    }
}

impl From<EventStoreError> for ServiceError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => ServiceError::Conflict(msg),
            other => ServiceError::EventStore(other),
        }
    }
}

impl From<InventoryStoreError> for ServiceError {
    fn from(value: InventoryStoreError) -> Self {
        match value {
            InventoryStoreError::Concurrency(msg) => ServiceError::Conflict(msg),
            other => ServiceError::InventoryStore(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use hotelsupply_contracts::ContractStatus;

    use super::*;

    #[test]
    fn business_failures_keep_their_kind_and_code() {
        let status: ServiceError = ContractError::from(ContractStatusInvalid::new(
            "issue booking",
            ContractStatus::Suspended,
            [ContractStatus::Active],
        ))
        .into();
        let inventory: ServiceError = InventoryError::from(InsufficientInventory::new(
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            3,
            2,
        ))
        .into();

        assert_eq!((status.kind(), status.status_code()), ("contract_status_invalid", 400));
        assert_eq!((inventory.kind(), inventory.status_code()), ("insufficient_inventory", 409));
        assert!(matches!(status, ServiceError::ContractStatusInvalid(_)));
        assert!(matches!(inventory, ServiceError::InsufficientInventory(_)));
    }

    #[test]
    fn store_conflicts_become_conflicts() {
        let err: ServiceError = EventStoreError::Concurrency("expected 1, found 2".into()).into();
        assert_eq!(err.status_code(), 409);

        let err: ServiceError = InventoryStoreError::Poisoned.into();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn domain_errors_map_by_variant() {
        assert_eq!(ServiceError::from(DomainError::not_found()).status_code(), 404);
        assert_eq!(ServiceError::from(DomainError::validation("x")).status_code(), 400);
        assert_eq!(ServiceError::from(DomainError::invariant("x")).status_code(), 422);
    }
}
