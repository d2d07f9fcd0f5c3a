//! Infrastructure layer: configuration, persistence boundaries, locking and the
//! contract and reservation services.

pub mod command_dispatcher;
pub mod config;
pub mod contract_service;
pub mod errors;
pub mod event_store;
pub mod inventory_store;
pub mod locks;
pub mod reservation_service;

pub use config::{ConfigError, InfraConfig};
pub use contract_service::{CONTRACT_AGGREGATE_TYPE, ContractService};
pub use errors::ServiceError;
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore};
pub use inventory_store::{InMemoryInventoryStore, InventoryStore, InventoryStoreError, VersionedBlocks};
pub use locks::ContractLocks;
pub use reservation_service::{INVENTORY_AGGREGATE_TYPE, ReservationService};
