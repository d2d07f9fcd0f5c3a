//! Versioned storage of each contract's inventory blocks.
//!
//! A contract's blocks are stored and committed as one unit so a reservation spanning
//! several blocks and dates is either fully persisted or not at all.

pub mod in_memory;

use std::sync::Arc;

use thiserror::Error;

use hotelsupply_contracts::ContractId;
use hotelsupply_core::ExpectedVersion;
use hotelsupply_inventory::InventoryBlock;

pub use in_memory::InMemoryInventoryStore;

/// A contract's blocks together with the version they were read at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionedBlocks {
    /// 0 when nothing was ever committed for the contract.
    pub version: u64,
    pub blocks: Vec<InventoryBlock>,
}

#[derive(Debug, Error)]
pub enum InventoryStoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("invalid commit: {0}")]
    InvalidCommit(String),

    #[error("inventory store lock poisoned")]
    Poisoned,
}

/// Persistence boundary for inventory blocks, keyed by owning contract.
pub trait InventoryStore: Send + Sync {
    fn load(&self, contract_id: ContractId) -> Result<VersionedBlocks, InventoryStoreError>;

    /// Replace the contract's blocks when the stored version matches `expected`.
    ///
    /// Returns the new version. Every block must belong to `contract_id`.
    fn commit(
        &self,
        contract_id: ContractId,
        blocks: Vec<InventoryBlock>,
        expected: ExpectedVersion,
    ) -> Result<u64, InventoryStoreError>;

    /// Drop every block owned by the contract.
    fn remove(&self, contract_id: ContractId) -> Result<(), InventoryStoreError>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn load(&self, contract_id: ContractId) -> Result<VersionedBlocks, InventoryStoreError> {
        (**self).load(contract_id)
    }

    fn commit(
        &self,
        contract_id: ContractId,
        blocks: Vec<InventoryBlock>,
        expected: ExpectedVersion,
    ) -> Result<u64, InventoryStoreError> {
        (**self).commit(contract_id, blocks, expected)
    }

    fn remove(&self, contract_id: ContractId) -> Result<(), InventoryStoreError> {
        (**self).remove(contract_id)
    }
}
