use std::collections::HashMap;
use std::sync::RwLock;

use hotelsupply_contracts::ContractId;
use hotelsupply_core::ExpectedVersion;
use hotelsupply_inventory::InventoryBlock;

use super::{InventoryStore, InventoryStoreError, VersionedBlocks};

/// In-memory inventory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    contracts: RwLock<HashMap<ContractId, VersionedBlocks>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn load(&self, contract_id: ContractId) -> Result<VersionedBlocks, InventoryStoreError> {
        let contracts = self
            .contracts
            .read()
            .map_err(|_| InventoryStoreError::Poisoned)?;
        Ok(contracts.get(&contract_id).cloned().unwrap_or_default())
    }

    fn commit(
        &self,
        contract_id: ContractId,
        blocks: Vec<InventoryBlock>,
        expected: ExpectedVersion,
    ) -> Result<u64, InventoryStoreError> {
        if let Some(foreign) = blocks.iter().find(|b| b.contract_id() != contract_id) {
            return Err(InventoryStoreError::InvalidCommit(format!(
                "block {} belongs to contract {}, not {contract_id}",
                foreign.id_typed(),
                foreign.contract_id()
            )));
        }

        let mut contracts = self
            .contracts
            .write()
            .map_err(|_| InventoryStoreError::Poisoned)?;
        let entry = contracts.entry(contract_id).or_default();

        if !expected.matches(entry.version) {
            return Err(InventoryStoreError::Concurrency(format!(
                "expected {expected:?}, found {}",
                entry.version
            )));
        }

        entry.version += 1;
        entry.blocks = blocks;
        Ok(entry.version)
    }

    fn remove(&self, contract_id: ContractId) -> Result<(), InventoryStoreError> {
        let mut contracts = self
            .contracts
            .write()
            .map_err(|_| InventoryStoreError::Poisoned)?;
        contracts.remove(&contract_id);
        Ok(())
    }
}
