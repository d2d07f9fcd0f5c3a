//! Contract lifecycle operations over persisted contracts.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;

use hotelsupply_contracts::{
    Contract, ContractCommand, ContractId, ContractStatus, CreateContract, TransitionStatus,
    assert_status_allowed,
};
use hotelsupply_core::{AggregateId, AggregateRoot, DateRange};
use hotelsupply_events::{EventBus, EventEnvelope};

use crate::command_dispatcher::{CommandDispatcher, Dispatched};
use crate::errors::ServiceError;
use crate::event_store::EventStore;
use crate::locks::ContractLocks;

pub const CONTRACT_AGGREGATE_TYPE: &str = "contract";

/// Creates contracts, applies guarded status transitions and answers status checks.
///
/// Transitions hold the contract's lock from the status read to the append, so two
/// callers can never both act on the same observed status.
#[derive(Debug)]
pub struct ContractService<S, B> {
    dispatcher: CommandDispatcher<S, B>,
    locks: Arc<ContractLocks>,
}

impl<S, B> ContractService<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self::with_locks(store, bus, Arc::new(ContractLocks::new()))
    }

    pub fn with_locks(store: S, bus: B, locks: Arc<ContractLocks>) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store, bus),
            locks,
        }
    }

    pub fn locks(&self) -> &Arc<ContractLocks> {
        &self.locks
    }

    pub fn bus(&self) -> &B {
        self.dispatcher.bus()
    }

    pub fn store(&self) -> &S {
        self.dispatcher.store()
    }
}

impl<S, B> ContractService<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Register a new contract in `Draft`.
    pub fn create_contract(
        &self,
        hotel_name: impl Into<String>,
        effective: DateRange,
    ) -> Result<Contract, ServiceError> {
        self.create_contract_with_id(ContractId::new(AggregateId::new()), hotel_name, effective)
    }

    pub fn create_contract_with_id(
        &self,
        contract_id: ContractId,
        hotel_name: impl Into<String>,
        effective: DateRange,
    ) -> Result<Contract, ServiceError> {
        let command = ContractCommand::CreateContract(CreateContract {
            contract_id,
            hotel_name: hotel_name.into(),
            effective,
            occurred_at: Utc::now(),
        });

        let contract = self.locks.with_lock(contract_id, || {
            Ok(self.dispatch(contract_id, command)?.aggregate)
        })?;

        tracing::info!(
            contract_id = %contract_id,
            hotel = contract.hotel_name(),
            effective = %effective,
            "contract created"
        );
        Ok(contract)
    }

    /// Load the current state of a contract.
    pub fn load(&self, contract_id: ContractId) -> Result<Contract, ServiceError> {
        let contract = self
            .dispatcher
            .load(contract_id.aggregate_id(), |id| Contract::empty(ContractId::new(id)))?;
        if !contract.is_created() {
            return Err(ServiceError::NotFound);
        }
        Ok(contract)
    }

    /// Move the contract to `target` if the transition table allows it from its
    /// current status.
    pub fn transition(
        &self,
        contract_id: ContractId,
        target: ContractStatus,
    ) -> Result<Contract, ServiceError> {
        let command = ContractCommand::TransitionStatus(TransitionStatus {
            contract_id,
            target,
            occurred_at: Utc::now(),
        });

        let result = self
            .locks
            .with_lock(contract_id, || self.dispatch(contract_id, command));

        match result {
            Ok(dispatched) => {
                tracing::info!(
                    contract_id = %contract_id,
                    status = %dispatched.aggregate.status(),
                    version = dispatched.aggregate.version(),
                    "contract status changed"
                );
                Ok(dispatched.aggregate)
            }
            Err(ServiceError::ContractStatusInvalid(e)) => {
                tracing::warn!(
                    contract_id = %contract_id,
                    operation = e.operation(),
                    current = %e.current(),
                    "status transition rejected"
                );
                Err(ServiceError::ContractStatusInvalid(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Load the contract and check that its status is one of `required`.
    pub fn assert_status(
        &self,
        contract_id: ContractId,
        required: &[ContractStatus],
        operation: &str,
    ) -> Result<Contract, ServiceError> {
        let contract = self.load(contract_id)?;
        check_status(&contract, required, operation)?;
        Ok(contract)
    }

    fn dispatch(
        &self,
        contract_id: ContractId,
        command: ContractCommand,
    ) -> Result<Dispatched<Contract>, ServiceError> {
        self.dispatcher.dispatch(
            contract_id.aggregate_id(),
            CONTRACT_AGGREGATE_TYPE,
            command,
            |id| Contract::empty(ContractId::new(id)),
        )
    }
}

/// Status guard with a warning on rejection.
pub(crate) fn check_status(
    contract: &Contract,
    required: &[ContractStatus],
    operation: &str,
) -> Result<(), ServiceError> {
    assert_status_allowed(contract, required, operation).map_err(|e| {
        tracing::warn!(
            contract_id = %contract.id_typed(),
            operation,
            current = %e.current(),
            "operation rejected by contract status"
        );
        ServiceError::ContractStatusInvalid(e)
    })
}
