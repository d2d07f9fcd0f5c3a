use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hotelsupply_core::{Aggregate, AggregateId, AggregateRoot, DateRange, DomainError};
use hotelsupply_events::Event;

use crate::error::ContractError;
use crate::guard::assert_transition_allowed;
use crate::status::ContractStatus;

/// Contract identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub AggregateId);

impl ContractId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.0
    }
}

impl core::fmt::Display for ContractId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: Contract (a hotel supply agreement).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    id: ContractId,
    hotel_name: String,
    effective: Option<DateRange>,
    status: ContractStatus,
    version: u64,
    created: bool,
}

impl Contract {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ContractId) -> Self {
        Self {
            id,
            hotel_name: String::new(),
            effective: None,
            status: ContractStatus::Draft,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ContractId {
        self.id
    }

    pub fn hotel_name(&self) -> &str {
        &self.hotel_name
    }

    /// Effective term; `None` until the contract is created.
    pub fn effective(&self) -> Option<DateRange> {
        self.effective
    }

    pub fn status(&self) -> ContractStatus {
        self.status
    }

    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Contract {
    type Id = ContractId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateContract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateContract {
    pub contract_id: ContractId,
    pub hotel_name: String,
    pub effective: DateRange,
    pub occurred_at: DateTime<Utc>,
}

/// Command: TransitionStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionStatus {
    pub contract_id: ContractId,
    pub target: ContractStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractCommand {
    CreateContract(CreateContract),
    TransitionStatus(TransitionStatus),
}

impl ContractCommand {
    pub fn contract_id(&self) -> ContractId {
        match self {
            ContractCommand::CreateContract(c) => c.contract_id,
            ContractCommand::TransitionStatus(c) => c.contract_id,
        }
    }
}

/// Event: ContractCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCreated {
    pub contract_id: ContractId,
    pub hotel_name: String,
    pub effective: DateRange,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ContractStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStatusChanged {
    pub contract_id: ContractId,
    pub from: ContractStatus,
    pub to: ContractStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    ContractCreated(ContractCreated),
    ContractStatusChanged(ContractStatusChanged),
}

impl Event for ContractEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ContractEvent::ContractCreated(_) => "contract.created",
            ContractEvent::ContractStatusChanged(_) => "contract.status_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ContractEvent::ContractCreated(e) => e.occurred_at,
            ContractEvent::ContractStatusChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Contract {
    type Command = ContractCommand;
    type Event = ContractEvent;
    type Error = ContractError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ContractEvent::ContractCreated(e) => {
                self.id = e.contract_id;
                self.hotel_name = e.hotel_name.clone();
                self.effective = Some(e.effective);
                self.status = ContractStatus::Draft;
                self.created = true;
            }
            ContractEvent::ContractStatusChanged(e) => {
                self.status = e.to;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ContractCommand::CreateContract(cmd) => self.handle_create(cmd),
            ContractCommand::TransitionStatus(cmd) => self.handle_transition(cmd),
        }
    }
}

impl Contract {
    fn ensure_contract_id(&self, contract_id: ContractId) -> Result<(), DomainError> {
        if self.id != contract_id {
            return Err(DomainError::invariant("contract_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateContract) -> Result<Vec<ContractEvent>, ContractError> {
        if self.created {
            return Err(DomainError::conflict("contract already exists").into());
        }
        self.ensure_contract_id(cmd.contract_id)?;
        if cmd.hotel_name.trim().is_empty() {
            return Err(DomainError::validation("hotel_name cannot be empty").into());
        }

        Ok(vec![ContractEvent::ContractCreated(ContractCreated {
            contract_id: cmd.contract_id,
            hotel_name: cmd.hotel_name.trim().to_string(),
            effective: cmd.effective,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_transition(
        &self,
        cmd: &TransitionStatus,
    ) -> Result<Vec<ContractEvent>, ContractError> {
        if !self.created {
            return Err(DomainError::not_found().into());
        }
        self.ensure_contract_id(cmd.contract_id)?;
        assert_transition_allowed(self, cmd.target)?;

        Ok(vec![ContractEvent::ContractStatusChanged(
            ContractStatusChanged {
                contract_id: cmd.contract_id,
                from: self.status,
                to: cmd.target,
                occurred_at: cmd.occurred_at,
            },
        )])
    }
}
