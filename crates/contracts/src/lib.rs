//! Hotel supply contracts domain module (event-sourced).
//!
//! Contract lifecycle, the status transition table and the status guard that gates
//! status-dependent operations. Pure domain logic (no IO, no storage).

pub mod contract;
pub mod error;
pub mod guard;
pub mod status;

pub use contract::{
    Contract, ContractCommand, ContractCreated, ContractEvent, ContractId, ContractStatusChanged,
    CreateContract, TransitionStatus,
};
pub use error::{ContractError, ContractStatusInvalid};
pub use guard::{assert_status_allowed, transition};
pub use status::ContractStatus;
