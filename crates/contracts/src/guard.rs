//! Status guard: precondition checks for status-dependent operations.

use chrono::{DateTime, Utc};

use hotelsupply_core::{Aggregate, DomainError};

use crate::contract::{
    Contract, ContractCommand, ContractEvent, ContractStatusChanged, TransitionStatus,
};
use crate::error::{ContractError, ContractStatusInvalid};
use crate::status::ContractStatus;

/// Succeeds silently iff the contract's current status is one of `required`.
///
/// An empty `required` set accepts nothing. The check has no side effects.
pub fn assert_status_allowed(
    contract: &Contract,
    required: &[ContractStatus],
    operation: &str,
) -> Result<(), ContractStatusInvalid> {
    let current = contract.status();
    if required.contains(&current) {
        return Ok(());
    }
    Err(ContractStatusInvalid::new(operation, current, required))
}

/// Guard a move to `target` against the transition table.
pub(crate) fn assert_transition_allowed(
    contract: &Contract,
    target: ContractStatus,
) -> Result<(), ContractStatusInvalid> {
    assert_status_allowed(
        contract,
        target.allowed_sources(),
        &format!("transition to {target}"),
    )
}

/// Move an in-memory contract to `new_status`.
///
/// The status is only written after the guard accepted the current status. For
/// persisted contracts use the infra `ContractService`, which performs the same steps
/// under the contract's lock and an exact expected stream version.
pub fn transition(
    contract: &mut Contract,
    new_status: ContractStatus,
    occurred_at: DateTime<Utc>,
) -> Result<ContractStatusChanged, ContractError> {
    let command = ContractCommand::TransitionStatus(TransitionStatus {
        contract_id: contract.id_typed(),
        target: new_status,
        occurred_at,
    });

    let events = contract.handle(&command)?;
    let mut changed = None;
    for event in &events {
        contract.apply(event);
        if let ContractEvent::ContractStatusChanged(e) = event {
            changed = Some(e.clone());
        }
    }

    changed.ok_or_else(|| {
        DomainError::invariant("status transition produced no status change").into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::tests::{contract_in, test_time};
    use hotelsupply_core::AggregateRoot;
    use ContractStatus::*;

    #[test]
    fn suspended_contract_cannot_issue_booking() {
        let contract = contract_in(Suspended);

        let err = assert_status_allowed(&contract, &[Active], "issue booking").unwrap_err();

        assert_eq!(err.current(), Suspended);
        assert_eq!(err.accepted(), &[Active]);
        assert_eq!(err.operation(), "issue booking");
        let message = err.to_string();
        assert!(message.contains("Suspended"), "{message}");
        assert!(message.contains("Active"), "{message}");
        assert!(message.contains("issue booking"), "{message}");
    }

    #[test]
    fn member_status_passes_silently() {
        let contract = contract_in(Active);
        assert!(assert_status_allowed(&contract, &[Active, Suspended], "amend rates").is_ok());
    }

    #[test]
    fn empty_requirement_rejects_every_status() {
        for status in ContractStatus::ALL {
            let contract = contract_in(status);
            assert!(assert_status_allowed(&contract, &[], "noop").is_err());
        }
    }

    #[test]
    fn transition_follows_table() {
        let mut contract = contract_in(Draft);

        let changed = transition(&mut contract, Active, test_time()).unwrap();
        assert_eq!((changed.from, changed.to), (Draft, Active));

        transition(&mut contract, Suspended, test_time()).unwrap();
        transition(&mut contract, Active, test_time()).unwrap();
        transition(&mut contract, Expired, test_time()).unwrap();
        assert_eq!(contract.status(), Expired);
    }

    #[test]
    fn rejected_transition_leaves_contract_untouched() {
        let mut contract = contract_in(Terminated);
        let version = contract.version();

        let err = transition(&mut contract, Active, test_time()).unwrap_err();
        match err {
            ContractError::StatusInvalid(e) => {
                assert_eq!(e.operation(), "transition to Active");
                assert_eq!(e.current(), Terminated);
                assert_eq!(e.accepted(), &[Draft, Suspended]);
            }
            other => panic!("Expected StatusInvalid, got {other:?}"),
        }
        assert_eq!(contract.status(), Terminated);
        assert_eq!(contract.version(), version);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;
        use proptest::sample::subsequence;

        fn any_status() -> impl Strategy<Value = ContractStatus> {
            proptest::sample::select(ContractStatus::ALL.to_vec())
        }

        proptest! {
            /// Property: the guard passes exactly when the status is in the required set.
            #[test]
            fn guard_matches_set_membership(
                status in any_status(),
                required in subsequence(ContractStatus::ALL.to_vec(), 0..=5),
            ) {
                let contract = contract_in(status);
                let result = assert_status_allowed(&contract, &required, "op");

                if required.contains(&status) {
                    prop_assert!(result.is_ok());
                } else {
                    let err = result.unwrap_err();
                    prop_assert_eq!(err.current(), status);
                    prop_assert_eq!(err.accepted(), required.as_slice());
                }
            }

            /// Property: transitions succeed iff the table allows them.
            #[test]
            fn transition_matches_table(from in any_status(), to in any_status()) {
                let mut contract = contract_in(from);
                let result = transition(&mut contract, to, test_time());

                prop_assert_eq!(result.is_ok(), from.can_transition_to(to));
                let expected = if from.can_transition_to(to) { to } else { from };
                prop_assert_eq!(contract.status(), expected);
            }
        }
    }
}
