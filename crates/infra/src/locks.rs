//! Per-contract mutual exclusion.
//!
//! Check-then-act sequences on one contract (status guard + transition, availability
//! check + reservation) run while holding that contract's lock. Different contracts
//! never contend. A contract's entry is dropped once no caller holds or awaits it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hotelsupply_contracts::ContractId;

use crate::errors::ServiceError;

#[derive(Debug, Default)]
pub struct ContractLocks {
    locks: Mutex<HashMap<ContractId, Arc<Mutex<()>>>>,
}

impl ContractLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, contract_id: ContractId) -> Result<Arc<Mutex<()>>, ServiceError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| ServiceError::Internal("lock registry poisoned".to_string()))?;
        Ok(locks.entry(contract_id).or_default().clone())
    }

    /// Run `f` while holding the contract's lock.
    pub fn with_lock<T, F>(&self, contract_id: ContractId, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Result<T, ServiceError>,
    {
        let mutex = self.handle(contract_id)?;
        let result = {
            let _guard = mutex.lock().map_err(|_| {
                ServiceError::Internal(format!("lock for contract {contract_id} poisoned"))
            })?;
            f()
        };
        self.prune(contract_id, &mutex);
        result
    }

    /// Remove the contract's entry when `mutex` is the last handle besides the registry's.
    ///
    /// Handles are only cloned under the registry lock, so the count cannot grow while
    /// it is checked here.
    fn prune(&self, contract_id: ContractId, mutex: &Arc<Mutex<()>>) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        let idle = locks
            .get(&contract_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, mutex) && Arc::strong_count(mutex) == 2);
        if idle {
            locks.remove(&contract_id);
        }
    }

    /// Number of contracts whose lock is currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use hotelsupply_core::AggregateId;

    use super::*;

    #[test]
    fn same_contract_is_serialized() {
        let locks = Arc::new(ContractLocks::new());
        let contract_id = ContractId::new(AggregateId::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let max_seen = max_seen.clone();
                thread::spawn(move || {
                    locks
                        .with_lock(contract_id, || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(now, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(2));
                            inside.fetch_sub(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[test]
    fn entry_lives_only_while_in_use() {
        let locks = ContractLocks::new();
        let first = ContractId::new(AggregateId::new());
        let second = ContractId::new(AggregateId::new());

        locks
            .with_lock(first, || {
                assert_eq!(locks.len(), 1);
                locks.with_lock(second, || {
                    assert_eq!(locks.len(), 2);
                    Ok(())
                })?;
                assert_eq!(locks.len(), 1);
                Ok(())
            })
            .unwrap();

        assert!(locks.is_empty());
    }

    #[test]
    fn errors_from_the_closure_propagate() {
        let locks = ContractLocks::new();
        let err = locks
            .with_lock(ContractId::new(AggregateId::new()), || -> Result<(), _> {
                Err(ServiceError::NotFound)
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
        assert!(locks.is_empty());
    }
}
