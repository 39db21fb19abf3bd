//! Per-account serialization point.
//!
//! Each account gets its own gate, so operations on the same account run one
//! at a time while operations on different accounts never wait on each other.
//! Waiting is bounded: a caller that can't get the gate in time gets a
//! [StoreError::LockTimeout] instead of blocking forever.

use super::error::StoreError;
use super::AccountId;

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct Gate {
    busy: Mutex<bool>,
    released: Condvar,
}

#[derive(Default)]
pub struct AccountLocks {
    // A gate lives as long as someone holds or waits for it. Whoever lets go
    // of it last removes it, so ids that are never seen again don't pile up.
    gates: Mutex<HashMap<AccountId, Arc<Gate>>>,
}

/// Holds an account's gate until dropped.
pub struct AccountGuard<'a> {
    locks: &'a AccountLocks,
    account_id: AccountId,
    gate: Arc<Gate>,
}

impl AccountGuard<'_> {
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, account_id: AccountId, timeout: Duration) -> Result<AccountGuard<'_>, StoreError> {
        let gate = {
            let mut gates = self.gates.lock()?;
            Arc::clone(gates.entry(account_id).or_default())
        };

        let acquired = {
            let busy = gate.busy.lock()?;
            let (mut busy, _) = gate
                .released
                .wait_timeout_while(busy, timeout, |busy| *busy)?;

            let free = !*busy;
            if free {
                *busy = true;
            }
            free
        };

        if !acquired {
            tracing::warn!(account_id, ?timeout, "timed out waiting for account");
            self.forget(account_id, &gate);
            return Err(StoreError::LockTimeout {
                account_id,
                waited: timeout,
            });
        }

        Ok(AccountGuard {
            locks: self,
            account_id,
            gate,
        })
    }

    /// Number of gates currently tracked.
    pub fn len(&self) -> usize {
        self.gates.lock().map_or(0, |gates| gates.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Drops the account's gate from the table if `gate` is the last handle on
    // it besides the table's own. Handles are only cloned under the table
    // lock, so nobody can pick it up in between.
    fn forget(&self, account_id: AccountId, gate: &Arc<Gate>) {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        let unused = gates
            .get(&account_id)
            .map_or(false, |kept| Arc::ptr_eq(kept, gate) && Arc::strong_count(gate) == 2);
        if unused {
            gates.remove(&account_id);
        }
    }
}

impl Drop for AccountGuard<'_> {
    fn drop(&mut self) {
        // The flag is a plain bool: a panic elsewhere can't leave it half
        // written, so a poisoned mutex is still safe to release.
        let mut busy = self.gate.busy.lock().unwrap_or_else(PoisonError::into_inner);
        *busy = false;
        drop(busy);

        self.gate.released.notify_one();
        self.locks.forget(self.account_id, &self.gate);
    }
}
