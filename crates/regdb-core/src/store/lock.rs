use crate::{
    error::StorageError,
    model::{CiString, ObjectType},
};
use parking_lot::{Condvar, Mutex};
use std::{collections::HashSet, time::Duration};
use tracing::debug;

type Slot = (ObjectType, CiString);

///
/// RecordLocks
///
/// Per-(key namespace, key) mutual exclusion for the write path. Updates to
/// disjoint keys never wait on each other.
///

#[derive(Debug, Default)]
pub struct RecordLocks {
    held: Mutex<HashSet<Slot>>,
    released: Condvar,
}

impl RecordLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock one record slot, waiting at most `timeout`.
    ///
    /// A timeout is `LockTimeout`, a transient kind, so the persistence retry
    /// budget covers it.
    pub fn acquire(
        &self,
        object_type: ObjectType,
        key: &CiString,
        timeout: Duration,
    ) -> Result<RecordLockGuard<'_>, StorageError> {
        let slot = (object_type.key_namespace(), key.clone());
        let mut held = self.held.lock();

        let result = self
            .released
            .wait_while_for(&mut held, |held| held.contains(&slot), timeout);
        if result.timed_out() && held.contains(&slot) {
            debug!(%object_type, %key, "record lock timed out");
            return Err(StorageError::lock_timeout(format!(
                "{object_type} '{key}' is locked by another update"
            )));
        }

        held.insert(slot.clone());

        Ok(RecordLockGuard { locks: self, slot })
    }

    #[must_use]
    pub fn is_locked(&self, object_type: ObjectType, key: &CiString) -> bool {
        self.held.lock().contains(&(object_type.key_namespace(), key.clone()))
    }
}

///
/// RecordLockGuard
///
/// Releases its slot on drop.
///

#[derive(Debug)]
pub struct RecordLockGuard<'a> {
    locks: &'a RecordLocks,
    slot: Slot,
}

impl Drop for RecordLockGuard<'_> {
    fn drop(&mut self) {
        self.locks.held.lock().remove(&self.slot);
        self.locks.released.notify_all();
    }
}
