//! Module: store
//! Responsibility: the storage contracts the write path needs, plus the
//! in-memory adapter and per-record locking.
//! Does not own: on-disk layout or replication.

mod lock;
mod memory;

pub use lock::{RecordLockGuard, RecordLocks};
pub use memory::{MemoryStore, MemoryTransaction};

#[cfg(test)]
pub(crate) use memory::fault;

use crate::{
    error::{LookupError, StorageError, UpdateError},
    index::{IndexRegistry, IndexWrite},
    model::{AttributeType, CiString, ObjectId, ObjectType, Record, RecordHandle},
};

///
/// RecordLookup
///
/// Read access by primary key. A missing key is `LookupError::NotFound`,
/// distinct from storage failures.
///

pub trait RecordLookup: Send + Sync {
    fn get_by_key(&self, object_type: ObjectType, key: &CiString) -> Result<Record, LookupError>;

    /// Records for every key that exists; missing keys are skipped.
    fn get_by_keys(
        &self,
        object_type: ObjectType,
        keys: &[CiString],
    ) -> Result<Vec<Record>, LookupError> {
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            match self.get_by_key(object_type, key) {
                Ok(record) => records.push(record),
                Err(LookupError::NotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        Ok(records)
    }
}

///
/// RecordStore
///
/// Transactional primary storage with secondary index tables.
///

pub trait RecordStore: RecordLookup {
    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, StorageError>;

    /// Search one attribute's index outside any transaction.
    fn find_in_index(
        &self,
        indexes: &IndexRegistry,
        attribute: AttributeType,
        value: &CiString,
    ) -> Result<Vec<RecordHandle>, UpdateError>;
}

///
/// StoreTransaction
///
/// One unit of work. Nothing is visible to other readers before `commit`;
/// dropping an uncommitted transaction discards every staged change.
///

pub trait StoreTransaction {
    fn get(&self, object_id: ObjectId) -> Option<Record>;

    fn get_by_key(&self, object_type: ObjectType, key: &CiString) -> Option<Record>;

    /// Store `record`. Without an object id this is a create (the key must be
    /// free); with one it replaces the record stored under that id.
    fn put(&mut self, record: Record) -> Result<Record, StorageError>;

    fn delete(&mut self, object_id: ObjectId) -> Result<Record, StorageError>;

    fn indexes(&mut self) -> &mut dyn IndexWrite;

    fn commit(self: Box<Self>) -> Result<(), StorageError>;
}
