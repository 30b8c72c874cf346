use crate::{
    error::{LookupError, StorageError, StorageErrorKind, UpdateError},
    index::{IndexRead, IndexRegistry, IndexRow, IndexTables, IndexWrite},
    model::{AttributeType, CiString, ObjectId, ObjectType, Record, RecordHandle},
    store::{RecordLookup, RecordStore, StoreTransaction},
};
use parking_lot::RwLock;
use std::{
    collections::{BTreeMap, HashMap},
    sync::atomic::{AtomicU64, Ordering},
};
use tracing::debug;

type Slot = (ObjectType, CiString);

fn slot(object_type: ObjectType, key: &CiString) -> Slot {
    (object_type.key_namespace(), key.clone())
}

///
/// StoreState
///

#[derive(Debug, Default)]
struct StoreState {
    records: BTreeMap<ObjectId, Record>,
    keys: HashMap<Slot, ObjectId>,
    indexes: IndexTables,
}

impl StoreState {
    fn get_by_key(&self, object_type: ObjectType, key: &CiString) -> Option<&Record> {
        self.keys
            .get(&slot(object_type, key))
            .and_then(|id| self.records.get(id))
            .filter(|record| record.object_type() == object_type)
    }
}

///
/// MemoryStore
///
/// In-process primary store and index tables. Transactions stage their
/// changes privately and take the write lock only to publish them.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    next_id: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed records in one transaction, indexing each with `indexes`.
    pub fn load(
        &self,
        indexes: &IndexRegistry,
        records: impl IntoIterator<Item = Record>,
    ) -> Result<Vec<Record>, UpdateError> {
        let mut tx = self.begin()?;
        let mut stored = Vec::new();

        for record in records {
            let record = tx.put(record)?;
            if let Some(handle) = record.handle() {
                indexes.reindex(tx.indexes(), &handle, None, Some(&record))?;
            }
            stored.push(record);
        }
        tx.commit()?;

        Ok(stored)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, object_id: ObjectId) -> Option<Record> {
        self.state.read().records.get(&object_id).cloned()
    }

    /// Every index row of one attribute, for inspection.
    #[must_use]
    pub fn index_rows(&self, attribute: AttributeType) -> Vec<IndexRow> {
        self.state.read().indexes.rows(attribute)
    }
}

impl RecordLookup for MemoryStore {
    fn get_by_key(&self, object_type: ObjectType, key: &CiString) -> Result<Record, LookupError> {
        fault::check_lookup()?;

        self.state
            .read()
            .get_by_key(object_type, key)
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                object_type,
                key: key.clone(),
            })
    }
}

impl RecordStore for MemoryStore {
    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, StorageError> {
        Ok(Box::new(MemoryTransaction {
            store: self,
            records: BTreeMap::new(),
            keys: HashMap::new(),
            observed: HashMap::new(),
            indexes: StagedIndexes {
                base: &self.state,
                ops: Vec::new(),
            },
        }))
    }

    fn find_in_index(
        &self,
        indexes: &IndexRegistry,
        attribute: AttributeType,
        value: &CiString,
    ) -> Result<Vec<RecordHandle>, UpdateError> {
        let state = self.state.read();

        Ok(indexes.find(&state.indexes, attribute, value)?)
    }
}

///
/// MemoryTransaction
///
/// Stages record writes, key ownership and index operations over the
/// committed state. Reads see committed state with the staged changes laid
/// on top. `commit` checks that every key slot it touched still has the
/// owner it had when first read, then applies the changes under the write
/// lock; dropping the transaction discards them.
///

pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    records: BTreeMap<ObjectId, Option<Record>>,
    keys: HashMap<Slot, Option<ObjectId>>,
    observed: HashMap<Slot, Option<ObjectId>>,
    indexes: StagedIndexes<'a>,
}

impl MemoryTransaction<'_> {
    fn owner(&self, slot: &Slot) -> Option<ObjectId> {
        match self.keys.get(slot) {
            Some(staged) => *staged,
            None => self.store.state.read().keys.get(slot).copied(),
        }
    }

    // Owner of a slot this transaction is about to write; the committed
    // owner is remembered for the check in `commit`.
    fn claim(&mut self, slot: &Slot) -> Option<ObjectId> {
        if let Some(staged) = self.keys.get(slot) {
            return *staged;
        }
        let committed = self.store.state.read().keys.get(slot).copied();
        self.observed.entry(slot.clone()).or_insert(committed);

        committed
    }

    fn allocate_id(&self) -> ObjectId {
        ObjectId::new(self.store.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn get(&self, object_id: ObjectId) -> Option<Record> {
        match self.records.get(&object_id) {
            Some(staged) => staged.clone(),
            None => self.store.state.read().records.get(&object_id).cloned(),
        }
    }

    fn get_by_key(&self, object_type: ObjectType, key: &CiString) -> Option<Record> {
        self.owner(&slot(object_type, key))
            .and_then(|object_id| self.get(object_id))
            .filter(|record| record.object_type() == object_type)
    }

    fn put(&mut self, record: Record) -> Result<Record, StorageError> {
        let object_type = record.object_type();
        let slot = slot(object_type, record.key());
        let owner = self.claim(&slot);

        let object_id = match (record.object_id(), owner) {
            (None, None) => self.allocate_id(),
            (None, Some(owner)) => {
                let existing = self.get(owner).map_or(object_type, |stored| stored.object_type());
                return Err(StorageError::conflict(format!(
                    "{existing} '{}' already exists",
                    record.key()
                )));
            }
            (Some(object_id), owner) => {
                let same_type = self
                    .get(object_id)
                    .is_some_and(|stored| stored.object_type() == object_type);
                if owner != Some(object_id) || !same_type {
                    return Err(StorageError::conflict(format!(
                        "{object_type} '{}' is not stored under #{object_id}",
                        record.key()
                    )));
                }
                object_id
            }
        };

        let record = record.with_object_id(object_id);
        self.keys.insert(slot, Some(object_id));
        self.records.insert(object_id, Some(record.clone()));

        Ok(record)
    }

    fn delete(&mut self, object_id: ObjectId) -> Result<Record, StorageError> {
        let record = self.get(object_id).ok_or_else(|| {
            StorageError::new(
                StorageErrorKind::NotFound,
                format!("no record stored under #{object_id}"),
            )
        })?;
        let slot = slot(record.object_type(), record.key());
        self.claim(&slot);
        self.keys.insert(slot, None);
        self.records.insert(object_id, None);

        Ok(record)
    }

    fn indexes(&mut self) -> &mut dyn IndexWrite {
        &mut self.indexes
    }

    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        fault::check_commit()?;

        let Self {
            store,
            records,
            keys,
            observed,
            indexes,
        } = *self;
        let mut state = store.state.write();

        if let Some(((object_type, key), _)) = observed
            .iter()
            .find(|(slot, owner)| state.keys.get(*slot).copied() != **owner)
        {
            return Err(StorageError::conflict(format!(
                "{object_type} '{key}' was written by a concurrent update"
            )));
        }

        debug!(
            records = records.len(),
            index_ops = indexes.ops.len(),
            "memory store commit"
        );
        for (object_id, record) in records {
            match record {
                Some(record) => {
                    state.records.insert(object_id, record);
                }
                None => {
                    state.records.remove(&object_id);
                }
            }
        }
        for (slot, owner) in keys {
            match owner {
                Some(object_id) => {
                    state.keys.insert(slot, object_id);
                }
                None => {
                    state.keys.remove(&slot);
                }
            }
        }
        indexes.apply(&mut state.indexes);

        Ok(())
    }
}

///
/// StagedIndexes
///
/// Index operations of one transaction, replayed over the committed tables
/// on every read and applied to them in order at commit.
///

enum IndexOp {
    Insert(AttributeType, IndexRow),
    RemoveObject(AttributeType, ObjectId),
}

struct StagedIndexes<'a> {
    base: &'a RwLock<StoreState>,
    ops: Vec<IndexOp>,
}

impl StagedIndexes<'_> {
    fn overlay(
        &self,
        attribute: AttributeType,
        mut rows: Vec<IndexRow>,
        visible: impl Fn(&IndexRow) -> bool,
    ) -> Vec<IndexRow> {
        for op in &self.ops {
            match op {
                IndexOp::Insert(table, row) if *table == attribute && visible(row) => {
                    if !rows.iter().any(|existing| existing.duplicates(row)) {
                        rows.push(row.clone());
                    }
                }
                IndexOp::RemoveObject(table, object_id) if *table == attribute => {
                    rows.retain(|row| row.handle.object_id() != *object_id);
                }
                _ => {}
            }
        }

        rows
    }

    fn apply(self, tables: &mut IndexTables) {
        for op in self.ops {
            match op {
                IndexOp::Insert(attribute, row) => {
                    tables.insert_row(attribute, row);
                }
                IndexOp::RemoveObject(attribute, object_id) => {
                    tables.remove_object_rows(attribute, object_id);
                }
            }
        }
    }
}

impl IndexRead for StagedIndexes<'_> {
    fn rows_for_value(&self, attribute: AttributeType, value: &CiString) -> Vec<IndexRow> {
        let committed = self.base.read().indexes.rows_for_value(attribute, value);

        self.overlay(attribute, committed, |row| row.value == *value)
    }

    fn rows(&self, attribute: AttributeType) -> Vec<IndexRow> {
        let committed = self.base.read().indexes.rows(attribute);

        self.overlay(attribute, committed, |_| true)
    }
}

impl IndexWrite for StagedIndexes<'_> {
    fn insert_row(&mut self, attribute: AttributeType, row: IndexRow) -> bool {
        if self
            .rows_for_value(attribute, &row.value)
            .iter()
            .any(|existing| existing.duplicates(&row))
        {
            return false;
        }
        self.ops.push(IndexOp::Insert(attribute, row));

        true
    }

    fn remove_object_rows(
        &mut self,
        attribute: AttributeType,
        object_id: ObjectId,
    ) -> Vec<IndexRow> {
        let committed = self.base.read().indexes.object_rows(attribute, object_id);
        let removed = self.overlay(attribute, committed, |row| {
            row.handle.object_id() == object_id
        });
        if !removed.is_empty() {
            self.ops.push(IndexOp::RemoveObject(attribute, object_id));
        }

        removed
    }
}


///
/// fault
///
/// Test-only fault injection, thread-local like the write-unit checkpoint
/// hooks. Each armed failure fires once.
///

pub(crate) mod fault {
    use crate::error::StorageError;

    #[cfg(test)]
    use crate::error::StorageErrorKind;

    #[cfg(test)]
    thread_local! {
        static COMMIT_FAILURES: std::cell::RefCell<Vec<StorageErrorKind>> =
            const { std::cell::RefCell::new(Vec::new()) };
        static LOOKUP_FAILURES: std::cell::RefCell<Vec<StorageErrorKind>> =
            const { std::cell::RefCell::new(Vec::new()) };
    }

    /// Fail the next `count` commits on this thread with `kind`.
    #[cfg(test)]
    pub(crate) fn fail_next_commits(kind: StorageErrorKind, count: usize) {
        COMMIT_FAILURES.with(|slot| slot.borrow_mut().extend(std::iter::repeat_n(kind, count)));
    }

    /// Fail the next `count` lookups on this thread with `kind`.
    #[cfg(test)]
    pub(crate) fn fail_next_lookups(kind: StorageErrorKind, count: usize) {
        LOOKUP_FAILURES.with(|slot| slot.borrow_mut().extend(std::iter::repeat_n(kind, count)));
    }

    #[cfg(test)]
    pub(crate) fn clear() {
        COMMIT_FAILURES.with(|slot| slot.borrow_mut().clear());
        LOOKUP_FAILURES.with(|slot| slot.borrow_mut().clear());
    }

    #[allow(clippy::missing_const_for_fn, clippy::unnecessary_wraps)]
    pub(super) fn check_commit() -> Result<(), StorageError> {
        #[cfg(test)]
        {
            if let Some(kind) = COMMIT_FAILURES.with(|slot| slot.borrow_mut().pop()) {
                return Err(StorageError::new(kind, "forced commit failure"));
            }
        }

        Ok(())
    }

    #[allow(clippy::missing_const_for_fn, clippy::unnecessary_wraps)]
    pub(super) fn check_lookup() -> Result<(), StorageError> {
        #[cfg(test)]
        {
            if let Some(kind) = LOOKUP_FAILURES.with(|slot| slot.borrow_mut().pop()) {
                return Err(StorageError::new(kind, "forced lookup failure"));
            }
        }

        Ok(())
    }
}
