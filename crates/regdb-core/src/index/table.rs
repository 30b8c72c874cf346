use crate::model::{AttributeType, CiString, ObjectId, RecordHandle};
use std::collections::{BTreeMap, BTreeSet};

///
/// IndexRow
///
/// One row of an attribute's index table: the indexed-value column, the
/// referenced-attribute component for composite rows, and the owner.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexRow {
    pub value: CiString,
    pub component: Option<CiString>,
    pub handle: RecordHandle,
}

impl IndexRow {
    #[must_use]
    pub const fn new(value: CiString, handle: RecordHandle) -> Self {
        Self {
            value,
            component: None,
            handle,
        }
    }

    #[must_use]
    pub const fn composite(value: CiString, component: CiString, handle: RecordHandle) -> Self {
        Self {
            value,
            component: Some(component),
            handle,
        }
    }

    /// Same value, component and owner: the table keeps one of them.
    #[must_use]
    pub fn duplicates(&self, other: &Self) -> bool {
        self.value == other.value
            && self.component == other.component
            && self.handle.object_id() == other.handle.object_id()
    }
}

///
/// IndexRead
///

pub trait IndexRead {
    /// Rows whose indexed-value column equals `value`, in insertion order.
    fn rows_for_value(&self, attribute: AttributeType, value: &CiString) -> Vec<IndexRow>;

    /// Every row of one table, in insertion order.
    fn rows(&self, attribute: AttributeType) -> Vec<IndexRow>;
}

///
/// IndexWrite
///

pub trait IndexWrite: IndexRead {
    /// Insert a row; returns `false` when an identical row already exists.
    fn insert_row(&mut self, attribute: AttributeType, row: IndexRow) -> bool;

    /// Remove every row owned by `object_id`; returns the removed rows.
    fn remove_object_rows(&mut self, attribute: AttributeType, object_id: ObjectId)
    -> Vec<IndexRow>;
}

///
/// IndexTables
///
/// In-memory index tables, one per attribute type. Rows keep a sequence
/// number so scans are stable by insertion.
///

#[derive(Clone, Debug, Default)]
pub struct IndexTables {
    tables: BTreeMap<AttributeType, IndexTable>,
}

#[derive(Clone, Debug, Default)]
struct IndexTable {
    next_seq: u64,
    rows: BTreeMap<u64, IndexRow>,
    by_value: BTreeMap<CiString, BTreeSet<u64>>,
    by_object: BTreeMap<ObjectId, BTreeSet<u64>>,
}

impl IndexTable {
    fn collect(&self, seqs: Option<&BTreeSet<u64>>) -> Vec<IndexRow> {
        seqs.into_iter()
            .flatten()
            .filter_map(|seq| self.rows.get(seq).cloned())
            .collect()
    }

    fn insert(&mut self, row: IndexRow) -> bool {
        if self
            .collect(self.by_value.get(&row.value))
            .iter()
            .any(|existing| existing.duplicates(&row))
        {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_value.entry(row.value.clone()).or_default().insert(seq);
        self.by_object
            .entry(row.handle.object_id())
            .or_default()
            .insert(seq);
        self.rows.insert(seq, row);

        true
    }

    fn remove_object(&mut self, object_id: ObjectId) -> Vec<IndexRow> {
        let Some(seqs) = self.by_object.remove(&object_id) else {
            return Vec::new();
        };

        let mut removed = Vec::with_capacity(seqs.len());
        for seq in seqs {
            let Some(row) = self.rows.remove(&seq) else {
                continue;
            };
            if let Some(value_seqs) = self.by_value.get_mut(&row.value) {
                value_seqs.remove(&seq);
                if value_seqs.is_empty() {
                    self.by_value.remove(&row.value);
                }
            }
            removed.push(row);
        }

        removed
    }
}

impl IndexTables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total row count across every table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.values().map(|table| table.rows.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows owned by one object, in insertion order.
    #[must_use]
    pub fn object_rows(&self, attribute: AttributeType, object_id: ObjectId) -> Vec<IndexRow> {
        self.tables
            .get(&attribute)
            .map(|table| table.collect(table.by_object.get(&object_id)))
            .unwrap_or_default()
    }
}

impl IndexRead for IndexTables {
    fn rows_for_value(&self, attribute: AttributeType, value: &CiString) -> Vec<IndexRow> {
        self.tables
            .get(&attribute)
            .map(|table| table.collect(table.by_value.get(value)))
            .unwrap_or_default()
    }

    fn rows(&self, attribute: AttributeType) -> Vec<IndexRow> {
        self.tables
            .get(&attribute)
            .map(|table| table.rows.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl IndexWrite for IndexTables {
    fn insert_row(&mut self, attribute: AttributeType, row: IndexRow) -> bool {
        self.tables.entry(attribute).or_default().insert(row)
    }

    fn remove_object_rows(
        &mut self,
        attribute: AttributeType,
        object_id: ObjectId,
    ) -> Vec<IndexRow> {
        let Some(table) = self.tables.get_mut(&attribute) else {
            return Vec::new();
        };
        let removed = table.remove_object(object_id);
        if table.rows.is_empty() {
            self.tables.remove(&attribute);
        }

        removed
    }
}
