//! Module: index
//! Responsibility: secondary lookup maintenance, one strategy per indexed
//! attribute type.
//! Does not own: sequencing against primary writes; the pipeline applies
//! index mutations inside the same storage transaction.

mod registry;
mod route;
mod table;
mod value;


pub use registry::{IndexDelta, IndexRegistry};
pub use route::{IndexWithOrigin, IndexWithRoute};
pub use table::{IndexRead, IndexRow, IndexTables, IndexWrite};
pub use value::{IndexWithReference, IndexWithValue};

use crate::{
    error::IndexConsistencyError,
    model::{AttributeType, CiString, Record, RecordHandle},
};

///
/// IndexStrategy
///
/// Maintains one attribute type's index table. Values are compared
/// case-insensitively; lookups of absent values return an empty list.
///

pub trait IndexStrategy: Send + Sync {
    fn attribute_type(&self) -> AttributeType;

    /// Index `value` of `record`; returns the number of rows inserted.
    fn add_to_index(
        &self,
        tables: &mut dyn IndexWrite,
        handle: &RecordHandle,
        record: &Record,
        value: &CiString,
    ) -> Result<usize, IndexConsistencyError>;

    /// Drop every row owned by `handle`; returns the number of rows removed.
    fn remove_from_index(&self, tables: &mut dyn IndexWrite, handle: &RecordHandle) -> usize {
        tables
            .remove_object_rows(self.attribute_type(), handle.object_id())
            .len()
    }

    fn find_in_index(&self, tables: &dyn IndexRead, value: &CiString) -> Vec<RecordHandle>;
}
