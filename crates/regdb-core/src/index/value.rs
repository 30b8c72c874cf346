use crate::{
    error::IndexConsistencyError,
    index::{IndexRead, IndexRow, IndexStrategy, IndexWrite},
    model::{AttributeType, CiString, Record, RecordHandle},
};

///
/// IndexWithValue
///
/// Lookup-key attributes: at most one live owner per value.
///

#[derive(Clone, Copy, Debug)]
pub struct IndexWithValue {
    attribute: AttributeType,
}

impl IndexWithValue {
    #[must_use]
    pub const fn new(attribute: AttributeType) -> Self {
        Self { attribute }
    }
}

impl IndexStrategy for IndexWithValue {
    fn attribute_type(&self) -> AttributeType {
        self.attribute
    }

    fn add_to_index(
        &self,
        tables: &mut dyn IndexWrite,
        handle: &RecordHandle,
        _record: &Record,
        value: &CiString,
    ) -> Result<usize, IndexConsistencyError> {
        let existing = tables.rows_for_value(self.attribute, value);
        if let Some(owner) = existing
            .iter()
            .find(|row| row.handle.object_id() != handle.object_id())
        {
            return Err(IndexConsistencyError::DuplicateValue {
                attribute: self.attribute,
                value: value.clone(),
                owner: owner.handle.clone(),
            });
        }

        let inserted = tables.insert_row(self.attribute, IndexRow::new(value.clone(), handle.clone()));

        Ok(usize::from(inserted))
    }

    fn find_in_index(&self, tables: &dyn IndexRead, value: &CiString) -> Vec<RecordHandle> {
        tables
            .rows_for_value(self.attribute, value)
            .into_iter()
            .map(|row| row.handle)
            .collect()
    }
}

///
/// IndexWithReference
///
/// Reference attributes: many records may point at the same key.
///

#[derive(Clone, Copy, Debug)]
pub struct IndexWithReference {
    attribute: AttributeType,
}

impl IndexWithReference {
    #[must_use]
    pub const fn new(attribute: AttributeType) -> Self {
        Self { attribute }
    }
}

impl IndexStrategy for IndexWithReference {
    fn attribute_type(&self) -> AttributeType {
        self.attribute
    }

    fn add_to_index(
        &self,
        tables: &mut dyn IndexWrite,
        handle: &RecordHandle,
        _record: &Record,
        value: &CiString,
    ) -> Result<usize, IndexConsistencyError> {
        let inserted = tables.insert_row(self.attribute, IndexRow::new(value.clone(), handle.clone()));

        Ok(usize::from(inserted))
    }

    fn find_in_index(&self, tables: &dyn IndexRead, value: &CiString) -> Vec<RecordHandle> {
        let mut handles: Vec<RecordHandle> = Vec::new();
        for row in tables.rows_for_value(self.attribute, value) {
            if !handles
                .iter()
                .any(|seen| seen.object_id() == row.handle.object_id())
            {
                handles.push(row.handle);
            }
        }

        handles
    }
}
