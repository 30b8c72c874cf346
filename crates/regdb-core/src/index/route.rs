use crate::{
    error::IndexConsistencyError,
    index::{IndexRead, IndexRow, IndexStrategy, IndexWrite},
    model::{AttributeType, CiString, Record, RecordHandle},
};

fn require_route(handle: &RecordHandle) -> Result<(), IndexConsistencyError> {
    if handle.object_type().is_route() {
        Ok(())
    } else {
        Err(IndexConsistencyError::WrongObjectType {
            handle: handle.clone(),
            expected: "route or route6",
        })
    }
}

// Prefix followed by origin, e.g. "180.0/8" + "AS12726".
fn composite(prefix: &CiString, origin: &CiString) -> CiString {
    CiString::new(format!("{prefix}{origin}"))
}

///
/// IndexWithRoute
///
/// `route` / `route6` rows keyed by the composite prefix+origin value.
///

#[derive(Clone, Copy, Debug)]
pub struct IndexWithRoute {
    attribute: AttributeType,
}

impl IndexWithRoute {
    #[must_use]
    pub const fn new(attribute: AttributeType) -> Self {
        Self { attribute }
    }
}

impl IndexStrategy for IndexWithRoute {
    fn attribute_type(&self) -> AttributeType {
        self.attribute
    }

    fn add_to_index(
        &self,
        tables: &mut dyn IndexWrite,
        handle: &RecordHandle,
        record: &Record,
        value: &CiString,
    ) -> Result<usize, IndexConsistencyError> {
        require_route(handle)?;

        let mut inserted = 0;
        for origin in record.values(AttributeType::Origin) {
            let row = IndexRow::composite(composite(value, &origin), value.clone(), handle.clone());
            inserted += usize::from(tables.insert_row(self.attribute, row));
        }

        Ok(inserted)
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
/// IndexWithOrigin
///
/// `origin` rows store the composite prefix+origin value. Lookups by origin
/// scan the origin component, so one search aggregates route and route6
/// records in insertion order. Returned handles carry the composite key.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct IndexWithOrigin;

impl IndexStrategy for IndexWithOrigin {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::Origin
    }

    fn add_to_index(
        &self,
        tables: &mut dyn IndexWrite,
        handle: &RecordHandle,
        record: &Record,
        value: &CiString,
    ) -> Result<usize, IndexConsistencyError> {
        require_route(handle)?;

        let type_attribute = handle.object_type().type_attribute();
        let mut inserted = 0;
        for prefix in record.values(type_attribute) {
            let key = composite(&prefix, value);
            let row = IndexRow::composite(key.clone(), value.clone(), handle.with_key(key));
            inserted += usize::from(tables.insert_row(AttributeType::Origin, row));
        }

        Ok(inserted)
    }

    fn find_in_index(&self, tables: &dyn IndexRead, value: &CiString) -> Vec<RecordHandle> {
        let suffix = value.normalized();

        tables
            .rows(AttributeType::Origin)
            .into_iter()
            .filter(|row| row.component.as_ref() == Some(value))
            .filter(|row| row.value.normalized().ends_with(&suffix))
            .map(|row| row.handle)
            .collect()
    }
}
