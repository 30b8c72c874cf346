use crate::{
    error::IndexConsistencyError,
    index::{
        IndexRead, IndexStrategy, IndexWithOrigin, IndexWithReference, IndexWithRoute,
        IndexWithValue, IndexWrite,
    },
    model::{AttributeType, CiString, Record, RecordHandle},
};
use std::{collections::BTreeMap, sync::Arc};

///
/// IndexDelta
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IndexDelta {
    pub inserts: u64,
    pub removes: u64,
}

impl IndexDelta {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inserts == 0 && self.removes == 0
    }
}

///
/// IndexRegistry
///
/// Attribute type → index strategy, resolved once at startup.
///

#[derive(Clone, Default)]
pub struct IndexRegistry {
    strategies: BTreeMap<AttributeType, Arc<dyn IndexStrategy>>,
}

impl IndexRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry's standard strategy map.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        for attribute in [
            AttributeType::Mntner,
            AttributeType::Organisation,
            AttributeType::NicHdl,
            AttributeType::AutNum,
            AttributeType::Irt,
            AttributeType::Inetnum,
            AttributeType::Inet6num,
        ] {
            registry = registry.with(IndexWithValue::new(attribute));
        }

        for attribute in [
            AttributeType::MntBy,
            AttributeType::MntRef,
            AttributeType::Org,
            AttributeType::MntIrt,
            AttributeType::MntRoutes,
            AttributeType::AdminC,
            AttributeType::TechC,
        ] {
            registry = registry.with(IndexWithReference::new(attribute));
        }

        registry
            .with(IndexWithRoute::new(AttributeType::Route))
            .with(IndexWithRoute::new(AttributeType::Route6))
            .with(IndexWithOrigin)
    }

    /// Register a strategy, replacing any previous one for its attribute.
    #[must_use]
    pub fn with(mut self, strategy: impl IndexStrategy + 'static) -> Self {
        self.strategies
            .insert(strategy.attribute_type(), Arc::new(strategy));
        self
    }

    #[must_use]
    pub fn get(&self, attribute: AttributeType) -> Option<&dyn IndexStrategy> {
        self.strategies.get(&attribute).map(Arc::as_ref)
    }

    pub fn indexed_attributes(&self) -> impl Iterator<Item = AttributeType> + '_ {
        self.strategies.keys().copied()
    }

    pub fn find(
        &self,
        tables: &dyn IndexRead,
        attribute: AttributeType,
        value: &CiString,
    ) -> Result<Vec<RecordHandle>, IndexConsistencyError> {
        let strategy = self
            .get(attribute)
            .ok_or(IndexConsistencyError::Unindexed { attribute })?;

        Ok(strategy.find_in_index(tables, value))
    }

    /// Bring the rows of `handle` in line with a record transition.
    ///
    /// For every indexed attribute whose values differ between `before` and
    /// `after`, the object's rows are removed and rebuilt from `after`.
    /// `before = None` is a create, `after = None` a delete.
    pub fn reindex(
        &self,
        tables: &mut dyn IndexWrite,
        handle: &RecordHandle,
        before: Option<&Record>,
        after: Option<&Record>,
    ) -> Result<IndexDelta, IndexConsistencyError> {
        let mut delta = IndexDelta::default();

        for (attribute, strategy) in &self.strategies {
            let old_values = before.map(|record| record.values(*attribute)).unwrap_or_default();
            let new_values = after.map(|record| record.values(*attribute)).unwrap_or_default();
            if old_values.is_empty() && new_values.is_empty() {
                continue;
            }
            if before.is_some() && after.is_some() && same_values(&old_values, &new_values) {
                continue;
            }

            let removed = strategy.remove_from_index(tables, handle);
            delta.removes += removed as u64;

            let Some(record) = after else {
                continue;
            };
            for value in &new_values {
                let inserted = strategy.add_to_index(tables, handle, record, value)?;
                delta.inserts += inserted as u64;
            }
        }

        Ok(delta)
    }
}

fn same_values(left: &[CiString], right: &[CiString]) -> bool {
    left.len() == right.len() && left.iter().all(|value| right.contains(value))
}
