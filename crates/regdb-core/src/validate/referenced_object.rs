use crate::{
    error::UpdateError,
    index::IndexRegistry,
    model::{CiString, ObjectType},
    store::RecordStore,
    update::{Action, PreparedUpdate, UpdateContext, messages},
    validate::BusinessRuleValidator,
};
use std::sync::Arc;

///
/// ReferencedObjectValidator
///
/// An object another object still points at cannot be deleted. References
/// are found through the reference indexes; self-references do not count.
///

pub struct ReferencedObjectValidator {
    store: Arc<dyn RecordStore>,
    indexes: Arc<IndexRegistry>,
}

impl ReferencedObjectValidator {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, indexes: Arc<IndexRegistry>) -> Self {
        Self { store, indexes }
    }
}

impl BusinessRuleValidator for ReferencedObjectValidator {
    fn name(&self) -> &'static str {
        "referenced-object"
    }

    fn types(&self) -> &[ObjectType] {
        ObjectType::ALL
    }

    fn actions(&self) -> &[Action] {
        &[Action::Delete]
    }

    fn validate(
        &self,
        update: &PreparedUpdate,
        ctx: &mut UpdateContext,
    ) -> Result<(), UpdateError> {
        let object_type = update.object_type();
        let key = update.key();

        let mut referrers: Vec<CiString> = Vec::new();
        for &attribute in object_type.referenced_by() {
            if self.indexes.get(attribute).is_none() {
                continue;
            }

            for handle in self.store.find_in_index(&self.indexes, attribute, key)? {
                if handle.object_type() == object_type && handle.key() == key {
                    continue;
                }

                let referrer = CiString::new(format!("[{}] {}", handle.object_type(), handle.key()));
                if !referrers.contains(&referrer) {
                    referrers.push(referrer);
                }
            }
        }

        if !referrers.is_empty() {
            ctx.add_message(update, messages::object_in_use(object_type, key, &referrers));
        }

        Ok(())
    }
}
