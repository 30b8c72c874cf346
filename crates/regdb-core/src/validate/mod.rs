//! Module: validate
//! Responsibility: business rules that run after authentication and report
//! violations as context messages.
//! Does not own: access control or the decision to persist.

mod deprecated_attribute;
mod lir_user_maintained;
mod org_type;
mod referenced_object;

#[cfg(test)]
mod tests;

pub use deprecated_attribute::DeprecatedAttributeValidator;
pub use lir_user_maintained::LirUserMaintainedAttributesValidator;
pub use org_type::OrgTypeValidator;
pub use referenced_object::ReferencedObjectValidator;

use crate::{
    error::UpdateError,
    index::IndexRegistry,
    model::ObjectType,
    store::RecordStore,
    update::{Action, PreparedUpdate, UpdateContext},
};
use std::sync::Arc;
use tracing::debug;

///
/// BusinessRuleValidator
///
/// One policy rule scoped by object type and action. A rule violation is a
/// message on the context, never an `Err`; `Err` is reserved for failures to
/// evaluate the rule at all.
///

pub trait BusinessRuleValidator: Send + Sync {
    fn name(&self) -> &'static str;

    fn types(&self) -> &[ObjectType];

    fn actions(&self) -> &[Action];

    fn validate(&self, update: &PreparedUpdate, ctx: &mut UpdateContext)
    -> Result<(), UpdateError>;

    fn applies_to(&self, update: &PreparedUpdate) -> bool {
        self.types().contains(&update.object_type()) && self.actions().contains(&update.action())
    }
}

///
/// ValidatorRegistry
///
/// Validators populated at startup, run in insertion order.
///

#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: Vec<Arc<dyn BusinessRuleValidator>>,
}

impl ValidatorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_defaults(store: Arc<dyn RecordStore>, indexes: Arc<IndexRegistry>) -> Self {
        Self::new()
            .with(LirUserMaintainedAttributesValidator)
            .with(OrgTypeValidator)
            .with(ReferencedObjectValidator::new(store, indexes))
            .with(DeprecatedAttributeValidator)
    }

    #[must_use]
    pub fn with(mut self, validator: impl BusinessRuleValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.validators.iter().map(|validator| validator.name())
    }

    /// Run every applicable validator, then block on any error message they
    /// added. All applicable rules run before blocking, so the submitter sees
    /// every violation at once.
    pub fn validate(
        &self,
        update: &PreparedUpdate,
        ctx: &mut UpdateContext,
    ) -> Result<(), UpdateError> {
        let first_new = ctx.messages().len();

        for validator in self
            .validators
            .iter()
            .filter(|validator| validator.applies_to(update))
        {
            validator.validate(update, ctx)?;
        }

        let blocking = ctx.messages()[first_new..]
            .iter()
            .filter(|entry| entry.message.is_error())
            .map(|entry| entry.message.text().to_string())
            .collect::<Vec<_>>();

        debug!(
            update = %ctx.id(),
            added = ctx.messages().len() - first_new,
            blocking = blocking.len(),
            "validation finished"
        );

        if blocking.is_empty() {
            Ok(())
        } else {
            Err(UpdateError::ValidationFailed { messages: blocking })
        }
    }
}
