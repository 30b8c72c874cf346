use crate::{
    error::UpdateError,
    model::{AttributeType, ObjectType},
    update::{Action, PreparedUpdate, UpdateContext, messages},
    validate::BusinessRuleValidator,
};

const DEPRECATED: &[AttributeType] = &[AttributeType::Changed];

///
/// DeprecatedAttributeValidator
///
/// Warns about deprecated attributes in a submission; never blocks.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DeprecatedAttributeValidator;

impl BusinessRuleValidator for DeprecatedAttributeValidator {
    fn name(&self) -> &'static str {
        "deprecated-attribute"
    }

    fn types(&self) -> &[ObjectType] {
        ObjectType::ALL
    }

    fn actions(&self) -> &[Action] {
        &[Action::Create, Action::Modify]
    }

    fn validate(
        &self,
        update: &PreparedUpdate,
        ctx: &mut UpdateContext,
    ) -> Result<(), UpdateError> {
        let Some(submitted) = update.submitted() else {
            return Ok(());
        };

        for &attribute in DEPRECATED {
            if submitted.contains(attribute) {
                ctx.add_attribute_message(update, attribute, messages::deprecated_attribute(attribute));
            }
        }

        Ok(())
    }
}
