use crate::{
    error::UpdateError,
    model::{AttributeType, CiString, ObjectType},
    update::{Action, PreparedUpdate, UpdateContext, messages},
    validate::BusinessRuleValidator,
};

const OTHER: &str = "OTHER";

///
/// OrgTypeValidator
///
/// Any org-type other than OTHER is assigned by the registry.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct OrgTypeValidator;

impl BusinessRuleValidator for OrgTypeValidator {
    fn name(&self) -> &'static str {
        "org-type"
    }

    fn types(&self) -> &[ObjectType] {
        &[ObjectType::Organisation]
    }

    fn actions(&self) -> &[Action] {
        &[Action::Create, Action::Modify]
    }

    fn validate(
        &self,
        update: &PreparedUpdate,
        ctx: &mut UpdateContext,
    ) -> Result<(), UpdateError> {
        let Some(org_type) = update
            .submitted()
            .and_then(|submitted| submitted.value(AttributeType::OrgType))
        else {
            return Ok(());
        };
        if org_type == CiString::new(OTHER) || ctx.subject().is_privileged() {
            return Ok(());
        }

        // unchanged
        let previous = update
            .reference()
            .and_then(|reference| reference.value(AttributeType::OrgType));
        if previous.as_ref() == Some(&org_type) {
            return Ok(());
        }

        ctx.add_attribute_message(
            update,
            AttributeType::OrgType,
            messages::org_type_requires_allocation_authority(&org_type),
        );

        Ok(())
    }
}
