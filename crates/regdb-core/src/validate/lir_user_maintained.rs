use crate::{
    error::UpdateError,
    model::{AttributeType, CiString, ObjectType, Record},
    update::{Action, PreparedUpdate, UpdateContext, messages},
    validate::BusinessRuleValidator,
};

const LIR: &str = "LIR";

const USER_MAINTAINED: &[AttributeType] = &[
    AttributeType::Address,
    AttributeType::Phone,
    AttributeType::FaxNo,
    AttributeType::EMail,
    AttributeType::OrgName,
];

///
/// LirUserMaintainedAttributesValidator
///
/// Contact details of LIR organisations are owned by the member portal.
/// Only override and allocation maintainers may change them here.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct LirUserMaintainedAttributesValidator;

impl LirUserMaintainedAttributesValidator {
    fn changed(attribute: AttributeType, reference: &Record, submitted: &Record) -> bool {
        let before = reference.values(attribute);
        let after = submitted.values(attribute);

        if attribute == AttributeType::OrgName {
            before.len() != after.len()
                || before
                    .iter()
                    .zip(&after)
                    .any(|(before, after)| !before.eq_exact(after))
        } else {
            before != after
        }
    }
}

impl BusinessRuleValidator for LirUserMaintainedAttributesValidator {
    fn name(&self) -> &'static str {
        "lir-user-maintained-attributes"
    }

    fn types(&self) -> &[ObjectType] {
        &[ObjectType::Organisation]
    }

    fn actions(&self) -> &[Action] {
        &[Action::Modify]
    }

    fn validate(
        &self,
        update: &PreparedUpdate,
        ctx: &mut UpdateContext,
    ) -> Result<(), UpdateError> {
        if ctx.subject().is_privileged() {
            return Ok(());
        }
        let (Some(reference), Some(submitted)) = (update.reference(), update.submitted()) else {
            return Ok(());
        };
        if reference.value(AttributeType::OrgType) != Some(CiString::new(LIR)) {
            return Ok(());
        }

        for &attribute in USER_MAINTAINED {
            if Self::changed(attribute, reference, submitted) {
                ctx.add_attribute_message(
                    update,
                    attribute,
                    messages::can_only_be_changed_in_lir_portal(attribute),
                );
            }
        }

        Ok(())
    }
}
