use super::*;
use crate::{
    auth::{Principal, Subject},
    model::{AttributeType, ObjectType},
    store::MemoryStore,
    test_support::{empty_store, mntner, password_context, record, seeded_store, stored},
    update::prepare,
};

const LIR_ORG: &str = "organisation: ORG-LIR1\n\
org-name: Lir One\n\
org-type: LIR\n\
address: Main Street 1\n\
phone: +31 20 000 0000\n\
e-mail: noc@lir.example\n\
mnt-by: OWNER-MNT\n";

fn registry(store: &Arc<MemoryStore>) -> ValidatorRegistry {
    ValidatorRegistry::with_defaults(store.clone(), Arc::new(IndexRegistry::with_defaults()))
}

fn modify(reference: &str, submitted: &str) -> PreparedUpdate {
    prepare(Some(record(reference)), Some(record(submitted)), false).expect("modify prepares")
}

fn attributes_flagged(ctx: &UpdateContext) -> Vec<AttributeType> {
    ctx.messages()
        .iter()
        .filter_map(|entry| entry.attribute)
        .collect()
}

//
// lir user maintained attributes
//

#[test]
fn phone_change_by_plain_maintainer_is_flagged_once() {
    let store = empty_store();
    let update = modify(LIR_ORG, &LIR_ORG.replace("+31 20 000 0000", "+31 20 999 9999"));
    let mut ctx = password_context("any");

    let err = registry(&store)
        .validate(&update, &mut ctx)
        .expect_err("portal-owned attribute changed");

    assert_eq!(attributes_flagged(&ctx), vec![AttributeType::Phone]);
    assert_eq!(ctx.messages().len(), 1, "no other validator speaks");
    assert!(matches!(err, UpdateError::ValidationFailed { messages } if messages.len() == 1));
}

#[test]
fn phone_change_by_override_is_silent() {
    let store = empty_store();
    let update = modify(LIR_ORG, &LIR_ORG.replace("+31 20 000 0000", "+31 20 999 9999"));
    let mut ctx = password_context("any");
    ctx.set_subject(Subject::override_subject());

    registry(&store)
        .validate(&update, &mut ctx)
        .expect("override may edit contact details");

    assert!(ctx.messages().is_empty());
}

#[test]
fn alloc_maintainer_may_edit_contact_details() {
    let store = empty_store();
    let update = modify(LIR_ORG, &LIR_ORG.replace("Main Street 1", "Side Street 2"));
    let mut ctx = password_context("any");
    let mut subject = Subject::default();
    subject.grant(Principal::AllocMaintainer);
    ctx.set_subject(subject);

    assert!(registry(&store).validate(&update, &mut ctx).is_ok());
}

#[test]
fn contact_comparison_is_normalized_except_org_name() {
    let validator = LirUserMaintainedAttributesValidator;

    let spacing = modify(
        LIR_ORG,
        &LIR_ORG.replace("noc@lir.example", "NOC@LIR.example  # primary"),
    );
    let mut ctx = password_context("any");
    validator.validate(&spacing, &mut ctx).expect("validator runs");
    assert!(ctx.messages().is_empty(), "case and comments are not changes");

    let renamed = modify(LIR_ORG, &LIR_ORG.replace("Lir One", "LIR ONE"));
    let mut ctx = password_context("any");
    validator.validate(&renamed, &mut ctx).expect("validator runs");
    assert_eq!(attributes_flagged(&ctx), vec![AttributeType::OrgName]);
}

#[test]
fn every_changed_attribute_gets_its_own_message() {
    let submitted = LIR_ORG
        .replace("Main Street 1", "Side Street 2")
        .replace("+31 20 000 0000", "+31 20 999 9999")
        .replace("Lir One", "Lir Two")
        .replace("e-mail: noc@lir.example\n", "");
    let update = modify(LIR_ORG, &submitted);
    let mut ctx = password_context("any");

    LirUserMaintainedAttributesValidator
        .validate(&update, &mut ctx)
        .expect("validator runs");

    assert_eq!(
        attributes_flagged(&ctx),
        vec![
            AttributeType::Address,
            AttributeType::Phone,
            AttributeType::EMail,
            AttributeType::OrgName,
        ]
    );
}

#[test]
fn non_lir_organisations_are_unrestricted() {
    let reference = LIR_ORG.replace("org-type: LIR", "org-type: OTHER");
    let update = modify(&reference, &reference.replace("+31 20 000 0000", "+31 20 999 9999"));
    let mut ctx = password_context("any");

    LirUserMaintainedAttributesValidator
        .validate(&update, &mut ctx)
        .expect("validator runs");

    assert!(ctx.messages().is_empty());
}

//
// org-type
//

#[test]
fn org_type_other_than_other_needs_allocation_authority() {
    let store = empty_store();
    let validators = registry(&store);
    let text = "organisation: ORG-NEW1\norg-name: New\norg-type: LIR\nmnt-by: OWNER-MNT\n";

    let update = prepare(None, Some(record(text)), false).expect("create prepares");
    let mut ctx = password_context("any");
    assert!(validators.validate(&update, &mut ctx).is_err());
    assert_eq!(attributes_flagged(&ctx), vec![AttributeType::OrgType]);

    let mut ctx = password_context("any");
    let mut subject = Subject::default();
    subject.grant(Principal::AllocMaintainer);
    ctx.set_subject(subject);
    assert!(validators.validate(&update, &mut ctx).is_ok());
}

#[test]
fn unchanged_org_type_is_accepted() {
    let update = modify(LIR_ORG, &LIR_ORG.replace("org-type: LIR", "org-type: lir"));
    let mut ctx = password_context("any");

    OrgTypeValidator
        .validate(&update, &mut ctx)
        .expect("validator runs");

    assert!(ctx.messages().is_empty());
}

//
// referenced object
//

#[test]
fn referenced_objects_cannot_be_deleted() {
    let store = seeded_store([
        mntner("OWNER-MNT", "owner"),
        mntner("LONE-MNT", "lone"),
        record("person: Jo\nnic-hdl: JO1-TEST\nmnt-by: OWNER-MNT\n"),
    ]);
    let validators = registry(&store);

    let owner = stored(&store, ObjectType::Mntner, "OWNER-MNT");
    let update = prepare(Some(owner), None, true).expect("delete prepares");
    let mut ctx = password_context("owner");
    let err = validators
        .validate(&update, &mut ctx)
        .expect_err("JO1-TEST still points at OWNER-MNT");
    assert!(matches!(err, UpdateError::ValidationFailed { .. }));
    assert!(ctx.messages()[0].message.text().contains("[person] JO1-TEST"));

    let lone = stored(&store, ObjectType::Mntner, "LONE-MNT");
    let update = prepare(Some(lone), None, true).expect("delete prepares");
    let mut ctx = password_context("lone");
    assert!(
        validators.validate(&update, &mut ctx).is_ok(),
        "a self-reference does not keep an object alive"
    );
}

//
// deprecated attribute
//

#[test]
fn deprecated_attributes_warn_without_blocking() {
    let store = empty_store();
    let update = prepare(
        None,
        Some(record(
            "person: Jo\nnic-hdl: JO1-TEST\nchanged: jo@example.net 20010101\nmnt-by: OWNER-MNT\n",
        )),
        false,
    )
    .expect("create prepares");
    let mut ctx = password_context("any");

    registry(&store)
        .validate(&update, &mut ctx)
        .expect("warnings do not block");

    assert_eq!(attributes_flagged(&ctx), vec![AttributeType::Changed]);
    assert!(!ctx.has_errors());
}

#[test]
fn default_registry_lists_every_rule_in_order() {
    let names: Vec<_> = registry(&empty_store()).names().collect();

    assert_eq!(
        names,
        vec![
            "lir-user-maintained-attributes",
            "org-type",
            "referenced-object",
            "deprecated-attribute",
        ]
    );
}
