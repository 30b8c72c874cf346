use crate::{
    error::MalformedUpdateError,
    model::{AttributeType, CiString, ObjectType, Record},
    update::Action,
};
use std::collections::BTreeSet;

///
/// PreparedUpdate
///
/// A reference record (current persisted state) paired with a submitted
/// record, plus the derived action. At least one record is always present.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PreparedUpdate {
    records: Records,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Records {
    Create {
        submitted: Record,
    },
    Modify {
        reference: Record,
        submitted: Record,
    },
    Delete {
        reference: Record,
        submitted: Option<Record>,
    },
}

/// Derive the action for a proposed change and check its shape.
///
/// CREATE iff no reference and no delete request; DELETE iff requested;
/// otherwise MODIFY, which must keep the object type and primary key.
pub fn prepare(
    reference: Option<Record>,
    submitted: Option<Record>,
    delete_requested: bool,
) -> Result<PreparedUpdate, MalformedUpdateError> {
    let records = match (reference, submitted, delete_requested) {
        (None, None, _) => return Err(MalformedUpdateError::BothAbsent),
        (None, Some(_), true) => return Err(MalformedUpdateError::DeleteWithoutReference),
        (None, Some(submitted), false) => Records::Create { submitted },
        (Some(reference), submitted, true) => {
            if let Some(submitted) = &submitted {
                check_same_identity(&reference, submitted)?;
            }
            Records::Delete {
                reference,
                submitted,
            }
        }
        (Some(_), None, false) => return Err(MalformedUpdateError::MissingSubmission),
        (Some(reference), Some(submitted), false) => {
            check_same_identity(&reference, &submitted)?;
            Records::Modify {
                reference,
                submitted,
            }
        }
    };

    Ok(PreparedUpdate { records })
}

fn check_same_identity(reference: &Record, submitted: &Record) -> Result<(), MalformedUpdateError> {
    if reference.object_type() != submitted.object_type() {
        return Err(MalformedUpdateError::TypeMismatch {
            reference: reference.object_type(),
            submitted: submitted.object_type(),
        });
    }
    if reference.key() != submitted.key() {
        return Err(MalformedUpdateError::KeyMismatch {
            reference: reference.key().clone(),
            submitted: submitted.key().clone(),
        });
    }

    Ok(())
}

impl PreparedUpdate {
    #[must_use]
    pub const fn action(&self) -> Action {
        match self.records {
            Records::Create { .. } => Action::Create,
            Records::Modify { .. } => Action::Modify,
            Records::Delete { .. } => Action::Delete,
        }
    }

    #[must_use]
    pub const fn reference(&self) -> Option<&Record> {
        match &self.records {
            Records::Create { .. } => None,
            Records::Modify { reference, .. } | Records::Delete { reference, .. } => Some(reference),
        }
    }

    #[must_use]
    pub const fn submitted(&self) -> Option<&Record> {
        match &self.records {
            Records::Create { submitted } | Records::Modify { submitted, .. } => Some(submitted),
            Records::Delete { submitted, .. } => submitted.as_ref(),
        }
    }

    /// The record the update is about: the submission, or the reference
    /// when nothing was submitted.
    #[must_use]
    pub fn updated(&self) -> &Record {
        match &self.records {
            Records::Create { submitted } | Records::Modify { submitted, .. } => submitted,
            Records::Delete {
                reference,
                submitted,
            } => submitted.as_ref().unwrap_or(reference),
        }
    }

    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        self.updated().object_type()
    }

    #[must_use]
    pub fn key(&self) -> &CiString {
        self.updated().key()
    }

    /// Values of `attribute_type` present in the submission but not in the
    /// reference. Empty for deletions.
    #[must_use]
    pub fn new_values(&self, attribute_type: AttributeType) -> BTreeSet<CiString> {
        if self.action() == Action::Delete {
            return BTreeSet::new();
        }
        let Some(submitted) = self.submitted() else {
            return BTreeSet::new();
        };

        let mut values = submitted.value_set(attribute_type);
        if let Some(reference) = self.reference() {
            for existing in reference.values(attribute_type) {
                values.remove(&existing);
            }
        }

        values
    }

    /// Values of `attribute_type` on the record whose authority governs the
    /// change: the reference for MODIFY/DELETE, the submission for CREATE.
    #[must_use]
    pub fn governing_values(&self, attribute_type: AttributeType) -> Vec<CiString> {
        let governing = match self.action() {
            Action::Create => self.submitted(),
            Action::Modify | Action::Delete => self.reference(),
        };

        governing
            .map(|record| record.values(attribute_type))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn org(text: &str) -> Record {
        Record::parse(text).expect("fixture parses")
    }

    fn organisation(key: &str) -> Record {
        org(&format!("organisation: {key}\norg-name: Test\n"))
    }

    #[test]
    fn both_absent_is_malformed() {
        assert_eq!(prepare(None, None, false), Err(MalformedUpdateError::BothAbsent));
        assert_eq!(prepare(None, None, true), Err(MalformedUpdateError::BothAbsent));
    }

    #[test]
    fn delete_without_reference_fails_fast() {
        assert_eq!(
            prepare(None, Some(organisation("ORG-A")), true),
            Err(MalformedUpdateError::DeleteWithoutReference)
        );
    }

    #[test]
    fn modify_must_keep_type_and_key() {
        let mntner = org("mntner: ORG-A\n");
        assert!(matches!(
            prepare(Some(organisation("ORG-A")), Some(mntner), false),
            Err(MalformedUpdateError::TypeMismatch { .. })
        ));
        assert!(matches!(
            prepare(Some(organisation("ORG-A")), Some(organisation("ORG-B")), false),
            Err(MalformedUpdateError::KeyMismatch { .. })
        ));
        assert!(
            prepare(Some(organisation("ORG-A")), Some(organisation("org-a")), false).is_ok(),
            "keys compare case-insensitively"
        );
    }

    #[test]
    fn new_values_returns_added_values_only() {
        let reference = org("organisation: ORG-A\norg: ORG1\n");
        let submitted = org("organisation: ORG-A\norg: org1\norg: ORG2\n");
        let update = prepare(Some(reference), Some(submitted), false).expect("valid modify");

        assert_eq!(
            update.new_values(AttributeType::Org).into_iter().collect::<Vec<_>>(),
            vec![CiString::new("ORG2")]
        );
        assert!(update.new_values(AttributeType::MntRef).is_empty());
    }

    #[test]
    fn delete_has_no_new_values() {
        let reference = org("organisation: ORG-A\norg: ORG1\n");
        let update = prepare(Some(reference), None, true).expect("valid delete");

        assert_eq!(update.action(), Action::Delete);
        assert!(update.new_values(AttributeType::Org).is_empty());
        assert_eq!(update.key().as_str(), "ORG-A");
    }

    #[test]
    fn governing_values_follow_the_action() {
        let reference = org("mntner: A-MNT\nmnt-by: OLD-MNT\n");
        let submitted = org("mntner: A-MNT\nmnt-by: NEW-MNT\n");

        let create = prepare(None, Some(submitted.clone()), false).expect("create");
        let modify = prepare(Some(reference), Some(submitted), false).expect("modify");

        assert_eq!(create.governing_values(AttributeType::MntBy), vec![CiString::new("NEW-MNT")]);
        assert_eq!(modify.governing_values(AttributeType::MntBy), vec![CiString::new("OLD-MNT")]);
    }

    proptest! {
        #[test]
        fn action_follows_which_records_are_present(
            has_reference in any::<bool>(),
            has_submitted in any::<bool>(),
            delete_requested in any::<bool>(),
        ) {
            let reference = has_reference.then(|| organisation("ORG-A"));
            let submitted = has_submitted.then(|| organisation("ORG-A"));

            let result = prepare(reference, submitted, delete_requested);

            match (has_reference, has_submitted, delete_requested) {
                (false, false, _) => prop_assert_eq!(result, Err(MalformedUpdateError::BothAbsent)),
                (false, true, true) => {
                    prop_assert_eq!(result, Err(MalformedUpdateError::DeleteWithoutReference));
                }
                (false, true, false) => prop_assert_eq!(result.map(|u| u.action()), Ok(Action::Create)),
                (true, _, true) => prop_assert_eq!(result.map(|u| u.action()), Ok(Action::Delete)),
                (true, false, false) => {
                    prop_assert_eq!(result, Err(MalformedUpdateError::MissingSubmission));
                }
                (true, true, false) => prop_assert_eq!(result.map(|u| u.action()), Ok(Action::Modify)),
            }
        }
    }
}
