use crate::model::{CiString, Record};
use std::{collections::BTreeSet, fmt};

///
/// Principal
///
/// One grant established for an update.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Principal {
    Maintainer(CiString),
    AllocMaintainer,
    Override,
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Maintainer(key) => write!(f, "maintainer:{key}"),
            Self::AllocMaintainer => write!(f, "alloc-maintainer"),
            Self::Override => write!(f, "override"),
        }
    }
}

///
/// Subject
///
/// Union of principals and satisfying credential holders across every
/// authentication strategy that accepted the update.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Subject {
    principals: BTreeSet<Principal>,
    holders: Vec<Record>,
}

impl Subject {
    #[must_use]
    pub fn override_subject() -> Self {
        let mut subject = Self::default();
        subject.principals.insert(Principal::Override);
        subject
    }

    /// Add a satisfying credential holder; duplicates by key are ignored.
    pub fn add_holder(&mut self, holder: Record) {
        if self
            .holders
            .iter()
            .any(|existing| existing.object_type() == holder.object_type() && existing.key() == holder.key())
        {
            return;
        }

        self.principals
            .insert(Principal::Maintainer(holder.key().clone()));
        self.holders.push(holder);
    }

    pub fn grant(&mut self, principal: Principal) {
        self.principals.insert(principal);
    }

    #[must_use]
    pub fn has_principal(&self, principal: &Principal) -> bool {
        self.principals.contains(principal)
    }

    /// Override or allocation authority.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        self.has_principal(&Principal::Override) || self.has_principal(&Principal::AllocMaintainer)
    }

    #[must_use]
    pub const fn principals(&self) -> &BTreeSet<Principal> {
        &self.principals
    }

    #[must_use]
    pub fn holders(&self) -> &[Record] {
        &self.holders
    }

    #[must_use]
    pub fn holder_keys(&self) -> Vec<CiString> {
        self.holders.iter().map(|holder| holder.key().clone()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holders_deduplicate_case_insensitively() {
        let mut subject = Subject::default();
        subject.add_holder(Record::parse("mntner: OWNER-MNT\n").expect("mntner parses"));
        subject.add_holder(Record::parse("mntner: owner-mnt\n").expect("mntner parses"));

        assert_eq!(subject.holders().len(), 1);
        assert!(subject.has_principal(&Principal::Maintainer(CiString::new("Owner-Mnt"))));
        assert!(!subject.is_privileged());
    }

    #[test]
    fn override_subject_is_privileged() {
        let subject = Subject::override_subject();

        assert!(subject.is_privileged());
        assert!(subject.holders().is_empty());
    }
}
