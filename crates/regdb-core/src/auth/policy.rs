use crate::{
    auth::{Principal, sha256_hex},
    model::{CiString, Record},
};
use std::collections::BTreeSet;

///
/// OverrideUser
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OverrideUser {
    pub name: String,
    pub password_sha256: String,
}

///
/// PrincipalPolicy
///
/// Maps accepted credential holders to principals and verifies override
/// credentials.
///

#[derive(Clone, Debug, Default)]
pub struct PrincipalPolicy {
    alloc_maintainers: BTreeSet<CiString>,
    override_users: Vec<OverrideUser>,
}

impl PrincipalPolicy {
    #[must_use]
    pub fn new(
        alloc_maintainers: impl IntoIterator<Item = CiString>,
        override_users: Vec<OverrideUser>,
    ) -> Self {
        Self {
            alloc_maintainers: alloc_maintainers.into_iter().collect(),
            override_users,
        }
    }

    #[must_use]
    pub fn is_alloc_maintainer(&self, key: &CiString) -> bool {
        self.alloc_maintainers.contains(key)
    }

    #[must_use]
    pub fn check_override(&self, user: &str, password: &str) -> bool {
        let digest = sha256_hex(password);

        self.override_users.iter().any(|candidate| {
            candidate.name == user && candidate.password_sha256.eq_ignore_ascii_case(&digest)
        })
    }

    /// Extra principals granted by one accepted holder.
    pub fn principals_for(&self, holder: &Record) -> impl Iterator<Item = Principal> {
        self.is_alloc_maintainer(holder.key())
            .then_some(Principal::AllocMaintainer)
            .into_iter()
    }
}
