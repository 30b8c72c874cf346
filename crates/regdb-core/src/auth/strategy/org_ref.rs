use super::{AuthenticationStrategy, accept, dedup, load_all};
use crate::{
    auth::{AuthError, CredentialValidator},
    error::{AuthFailureReason, AuthenticationFailedError},
    model::{AttributeType, ObjectType, Record},
    store::RecordLookup,
    update::{PreparedUpdate, UpdateContext},
};
use std::sync::Arc;

///
/// OrgRefAuthentication
///
/// Adding an `org:` reference must be authorized by a maintainer the
/// referenced organisation lists in `mnt-ref`.
///

pub struct OrgRefAuthentication {
    lookup: Arc<dyn RecordLookup>,
    credentials: Arc<dyn CredentialValidator>,
}

impl OrgRefAuthentication {
    pub const NAME: &'static str = "mnt-ref";

    #[must_use]
    pub fn new(lookup: Arc<dyn RecordLookup>, credentials: Arc<dyn CredentialValidator>) -> Self {
        Self {
            lookup,
            credentials,
        }
    }
}

impl AuthenticationStrategy for OrgRefAuthentication {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supports(&self, update: &PreparedUpdate) -> bool {
        !update.new_values(AttributeType::Org).is_empty()
    }

    fn authenticate(
        &self,
        update: &PreparedUpdate,
        ctx: &UpdateContext,
    ) -> Result<Vec<Record>, AuthError> {
        let org_keys = update
            .new_values(AttributeType::Org)
            .into_iter()
            .collect::<Vec<_>>();

        let organisations = self
            .lookup
            .get_by_keys(ObjectType::Organisation, &org_keys)
            .map_err(|err| super::lookup_failure(Self::NAME, err))?;
        if organisations.is_empty() {
            let key = org_keys.first().cloned().unwrap_or_default();
            return Err(AuthenticationFailedError::new(
                Self::NAME,
                AuthFailureReason::ReferenceNotFound {
                    object_type: ObjectType::Organisation,
                    key,
                },
            )
            .with_candidates(org_keys)
            .into());
        }

        let mut maintainer_keys = Vec::new();
        for organisation in &organisations {
            let mnt_refs = organisation.values(AttributeType::MntRef);
            if mnt_refs.is_empty() {
                return Err(AuthenticationFailedError::new(
                    Self::NAME,
                    AuthFailureReason::NoCandidates {
                        object_type: ObjectType::Organisation,
                        key: organisation.key().clone(),
                        attribute: AttributeType::MntRef,
                    },
                )
                .into());
            }
            maintainer_keys.extend(mnt_refs);
        }

        let candidates = load_all(
            self.lookup.as_ref(),
            Self::NAME,
            ObjectType::Mntner,
            &dedup(maintainer_keys),
        )?;

        accept(self.credentials.as_ref(), update, ctx, &candidates, Self::NAME)
    }
}
