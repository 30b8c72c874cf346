use super::{AuthenticationStrategy, accept, dedup, load_all};
use crate::{
    auth::{AuthError, CredentialValidator},
    error::{AuthFailureReason, AuthenticationFailedError},
    model::{AttributeType, ObjectType, Record},
    store::RecordLookup,
    update::{Action, PreparedUpdate, UpdateContext},
};
use std::sync::Arc;

///
/// MntByAuthentication
///
/// Maintainers named by `mnt-by` authorize the object: the submission's on
/// CREATE, the stored object's on MODIFY and DELETE. A maintainer being
/// created may name itself and authenticate against its own submitted text.
///

pub struct MntByAuthentication {
    lookup: Arc<dyn RecordLookup>,
    credentials: Arc<dyn CredentialValidator>,
}

impl MntByAuthentication {
    pub const NAME: &'static str = "mnt-by";

    #[must_use]
    pub fn new(lookup: Arc<dyn RecordLookup>, credentials: Arc<dyn CredentialValidator>) -> Self {
        Self {
            lookup,
            credentials,
        }
    }
}

impl AuthenticationStrategy for MntByAuthentication {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supports(&self, _update: &PreparedUpdate) -> bool {
        true
    }

    fn authenticate(
        &self,
        update: &PreparedUpdate,
        ctx: &UpdateContext,
    ) -> Result<Vec<Record>, AuthError> {
        let keys = dedup(update.governing_values(AttributeType::MntBy));
        if keys.is_empty() {
            return Err(AuthenticationFailedError::new(
                Self::NAME,
                AuthFailureReason::NoCandidates {
                    object_type: update.object_type(),
                    key: update.key().clone(),
                    attribute: AttributeType::MntBy,
                },
            )
            .into());
        }

        let self_created = match (update.action(), update.submitted()) {
            (Action::Create, Some(submitted)) if submitted.object_type() == ObjectType::Mntner => {
                Some(submitted)
            }
            _ => None,
        };

        let mut candidates = Vec::with_capacity(keys.len());
        for key in &keys {
            match self_created {
                Some(submitted) if submitted.key() == key => candidates.push(submitted.clone()),
                _ => candidates.extend(load_all(
                    self.lookup.as_ref(),
                    Self::NAME,
                    ObjectType::Mntner,
                    std::slice::from_ref(key),
                )?),
            }
        }

        accept(self.credentials.as_ref(), update, ctx, &candidates, Self::NAME)
    }
}
