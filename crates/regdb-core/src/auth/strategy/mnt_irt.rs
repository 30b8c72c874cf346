use super::{AuthenticationStrategy, accept, load_all};
use crate::{
    auth::{AuthError, CredentialValidator},
    model::{AttributeType, ObjectType, Record},
    store::RecordLookup,
    update::{PreparedUpdate, UpdateContext},
};
use std::sync::Arc;

///
/// MntIrtAuthentication
///
/// New `mnt-irt` references on address blocks must be authorized by the
/// referenced irt objects themselves.
///

pub struct MntIrtAuthentication {
    lookup: Arc<dyn RecordLookup>,
    credentials: Arc<dyn CredentialValidator>,
}

impl MntIrtAuthentication {
    pub const NAME: &'static str = "mnt-irt";

    #[must_use]
    pub fn new(lookup: Arc<dyn RecordLookup>, credentials: Arc<dyn CredentialValidator>) -> Self {
        Self {
            lookup,
            credentials,
        }
    }
}

impl AuthenticationStrategy for MntIrtAuthentication {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supports(&self, update: &PreparedUpdate) -> bool {
        matches!(
            update.object_type(),
            ObjectType::Inetnum | ObjectType::Inet6num
        ) && !update.new_values(AttributeType::MntIrt).is_empty()
    }

    fn authenticate(
        &self,
        update: &PreparedUpdate,
        ctx: &UpdateContext,
    ) -> Result<Vec<Record>, AuthError> {
        let keys = update
            .new_values(AttributeType::MntIrt)
            .into_iter()
            .collect::<Vec<_>>();
        let candidates = load_all(self.lookup.as_ref(), Self::NAME, ObjectType::Irt, &keys)?;

        accept(self.credentials.as_ref(), update, ctx, &candidates, Self::NAME)
    }
}
