use super::{AuthenticationStrategy, accept, dedup, load_all, lookup_failure};
use crate::{
    auth::{AuthError, CredentialValidator},
    error::{AuthFailureReason, AuthenticationFailedError},
    model::{AttributeType, ObjectType, Record},
    store::RecordLookup,
    update::{Action, PreparedUpdate, UpdateContext},
};
use std::sync::Arc;

///
/// RouteOriginAuthentication
///
/// Creating a route requires authorization from the aut-num named by its
/// origin: maintainers in `mnt-routes`, or `mnt-by` when it lists none.
///

pub struct RouteOriginAuthentication {
    lookup: Arc<dyn RecordLookup>,
    credentials: Arc<dyn CredentialValidator>,
}

impl RouteOriginAuthentication {
    pub const NAME: &'static str = "origin";

    #[must_use]
    pub fn new(lookup: Arc<dyn RecordLookup>, credentials: Arc<dyn CredentialValidator>) -> Self {
        Self {
            lookup,
            credentials,
        }
    }
}

impl AuthenticationStrategy for RouteOriginAuthentication {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supports(&self, update: &PreparedUpdate) -> bool {
        update.action() == Action::Create && update.object_type().is_route()
    }

    fn authenticate(
        &self,
        update: &PreparedUpdate,
        ctx: &UpdateContext,
    ) -> Result<Vec<Record>, AuthError> {
        let origins = dedup(update.updated().values(AttributeType::Origin));

        let mut maintainer_keys = Vec::new();
        for origin in &origins {
            let aut_num = self
                .lookup
                .get_by_key(ObjectType::AutNum, origin)
                .map_err(|err| lookup_failure(Self::NAME, err))?;

            let mut keys = aut_num.values(AttributeType::MntRoutes);
            if keys.is_empty() {
                keys = aut_num.values(AttributeType::MntBy);
            }
            if keys.is_empty() {
                return Err(AuthenticationFailedError::new(
                    Self::NAME,
                    AuthFailureReason::NoCandidates {
                        object_type: ObjectType::AutNum,
                        key: aut_num.key().clone(),
                        attribute: AttributeType::MntRoutes,
                    },
                )
                .into());
            }
            maintainer_keys.extend(keys);
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
