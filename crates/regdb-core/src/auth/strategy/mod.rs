mod mnt_by;
mod mnt_irt;
mod org_ref;
mod route_origin;

pub use mnt_by::MntByAuthentication;
pub use mnt_irt::MntIrtAuthentication;
pub use org_ref::OrgRefAuthentication;
pub use route_origin::RouteOriginAuthentication;

use crate::{
    auth::{AuthError, CredentialValidator},
    error::{AuthFailureReason, AuthenticationFailedError, LookupError},
    model::{CiString, ObjectType, Record},
    store::RecordLookup,
    update::{PreparedUpdate, UpdateContext},
};

///
/// AuthenticationStrategy
///
/// One rule for establishing who may authorize an update. Strategies that
/// do not support an update are skipped rather than counted as failures.
///

pub trait AuthenticationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, update: &PreparedUpdate) -> bool;

    /// Credential holders that accepted the update.
    fn authenticate(
        &self,
        update: &PreparedUpdate,
        ctx: &UpdateContext,
    ) -> Result<Vec<Record>, AuthError>;
}

// Map a lookup failure: a missing key rejects, anything else is storage.
fn lookup_failure(strategy: &'static str, err: LookupError) -> AuthError {
    match err {
        LookupError::NotFound { object_type, key } => AuthenticationFailedError::new(
            strategy,
            AuthFailureReason::ReferenceNotFound { object_type, key },
        )
        .into(),
        LookupError::Storage(err) => AuthError::Storage(err),
    }
}

/// Load every record named by `keys`; a missing key fails the strategy.
fn load_all(
    lookup: &dyn RecordLookup,
    strategy: &'static str,
    object_type: ObjectType,
    keys: &[CiString],
) -> Result<Vec<Record>, AuthError> {
    keys.iter()
        .map(|key| {
            lookup
                .get_by_key(object_type, key)
                .map_err(|err| lookup_failure(strategy, err))
        })
        .collect()
}

/// Hand candidates to the credential validator; none accepted is a failure
/// naming every candidate.
fn accept(
    credentials: &dyn CredentialValidator,
    update: &PreparedUpdate,
    ctx: &UpdateContext,
    candidates: &[Record],
    strategy: &'static str,
) -> Result<Vec<Record>, AuthError> {
    let accepted = credentials.authenticate(update, ctx, candidates, strategy);
    if accepted.is_empty() {
        let keys = candidates
            .iter()
            .map(|candidate| candidate.key().clone())
            .collect();

        return Err(
            AuthenticationFailedError::new(strategy, AuthFailureReason::CredentialsRejected)
                .with_candidates(keys)
                .into(),
        );
    }

    Ok(accepted)
}

fn dedup(keys: impl IntoIterator<Item = CiString>) -> Vec<CiString> {
    let mut out: Vec<CiString> = Vec::new();
    for key in keys {
        if !out.contains(&key) {
            out.push(key);
        }
    }
    out
}
