//! Module: auth
//! Responsibility: decide which principals an update carries, by running
//! every applicable authentication strategy and unioning what they accept.
//! Does not own: credential transport or session handling.

mod credentials;
mod policy;
mod strategy;
mod subject;


pub use credentials::{CredentialValidator, MaintainerCredentials, sha256_hex};
pub use policy::{OverrideUser, PrincipalPolicy};
pub use strategy::{
    AuthenticationStrategy, MntByAuthentication, MntIrtAuthentication, OrgRefAuthentication,
    RouteOriginAuthentication,
};
pub use subject::{Principal, Subject};

use crate::{
    error::{AuthFailureReason, AuthenticationFailedError, StorageError, UpdateError},
    store::RecordLookup,
    update::{PreparedUpdate, UpdateContext, messages},
};
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::{debug, info};

///
/// AuthError
///
/// A strategy either rejects the update or cannot reach storage. Only the
/// former counts towards the union; the latter aborts the update.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum AuthError {
    #[error(transparent)]
    Failed(#[from] AuthenticationFailedError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<AuthError> for UpdateError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Failed(err) => Self::AuthenticationFailed(err),
            AuthError::Storage(err) => err.into(),
        }
    }
}

///
/// Authenticator
///
/// Ordered set of strategies plus the principal policy. Strategies are
/// independent: any one accepting authorizes the update, and none vetoes
/// another.
///

pub struct Authenticator {
    strategies: Vec<Arc<dyn AuthenticationStrategy>>,
    policy: PrincipalPolicy,
}

impl Authenticator {
    pub const NAME: &'static str = "authenticator";
    pub const OVERRIDE: &'static str = "override";

    #[must_use]
    pub const fn new(policy: PrincipalPolicy) -> Self {
        Self {
            strategies: Vec::new(),
            policy,
        }
    }

    /// The stock strategies over one lookup and credential validator.
    #[must_use]
    pub fn with_defaults(
        lookup: Arc<dyn RecordLookup>,
        credentials: Arc<dyn CredentialValidator>,
        policy: PrincipalPolicy,
    ) -> Self {
        Self::new(policy)
            .with_strategy(MntByAuthentication::new(lookup.clone(), credentials.clone()))
            .with_strategy(OrgRefAuthentication::new(lookup.clone(), credentials.clone()))
            .with_strategy(MntIrtAuthentication::new(lookup.clone(), credentials.clone()))
            .with_strategy(RouteOriginAuthentication::new(lookup, credentials))
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: impl AuthenticationStrategy + 'static) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    #[must_use]
    pub const fn policy(&self) -> &PrincipalPolicy {
        &self.policy
    }

    pub fn strategy_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.iter().map(|strategy| strategy.name())
    }

    /// Establish the update's subject.
    ///
    /// A valid override bypasses every strategy. Otherwise the subject is the
    /// union of holders accepted by the supporting strategies; an empty union
    /// fails with every rejected candidate and one message per rejection.
    pub fn authenticate(
        &self,
        update: &PreparedUpdate,
        ctx: &mut UpdateContext,
    ) -> Result<Subject, UpdateError> {
        if let Some((user, password)) = ctx.credentials().override_credential() {
            if self.policy.check_override(user, password) {
                info!(update = %ctx.id(), user, "override accepted");
                return Ok(Subject::override_subject());
            }

            ctx.add_message(update, messages::override_authentication_failed());
            return Err(AuthenticationFailedError::new(
                Self::OVERRIDE,
                AuthFailureReason::InvalidOverride,
            )
            .into());
        }

        let mut subject = Subject::default();
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            if !strategy.supports(update) {
                continue;
            }

            match strategy.authenticate(update, ctx) {
                Ok(holders) => {
                    debug!(
                        update = %ctx.id(),
                        strategy = strategy.name(),
                        accepted = holders.len(),
                        "authentication strategy accepted"
                    );
                    for holder in holders {
                        for principal in self.policy.principals_for(&holder) {
                            subject.grant(principal);
                        }
                        subject.add_holder(holder);
                    }
                }
                Err(AuthError::Failed(err)) => {
                    debug!(
                        update = %ctx.id(),
                        strategy = strategy.name(),
                        reason = %err.reason,
                        "authentication strategy rejected"
                    );
                    failures.push(err);
                }
                Err(AuthError::Storage(err)) => return Err(err.into()),
            }
        }

        if subject.is_empty() {
            let mut candidates = Vec::new();
            for failure in &failures {
                ctx.add_message(
                    update,
                    messages::authentication_failed(
                        update.object_type(),
                        update.key(),
                        failure.strategy,
                        &failure.candidates,
                    ),
                );
                for candidate in &failure.candidates {
                    if !candidates.contains(candidate) {
                        candidates.push(candidate.clone());
                    }
                }
            }
            info!(
                update = %ctx.id(),
                rejected = failures.len(),
                "update not authorized"
            );

            return Err(
                AuthenticationFailedError::new(Self::NAME, AuthFailureReason::Unauthorized)
                    .with_candidates(candidates)
                    .into(),
            );
        }

        Ok(subject)
    }
}
