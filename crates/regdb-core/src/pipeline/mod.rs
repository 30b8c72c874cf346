//! Module: pipeline
//! Responsibility: drive one update through prepare, authenticate, validate,
//! persist and reindex, leaving the outcome on its context.
//! Does not own: transport of updates or rendering of the result.
//!
//! Persistence and reindexing share one storage transaction. The record lock
//! is held for a single attempt only, so a retry wait never blocks other
//! writers of the same object.

#[cfg(test)]
mod tests;

use crate::{
    auth::Authenticator,
    error::{StorageError, StorageErrorKind, UpdateError},
    index::{IndexDelta, IndexRegistry},
    model::{Attribute, AttributeType, CiString, Record, RecordHandle},
    obs::sink::{self, MetricsEvent},
    retry::RetryPolicy,
    store::{RecordLocks, RecordStore},
    update::{Action, Credentials, PreparedUpdate, UpdateContext, UpdateState, messages, prepare},
    validate::ValidatorRegistry,
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

/// Storage kinds the persistence step retries.
pub const RETRYABLE: &[StorageErrorKind] = &[StorageErrorKind::Transient];

///
/// UpdateRequest
///
/// One submission as delivered by the front end.
///

#[derive(Clone, Debug, Default)]
pub struct UpdateRequest {
    pub reference: Option<Record>,
    pub submitted: Option<Record>,
    pub delete_requested: bool,
    pub credentials: Credentials,
}

impl UpdateRequest {
    #[must_use]
    pub fn create(submitted: Record) -> Self {
        Self {
            submitted: Some(submitted),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn modify(reference: Record, submitted: Record) -> Self {
        Self {
            reference: Some(reference),
            submitted: Some(submitted),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn delete(reference: Record) -> Self {
        Self {
            reference: Some(reference),
            delete_requested: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: impl Into<Credentials>) -> Self {
        self.credentials = credentials.into();
        self
    }
}

///
/// UpdatePipeline
///
/// Shared by every worker; each `process` call owns its own context.
///

pub struct UpdatePipeline {
    store: Arc<dyn RecordStore>,
    indexes: Arc<IndexRegistry>,
    authenticator: Authenticator,
    validators: ValidatorRegistry,
    locks: RecordLocks,
    retry: RetryPolicy,
    lock_timeout: Duration,
    source: CiString,
}

impl UpdatePipeline {
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_SOURCE: &'static str = "TEST";

    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        indexes: Arc<IndexRegistry>,
        authenticator: Authenticator,
        validators: ValidatorRegistry,
    ) -> Self {
        Self {
            store,
            indexes,
            authenticator,
            validators,
            locks: RecordLocks::new(),
            retry: RetryPolicy::default(),
            lock_timeout: Self::DEFAULT_LOCK_TIMEOUT,
            source: CiString::new(Self::DEFAULT_SOURCE),
        }
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<CiString>) -> Self {
        self.source = source.into();
        self
    }

    #[must_use]
    pub const fn indexes(&self) -> &Arc<IndexRegistry> {
        &self.indexes
    }

    #[must_use]
    pub const fn locks(&self) -> &RecordLocks {
        &self.locks
    }

    /// Run one update to a terminal state. Never panics on bad input; every
    /// failure ends up as the context's error.
    pub fn process(&self, request: UpdateRequest) -> UpdateContext {
        let UpdateRequest {
            reference,
            submitted,
            delete_requested,
            credentials,
        } = request;

        let mut ctx = UpdateContext::new(credentials);
        sink::record(MetricsEvent::UpdateStart);

        if let Err(err) = self.run(reference, submitted, delete_requested, &mut ctx) {
            match err {
                UpdateError::AuthenticationFailed(_) => {
                    sink::record(MetricsEvent::AuthenticationFailed);
                }
                UpdateError::ValidationFailed { .. } => {
                    sink::record(MetricsEvent::ValidationBlocked);
                }
                _ => {}
            }
            info!(update = %ctx.id(), error = %err.display_with_class(), "update rejected");
            ctx.fail(err);
        }

        sink::record(MetricsEvent::UpdateFinish { state: ctx.state() });

        ctx
    }

    fn run(
        &self,
        reference: Option<Record>,
        submitted: Option<Record>,
        delete_requested: bool,
        ctx: &mut UpdateContext,
    ) -> Result<(), UpdateError> {
        let submitted = match submitted {
            Some(record) if reference.is_none() && !delete_requested => Some(self.stamp_source(record)),
            other => other,
        };

        let update = prepare(reference, submitted, delete_requested)?;
        debug!(
            update = %ctx.id(),
            action = %update.action(),
            object_type = %update.object_type(),
            key = %update.key(),
            "update prepared"
        );
        ctx.transition(UpdateState::Prepared);

        let subject = self.authenticator.authenticate(&update, ctx)?;
        ctx.set_subject(subject);
        ctx.transition(UpdateState::Authenticated);

        self.validators.validate(&update, ctx)?;
        ctx.transition(UpdateState::Validated);

        let (handle, delta) = self.retry.run(RETRYABLE, || self.persist(&update))?;
        ctx.transition(UpdateState::Persisted);

        sink::record(MetricsEvent::IndexDelta {
            inserts: delta.inserts,
            removes: delta.removes,
        });
        ctx.transition(UpdateState::Indexed);

        ctx.add_message(
            &update,
            messages::update_succeeded(update.action(), update.object_type(), update.key()),
        );
        info!(update = %ctx.id(), %handle, action = %update.action(), "update committed");
        ctx.set_handle(handle);

        Ok(())
    }

    fn stamp_source(&self, record: Record) -> Record {
        if record.contains(AttributeType::Source) {
            record
        } else {
            record.with_attribute(Attribute::new(AttributeType::Source, self.source.as_str()))
        }
    }

    // One persistence attempt: lock, stage the primary write and its index
    // rows in one transaction, commit. Both lock and transaction are released
    // before returning.
    fn persist(&self, update: &PreparedUpdate) -> Result<(RecordHandle, IndexDelta), UpdateError> {
        let _lock = self
            .locks
            .acquire(update.object_type(), update.key(), self.lock_timeout)?;
        let mut tx = self.store.begin()?;

        let previous = match update.reference() {
            None => None,
            Some(reference) => {
                let object_id = reference.object_id().ok_or_else(|| {
                    StorageError::conflict(format!(
                        "{} '{}' was not read from storage",
                        reference.object_type(),
                        reference.key()
                    ))
                })?;
                let current = tx.get(object_id).ok_or_else(|| {
                    StorageError::conflict(format!(
                        "{} '{}' no longer exists",
                        reference.object_type(),
                        reference.key()
                    ))
                })?;
                if current != *reference {
                    return Err(StorageError::conflict(format!(
                        "{} '{}' changed since it was read",
                        reference.object_type(),
                        reference.key()
                    ))
                    .into());
                }

                Some(current)
            }
        };

        let (handle, after) = match (update.action(), &previous) {
            (Action::Delete, Some(previous)) => {
                let removed = tx.delete(stored_handle(previous)?.object_id())?;
                (stored_handle(&removed)?, None)
            }
            (_, previous) => {
                let mut record = update.updated().clone();
                if let Some(object_id) = previous.as_ref().and_then(Record::object_id) {
                    record = record.with_object_id(object_id);
                }
                let stored = tx.put(record)?;
                (stored_handle(&stored)?, Some(stored))
            }
        };

        let delta = self
            .indexes
            .reindex(tx.indexes(), &handle, previous.as_ref(), after.as_ref())?;
        tx.commit()?;

        debug!(
            %handle,
            inserts = delta.inserts,
            removes = delta.removes,
            "update persisted"
        );

        Ok((handle, delta))
    }
}

fn stored_handle(record: &Record) -> Result<RecordHandle, StorageError> {
    record.handle().ok_or_else(|| {
        StorageError::fatal(format!(
            "{} '{}' carries no object id",
            record.object_type(),
            record.key()
        ))
    })
}
