use crate::{
    auth::Subject,
    error::UpdateError,
    model::{AttributeType, CiString, ObjectType, RecordHandle},
    update::{Credentials, Message, PreparedUpdate, UpdateState, messages},
};
use std::fmt;
use tracing::debug;
use ulid::Ulid;

///
/// UpdateRef
///
/// Identifies the update a message relates to.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct UpdateRef {
    pub object_type: ObjectType,
    pub key: CiString,
}

impl UpdateRef {
    #[must_use]
    pub fn of(update: &PreparedUpdate) -> Self {
        Self {
            object_type: update.object_type(),
            key: update.key().clone(),
        }
    }
}

impl fmt::Display for UpdateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.object_type, self.key)
    }
}

///
/// ContextMessage
///
/// A message keyed by the update (and optionally the attribute) it concerns.
/// Global messages carry no update.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContextMessage {
    pub update: Option<UpdateRef>,
    pub attribute: Option<AttributeType>,
    pub message: Message,
}

///
/// UpdateContext
///
/// Per-update accumulator owned by the pipeline for the duration of one run.
/// Never shared between updates.
///

#[derive(Debug)]
pub struct UpdateContext {
    id: Ulid,
    credentials: Credentials,
    state: UpdateState,
    subject: Subject,
    messages: Vec<ContextMessage>,
    error: Option<UpdateError>,
    handle: Option<RecordHandle>,
}

impl UpdateContext {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            id: Ulid::new(),
            credentials,
            state: UpdateState::Received,
            subject: Subject::default(),
            messages: Vec::new(),
            error: None,
            handle: None,
        }
    }

    /// Correlation id used in logs.
    #[must_use]
    pub const fn id(&self) -> Ulid {
        self.id
    }

    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub const fn state(&self) -> UpdateState {
        self.state
    }

    /// Advance along the success path.
    pub fn transition(&mut self, to: UpdateState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "update state invariant violated: {} -> {to}",
            self.state
        );
        debug!(update = %self.id, from = %self.state, to = %to, "update transition");
        self.state = to;
    }

    /// Move to `Failed`, keeping `err` as the terminal error.
    ///
    /// Authentication and validation failures already left their messages on
    /// the context; every other failure adds one global error message.
    pub fn fail(&mut self, err: UpdateError) {
        if !matches!(
            err,
            UpdateError::AuthenticationFailed(_) | UpdateError::ValidationFailed { .. }
        ) {
            self.add_global_message(messages::update_failed(&err));
        }

        debug!(
            update = %self.id,
            from = %self.state,
            class = %err.class(),
            origin = %err.origin(),
            "update failed"
        );
        self.state = UpdateState::Failed;
        self.error = Some(err);
    }

    #[must_use]
    pub const fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn set_subject(&mut self, subject: Subject) {
        self.subject = subject;
    }

    pub fn add_message(&mut self, update: &PreparedUpdate, message: Message) {
        self.messages.push(ContextMessage {
            update: Some(UpdateRef::of(update)),
            attribute: None,
            message,
        });
    }

    pub fn add_attribute_message(
        &mut self,
        update: &PreparedUpdate,
        attribute: AttributeType,
        message: Message,
    ) {
        self.messages.push(ContextMessage {
            update: Some(UpdateRef::of(update)),
            attribute: Some(attribute),
            message,
        });
    }

    pub fn add_global_message(&mut self, message: Message) {
        self.messages.push(ContextMessage {
            update: None,
            attribute: None,
            message,
        });
    }

    /// Every message in the order it was added.
    #[must_use]
    pub fn messages(&self) -> &[ContextMessage] {
        &self.messages
    }

    pub fn errors(&self) -> impl Iterator<Item = &ContextMessage> {
        self.messages.iter().filter(|entry| entry.message.is_error())
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    #[must_use]
    pub const fn error(&self) -> Option<&UpdateError> {
        self.error.as_ref()
    }

    #[must_use]
    pub const fn handle(&self) -> Option<&RecordHandle> {
        self.handle.as_ref()
    }

    pub(crate) fn set_handle(&mut self, handle: RecordHandle) {
        self.handle = Some(handle);
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == UpdateState::Indexed
    }
}
