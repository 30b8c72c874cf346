use crate::{
    model::{AttributeType, CiString, ObjectType, RecordHandle, RecordParseError},
    retry::{Classify, ErrorKind},
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// MalformedUpdateError
///
/// The update's input shape is invalid. Never retried.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MalformedUpdateError {
    #[error("update carries neither a reference nor a submitted record")]
    BothAbsent,

    #[error("delete requested for an object that does not exist")]
    DeleteWithoutReference,

    #[error("modification of an existing object carries no submitted record")]
    MissingSubmission,

    #[error("object type changed from {reference} to {submitted}")]
    TypeMismatch {
        reference: ObjectType,
        submitted: ObjectType,
    },

    #[error("primary key changed from '{reference}' to '{submitted}'")]
    KeyMismatch {
        reference: CiString,
        submitted: CiString,
    },

    #[error(transparent)]
    Parse(#[from] RecordParseError),
}

///
/// AuthFailureReason
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum AuthFailureReason {
    #[error("referenced {object_type} '{key}' does not exist")]
    ReferenceNotFound {
        object_type: ObjectType,
        key: CiString,
    },

    #[error("{object_type} '{key}' has no {attribute} attribute")]
    NoCandidates {
        object_type: ObjectType,
        key: CiString,
        attribute: AttributeType,
    },

    #[error("no candidate accepted the supplied credentials")]
    CredentialsRejected,

    #[error("override credential is not valid")]
    InvalidOverride,

    #[error("no authentication strategy authorized the update")]
    Unauthorized,
}

///
/// AuthenticationFailedError
///
/// Carries the candidate maintainers that were checked and rejected.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("authentication failed in {strategy}: {reason}")]
pub struct AuthenticationFailedError {
    pub strategy: &'static str,
    pub reason: AuthFailureReason,
    pub candidates: Vec<CiString>,
}

impl AuthenticationFailedError {
    #[must_use]
    pub const fn new(strategy: &'static str, reason: AuthFailureReason) -> Self {
        Self {
            strategy,
            reason,
            candidates: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_candidates(mut self, candidates: Vec<CiString>) -> Self {
        self.candidates = candidates;
        self
    }
}

///
/// IndexConsistencyError
///
/// Index maintenance hit a state that correct sequencing never produces.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum IndexConsistencyError {
    #[error("{attribute} value '{value}' is already indexed for {owner}")]
    DuplicateValue {
        attribute: AttributeType,
        value: CiString,
        owner: RecordHandle,
    },

    #[error("{attribute} has no index strategy")]
    Unindexed { attribute: AttributeType },

    #[error("{handle} is not a {expected} record")]
    WrongObjectType {
        handle: RecordHandle,
        expected: &'static str,
    },
}

///
/// StorageErrorKind
///
/// Storage failure taxonomy. `parent` links a kind to the kind it refines,
/// so retry rules declared for `Transient` also cover its subkinds.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StorageErrorKind {
    Transient,
    ConnectionLost,
    LockTimeout,
    Fatal,
    Conflict,
    NotFound,
}

impl StorageErrorKind {
    #[must_use]
    pub fn is_transient(self) -> bool {
        self.is_a(Self::Transient)
    }
}

impl ErrorKind for StorageErrorKind {
    fn parent(self) -> Option<Self> {
        match self {
            Self::ConnectionLost | Self::LockTimeout => Some(Self::Transient),
            Self::Conflict => Some(Self::Fatal),
            Self::Transient | Self::Fatal | Self::NotFound => None,
        }
    }
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Transient => "transient",
            Self::ConnectionLost => "connection_lost",
            Self::LockTimeout => "lock_timeout",
            Self::Fatal => "fatal",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
        };
        write!(f, "{label}")
    }
}

///
/// StorageError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("storage {kind}: {message}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Transient, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Fatal, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Conflict, message)
    }

    pub fn lock_timeout(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::LockTimeout, message)
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl Classify for StorageError {
    type Kind = StorageErrorKind;

    fn kind(&self) -> Option<StorageErrorKind> {
        Some(self.kind)
    }
}

///
/// LookupError
///
/// Record lookup failure. `NotFound` is distinct so callers can treat it as
/// "referenced object missing".
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum LookupError {
    #[error("{object_type} '{key}' not found")]
    NotFound {
        object_type: ObjectType,
        key: CiString,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LookupError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

///
/// UpdateError
///
/// Terminal failure of one update, carried on its context.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum UpdateError {
    #[error(transparent)]
    Malformed(#[from] MalformedUpdateError),

    #[error(transparent)]
    AuthenticationFailed(#[from] AuthenticationFailedError),

    #[error("validation failed with {} blocking message(s)", .messages.len())]
    ValidationFailed { messages: Vec<String> },

    #[error("transient storage failure: {0}")]
    TransientStorage(StorageError),

    #[error("storage failure: {0}")]
    FatalStorage(StorageError),

    #[error(transparent)]
    IndexConsistency(#[from] IndexConsistencyError),
}

impl UpdateError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Malformed(_) => ErrorClass::Malformed,
            Self::AuthenticationFailed(_) => ErrorClass::Unauthorized,
            Self::ValidationFailed { .. } => ErrorClass::Rejected,
            Self::TransientStorage(_) => ErrorClass::Transient,
            Self::FatalStorage(_) => ErrorClass::Storage,
            Self::IndexConsistency(_) => ErrorClass::InvariantViolation,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Malformed(_) => ErrorOrigin::Prepare,
            Self::AuthenticationFailed(_) => ErrorOrigin::Authentication,
            Self::ValidationFailed { .. } => ErrorOrigin::Validation,
            Self::TransientStorage(_) | Self::FatalStorage(_) => ErrorOrigin::Store,
            Self::IndexConsistency(_) => ErrorOrigin::Index,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {self}", self.origin(), self.class())
    }
}

impl From<StorageError> for UpdateError {
    fn from(err: StorageError) -> Self {
        if err.is_transient() {
            Self::TransientStorage(err)
        } else {
            Self::FatalStorage(err)
        }
    }
}

impl From<LookupError> for UpdateError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Storage(err) => err.into(),
            LookupError::NotFound { .. } => {
                Self::FatalStorage(StorageError::new(StorageErrorKind::NotFound, err.to_string()))
            }
        }
    }
}

impl Classify for UpdateError {
    type Kind = StorageErrorKind;

    fn kind(&self) -> Option<StorageErrorKind> {
        match self {
            Self::TransientStorage(err) | Self::FatalStorage(err) => Some(err.kind),
            _ => None,
        }
    }
}

///
/// ErrorClass
/// Classification a front end renders without matching every variant.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Malformed,
    Unauthorized,
    Rejected,
    Transient,
    Storage,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Malformed => "malformed",
            Self::Unauthorized => "unauthorized",
            Self::Rejected => "rejected",
            Self::Transient => "transient",
            Self::Storage => "storage",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Prepare,
    Authentication,
    Validation,
    Store,
    Index,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Prepare => "prepare",
            Self::Authentication => "authentication",
            Self::Validation => "validation",
            Self::Store => "store",
            Self::Index => "index",
        };
        write!(f, "{label}")
    }
}
