use derive_more::Display;
use regdb_core::{
    config::ConfigError,
    error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, LookupError, StorageErrorKind, UpdateError},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

impl From<UpdateError> for Error {
    fn from(err: UpdateError) -> Self {
        let kind = match (&err, err.class()) {
            (UpdateError::FatalStorage(storage), _) if storage.kind == StorageErrorKind::NotFound => {
                ErrorKind::NotFound
            }
            (UpdateError::FatalStorage(storage), _) if storage.kind == StorageErrorKind::Conflict => {
                ErrorKind::Conflict
            }
            (_, ErrorClass::Malformed) => ErrorKind::Malformed,
            (_, ErrorClass::Unauthorized) => ErrorKind::Unauthorized,
            (_, ErrorClass::Rejected) => ErrorKind::Rejected,
            (_, ErrorClass::Transient) => ErrorKind::Unavailable,
            (_, ErrorClass::Storage | ErrorClass::InvariantViolation) => ErrorKind::Internal,
        };

        Self::new(kind, err.origin().into(), err.to_string())
    }
}

impl From<LookupError> for Error {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound { .. } => {
                Self::new(ErrorKind::NotFound, ErrorOrigin::Store, err.to_string())
            }
            LookupError::Storage(err) => UpdateError::from(err).into(),
        }
    }
}

///
/// ErrorKind
/// Public error taxonomy for front ends.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Configuration could not be loaded.
    Config,

    /// The submission's shape is invalid.
    Malformed,

    /// No credential authorized the change.
    Unauthorized,

    /// A business rule blocked the change.
    Rejected,

    /// Object does not exist.
    NotFound,

    /// Concurrent or state conflict.
    Conflict,

    /// Storage is temporarily unavailable; the caller may resubmit.
    Unavailable,

    /// The caller cannot remediate this.
    Internal,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Config,
    Prepare,
    Authentication,
    Validation,
    Store,
    Index,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Prepare => Self::Prepare,
            CoreErrorOrigin::Authentication => Self::Authentication,
            CoreErrorOrigin::Validation => Self::Validation,
            CoreErrorOrigin::Store => Self::Store,
            CoreErrorOrigin::Index => Self::Index,
        }
    }
}
