use crate::model::{CiString, ObjectType};
use derive_more::Display;
use std::fmt;

///
/// ObjectId
///
/// Internal id assigned by primary storage.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectId(u64);

impl ObjectId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

///
/// RecordHandle
///
/// Lightweight record identity for index rows and deletion targets.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RecordHandle {
    object_id: ObjectId,
    object_type: ObjectType,
    key: CiString,
}

impl RecordHandle {
    #[must_use]
    pub fn new(object_id: ObjectId, object_type: ObjectType, key: impl Into<CiString>) -> Self {
        Self {
            object_id,
            object_type,
            key: key.into(),
        }
    }

    #[must_use]
    pub const fn object_id(&self) -> ObjectId {
        self.object_id
    }

    #[must_use]
    pub const fn object_type(&self) -> ObjectType {
        self.object_type
    }

    #[must_use]
    pub const fn key(&self) -> &CiString {
        &self.key
    }

    /// Copy of this handle whose key is replaced by an index-specific key.
    #[must_use]
    pub(crate) fn with_key(&self, key: impl Into<CiString>) -> Self {
        Self {
            object_id: self.object_id,
            object_type: self.object_type,
            key: key.into(),
        }
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (#{})", self.object_type, self.key, self.object_id)
    }
}
