//! Core runtime for regdb: the registry write path.
//!
//! An update flows prepare → authenticate → validate → persist → reindex.
//! Persistence and index maintenance share one storage transaction, so a
//! committed record is never visible without its secondary index rows.
#![warn(unreachable_pub)]

pub mod accounting;
pub mod auth;
pub mod config;
pub mod error;
pub mod index;
pub mod model;
pub mod obs;
pub mod pipeline;
pub mod retry;
pub mod store;
pub mod update;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Column at which attribute values start when a record is rendered.
pub const ATTRIBUTE_VALUE_COLUMN: usize = 16;

/// Attempt budget applied to the persistence step when none is configured.
pub const DEFAULT_PERSIST_ATTEMPTS: u32 = 3;

///
/// Prelude
///
/// Domain vocabulary only.
/// Stores, strategies and validators are imported from their modules.
///

pub mod prelude {
    pub use crate::{
        model::{AttributeType, CiString, ObjectId, ObjectType, Record, RecordHandle},
        update::{Action, PreparedUpdate, UpdateContext, UpdateState},
    };
}
