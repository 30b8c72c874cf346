//! ## Crate layout
//! - `core`: the write path itself (record model, authentication,
//!   validation, index maintenance, storage boundary, pipeline).
//! - `error`: the public error taxonomy front ends render.
//! - `Registry`: everything wired together from one `RegistryConfig`.
//!
//! The `prelude` module carries the vocabulary a front end needs to submit
//! updates and read back their outcome.

pub use regdb_core as core;

mod error;
mod registry;

pub use error::{Error, ErrorKind, ErrorOrigin};
pub use registry::Registry;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error, ErrorKind, Registry,
        core::{
            config::RegistryConfig,
            pipeline::UpdateRequest,
            prelude::*,
            update::{Credential, Credentials, Message, Severity},
        },
    };
}
