//! Module: update
//! Responsibility: the update domain (action derivation, per-update context,
//! messages and submitted credentials).
//! Does not own: authentication, validation or persistence decisions.

mod action;
mod context;
mod credential;
mod message;
mod prepared;

pub use action::{Action, UpdateState};
pub use context::{ContextMessage, UpdateContext, UpdateRef};
pub use credential::{Credential, Credentials};
pub use message::{Message, Severity, messages};
pub use prepared::{PreparedUpdate, prepare};
