//! Module: model
//! Responsibility: registry record representation and identity.
//! Does not own: persistence, diffing between record versions.

mod ci;
mod handle;
mod record;
mod types;

pub use ci::CiString;
pub use handle::{ObjectId, RecordHandle};
pub use record::{Attribute, Record, RecordParseError};
pub use types::{AttributeType, ObjectType};
