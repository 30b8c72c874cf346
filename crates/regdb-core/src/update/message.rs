use crate::model::{AttributeType, CiString, ObjectType};
use std::fmt;

///
/// Severity
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
        };
        write!(f, "{label}")
    }
}

///
/// Message
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    severity: Severity,
    text: String,
}

impl Message {
    #[must_use]
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, text)
    }

    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***{}: {}", self.severity, self.text)
    }
}

///
/// messages
///
/// User-facing message texts.
///

pub mod messages {
    use super::*;

    fn join(values: &[CiString]) -> String {
        values
            .iter()
            .map(CiString::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[must_use]
    pub fn authentication_failed(
        object_type: ObjectType,
        key: &CiString,
        strategy: &str,
        candidates: &[CiString],
    ) -> Message {
        Message::error(format!(
            "Authorisation for [{object_type}] {key} failed using \"{strategy}:\"\nnot authenticated by: {}",
            join(candidates)
        ))
    }

    #[must_use]
    pub fn override_authentication_failed() -> Message {
        Message::error("Override authentication failed")
    }

    #[must_use]
    pub fn can_only_be_changed_in_lir_portal(attribute: AttributeType) -> Message {
        Message::error(format!(
            "Attribute \"{attribute}:\" can only be changed via the LIR portal. \
             Please login to the LIR portal and update the organisation from there."
        ))
    }

    #[must_use]
    pub fn org_type_requires_allocation_authority(org_type: &CiString) -> Message {
        Message::error(format!(
            "Value '{org_type}' can only be set by the registry for \"org-type:\""
        ))
    }

    #[must_use]
    pub fn object_in_use(object_type: ObjectType, key: &CiString, referrers: &[CiString]) -> Message {
        Message::error(format!(
            "Object [{object_type}] {key} is referenced from other objects: {}",
            join(referrers)
        ))
    }

    #[must_use]
    pub fn deprecated_attribute(attribute: AttributeType) -> Message {
        Message::warning(format!(
            "Deprecated attribute \"{attribute}\". This attribute will be removed."
        ))
    }

    #[must_use]
    pub fn update_failed(reason: &dyn fmt::Display) -> Message {
        Message::error(format!("Update failed: {reason}"))
    }

    #[must_use]
    pub fn update_succeeded(action: crate::update::Action, object_type: ObjectType, key: &CiString) -> Message {
        Message::info(format!("{action} SUCCEEDED: [{object_type}] {key}"))
    }
}
