use crate::{
    ATTRIBUTE_VALUE_COLUMN,
    model::{AttributeType, CiString, ObjectId, ObjectType, RecordHandle},
};
use std::{collections::BTreeSet, fmt};
use thiserror::Error as ThisError;

///
/// RecordParseError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RecordParseError {
    #[error("record is empty")]
    Empty,

    #[error("line {line}: expected 'attribute: value'")]
    MissingSeparator { line: usize },

    #[error("line {line}: unknown attribute '{name}'")]
    UnknownAttribute { line: usize, name: String },

    #[error("line {line}: continuation line without a preceding attribute")]
    DanglingContinuation { line: usize },

    #[error("'{attribute}' does not start a known object type")]
    UnknownObjectType { attribute: AttributeType },

    #[error("{object_type} record is missing key attribute '{attribute}'")]
    MissingKeyAttribute {
        object_type: ObjectType,
        attribute: AttributeType,
    },
}

///
/// Attribute
///
/// One `name: value` line. The value keeps its submitted text; comparisons
/// use the clean form (comment stripped, whitespace collapsed).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribute {
    attribute_type: AttributeType,
    value: String,
}

impl Attribute {
    #[must_use]
    pub fn new(attribute_type: AttributeType, value: impl Into<String>) -> Self {
        Self {
            attribute_type,
            value: value.into(),
        }
    }

    #[must_use]
    pub const fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Value with any trailing `#` comment removed and whitespace collapsed.
    #[must_use]
    pub fn clean_value(&self) -> CiString {
        let without_comment = self.value.split('#').next().unwrap_or_default();
        let collapsed = without_comment.split_whitespace().collect::<Vec<_>>().join(" ");

        CiString::new(collapsed)
    }

    /// Clean values, split on commas for list attributes.
    #[must_use]
    pub fn clean_values(&self) -> Vec<CiString> {
        let clean = self.clean_value();
        if !self.attribute_type.is_list() {
            return if clean.is_empty() { Vec::new() } else { vec![clean] };
        }

        clean
            .as_str()
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(CiString::from)
            .collect()
    }
}

///
/// Record
///
/// Immutable, ordered attribute list with a declared type and derived key.
/// The internal id is assigned by storage and absent on submitted records.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    object_id: Option<ObjectId>,
    object_type: ObjectType,
    key: CiString,
    attributes: Vec<Attribute>,
}

impl Record {
    /// Build a record; the first attribute decides the object type.
    pub fn new(attributes: Vec<Attribute>) -> Result<Self, RecordParseError> {
        let first = attributes.first().ok_or(RecordParseError::Empty)?;
        let object_type = ObjectType::from_type_attribute(first.attribute_type()).ok_or(
            RecordParseError::UnknownObjectType {
                attribute: first.attribute_type(),
            },
        )?;

        let mut key = String::new();
        for attribute in object_type.key_attributes() {
            let value = attributes
                .iter()
                .find(|candidate| candidate.attribute_type() == *attribute)
                .map(Attribute::clean_value)
                .filter(|value| !value.is_empty())
                .ok_or(RecordParseError::MissingKeyAttribute {
                    object_type,
                    attribute: *attribute,
                })?;
            key.push_str(value.as_str());
        }

        Ok(Self {
            object_id: None,
            object_type,
            key: CiString::new(key),
            attributes,
        })
    }

    /// Parse the `attribute: value` text form.
    ///
    /// Lines starting with whitespace or `+` continue the previous value.
    /// Blank lines are ignored.
    pub fn parse(text: &str) -> Result<Self, RecordParseError> {
        let mut attributes: Vec<Attribute> = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            if let Some(rest) = continuation(line) {
                let last = attributes
                    .last_mut()
                    .ok_or(RecordParseError::DanglingContinuation { line: line_no })?;
                let rest = rest.trim();
                if !rest.is_empty() {
                    last.value.push(' ');
                    last.value.push_str(rest);
                }
                continue;
            }

            let (name, value) = line
                .split_once(':')
                .ok_or(RecordParseError::MissingSeparator { line: line_no })?;
            let attribute_type =
                AttributeType::from_name(name).ok_or_else(|| RecordParseError::UnknownAttribute {
                    line: line_no,
                    name: name.trim().to_string(),
                })?;

            attributes.push(Attribute::new(attribute_type, value.trim()));
        }

        Self::new(attributes)
    }

    #[must_use]
    pub const fn object_id(&self) -> Option<ObjectId> {
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

    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Copy of this record carrying a storage-assigned id.
    #[must_use]
    pub fn with_object_id(mut self, object_id: ObjectId) -> Self {
        self.object_id = Some(object_id);
        self
    }

    /// Copy of this record with one attribute appended.
    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn contains(&self, attribute_type: AttributeType) -> bool {
        self.attributes
            .iter()
            .any(|attribute| attribute.attribute_type() == attribute_type)
    }

    /// All clean values of one attribute type, in record order.
    #[must_use]
    pub fn values(&self, attribute_type: AttributeType) -> Vec<CiString> {
        self.attributes
            .iter()
            .filter(|attribute| attribute.attribute_type() == attribute_type)
            .flat_map(Attribute::clean_values)
            .collect()
    }

    /// First clean value of one attribute type.
    #[must_use]
    pub fn value(&self, attribute_type: AttributeType) -> Option<CiString> {
        self.values(attribute_type).into_iter().next()
    }

    #[must_use]
    pub fn value_set(&self, attribute_type: AttributeType) -> BTreeSet<CiString> {
        self.values(attribute_type).into_iter().collect()
    }

    /// Identity handle; `None` until storage has assigned an id.
    #[must_use]
    pub fn handle(&self) -> Option<RecordHandle> {
        self.object_id
            .map(|object_id| RecordHandle::new(object_id, self.object_type, self.key.as_str()))
    }
}

fn continuation(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix('+') {
        return Some(rest);
    }

    line.starts_with(char::is_whitespace).then_some(line)
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for attribute in &self.attributes {
            let name = format!("{}:", attribute.attribute_type());
            writeln!(
                f,
                "{name:<width$}{}",
                attribute.value(),
                width = ATTRIBUTE_VALUE_COLUMN
            )?;
        }

        Ok(())
    }
}
