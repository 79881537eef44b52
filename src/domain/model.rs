use crate::domain::field::Field;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A submitted address: the country it belongs to plus one value per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub country_code: String,
    #[serde(default)]
    pub fields: BTreeMap<Field, String>,
}

impl Address {
    pub fn new(country_code: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
            ..Self::default()
        }
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    /// The trimmed value, or `""` when the field was not submitted.
    pub fn value(&self, field: Field) -> &str {
        self.fields.get(&field).map(|v| v.trim()).unwrap_or("")
    }

    pub fn has_value(&self, field: Field) -> bool {
        !self.value(field).is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOverride {
    Hidden,
    Optional,
    Required,
}

/// Caller-supplied adjustments to a country's field configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldOverrides {
    overrides: BTreeMap<Field, FieldOverride>,
}

impl FieldOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, value: FieldOverride) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: FieldOverride) {
        self.overrides.insert(field, value);
    }

    pub fn get(&self, field: Field) -> Option<FieldOverride> {
        self.overrides.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn is_hidden(&self, field: Field) -> bool {
        self.get(field) == Some(FieldOverride::Hidden)
    }

    pub fn is_optional(&self, field: Field) -> bool {
        self.get(field) == Some(FieldOverride::Optional)
    }

    pub fn is_required(&self, field: Field) -> bool {
        self.get(field) == Some(FieldOverride::Required)
    }

    fn fields_with(&self, value: FieldOverride) -> Vec<Field> {
        self.overrides
            .iter()
            .filter(|(_, v)| **v == value)
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn hidden_fields(&self) -> Vec<Field> {
        self.fields_with(FieldOverride::Hidden)
    }

    pub fn optional_fields(&self) -> Vec<Field> {
        self.fields_with(FieldOverride::Optional)
    }

    pub fn required_fields(&self) -> Vec<Field> {
        self.fields_with(FieldOverride::Required)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required field has no value.
    Required,
    /// A field the country does not use has a value.
    Blank,
    /// The value is not a known subdivision or does not match the postal code pattern.
    Invalid,
}

impl ViolationKind {
    pub fn message(&self) -> &'static str {
        match self {
            ViolationKind::Required => "This value should not be blank.",
            ViolationKind::Blank => "This value should be blank.",
            ViolationKind::Invalid => "This value is not valid.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    pub field: Field,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn new(field: Field, kind: ViolationKind) -> Self {
        Self { field, kind }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.kind.message())
    }
}
