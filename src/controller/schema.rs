//! The props schema contract.
//!
//! Validation itself lives outside this crate. A schema only has to name its
//! fields, optionally clean raw input, and hand out a validator.

use serde_json::Value;

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationDetail {
    /// Field name.
    pub name: String,
    /// Failure kind, e.g. `"expectedType"` or `"required"`.
    pub kind: String,
    pub message: String,
    /// The offending value.
    pub value: Value,
}

impl ValidationDetail {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            message: message.into(),
            value,
        }
    }
}

/// A failed validation, with one detail per offending field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("validation failed for {} field(s)", .details.len())]
pub struct ValidationError {
    pub details: Vec<ValidationDetail>,
}

impl ValidationError {
    pub fn new(details: Vec<ValidationDetail>) -> Self {
        Self { details }
    }
}

impl From<ValidationDetail> for ValidationError {
    fn from(detail: ValidationDetail) -> Self {
        Self {
            details: vec![detail],
        }
    }
}

/// Checks a cleaned props object.
pub trait Validate {
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;
}

impl<F> Validate for F
where
    F: Fn(&Value) -> Result<(), ValidationError>,
{
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self(value)
    }
}

/// Declared input properties of a component.
pub trait PropsSchema {
    /// Declared field names, in declaration order.
    fn object_keys(&self) -> Vec<String>;

    /// Sanitise or coerce raw input before validation. Identity by default.
    fn clean(&self, input: &Value) -> Value {
        input.clone()
    }

    /// The validator, if this schema can validate at all.
    fn validator(&self) -> Option<&dyn Validate>;
}
