//! The type guesser: classifies a runtime [`serde_json::Value`] into one of the
//! seven JSON Schema primitive types.
use serde_json::Value;
use std::{convert::TryFrom, fmt};

/// One of the seven Draft-4 primitive types, plus the two Swagger-era
/// pseudo-types (`any`, `file`) that the dispatcher also recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
    /// Accepts any instance. Used when no `type`/`allOf`/`anyOf`/`oneOf`/`properties`
    /// is present on a schema node.
    Any,
    /// Swagger compatibility: accepts any instance, raw byte stream not inspected.
    File,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrimitiveType::Null => "null",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Number => "number",
            PrimitiveType::String => "string",
            PrimitiveType::Array => "array",
            PrimitiveType::Object => "object",
            PrimitiveType::Any => "any",
            PrimitiveType::File => "file",
        })
    }
}

impl TryFrom<&str> for PrimitiveType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "null" => Ok(PrimitiveType::Null),
            "boolean" => Ok(PrimitiveType::Boolean),
            "integer" => Ok(PrimitiveType::Integer),
            "number" => Ok(PrimitiveType::Number),
            "string" => Ok(PrimitiveType::String),
            "array" => Ok(PrimitiveType::Array),
            "object" => Ok(PrimitiveType::Object),
            "any" => Ok(PrimitiveType::Any),
            "file" => Ok(PrimitiveType::File),
            _ => Err(()),
        }
    }
}

/// A single entry of a schema's `type` keyword. An unrecognized type name is
/// not a compilation failure: it is carried through to validate time so that
/// each instance checked against it reports `Cannot validate type '<name>'`,
/// rather than refusing to compile a schema that may never be exercised
/// against that branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TypeSpec {
    Known(PrimitiveType),
    Unknown(String),
}

impl From<&str> for TypeSpec {
    fn from(value: &str) -> Self {
        PrimitiveType::try_from(value).map_or_else(|()| TypeSpec::Unknown(value.to_string()), TypeSpec::Known)
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Known(t) => fmt::Display::fmt(t, f),
            TypeSpec::Unknown(name) => f.write_str(name),
        }
    }
}

/// Classify `instance`'s runtime kind. Numbers whose underlying representation
/// is an integer report [`PrimitiveType::Integer`]; all other numbers report
/// [`PrimitiveType::Number`]. `Integer` values also satisfy `number`-typed
/// schemas elsewhere in the dispatcher; this function reports the most
/// specific kind.
#[must_use]
pub(crate) fn kind_of(instance: &Value) -> PrimitiveType {
    match instance {
        Value::Null => PrimitiveType::Null,
        Value::Bool(_) => PrimitiveType::Boolean,
        Value::Number(num) => {
            if num.is_i64() || num.is_u64() {
                PrimitiveType::Integer
            } else {
                PrimitiveType::Number
            }
        }
        Value::String(_) => PrimitiveType::String,
        Value::Array(_) => PrimitiveType::Array,
        Value::Object(_) => PrimitiveType::Object,
    }
}
