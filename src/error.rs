//! Error types.
//!
//! Two taxonomies are kept separate: [`CompilationError`] is fatal to schema
//! ingestion (a bad `$ref`, an unreachable document, an unparseable body) and
//! is returned from [`crate::Validator::schema`]. [`ValidationError`] is
//! data-level: it is collected, not thrown, and an empty [`Vec`] of them means
//! the instance is valid.
use crate::paths::JSONPointer;
use serde::Serialize;
use std::{error, fmt};

/// A single validation failure: a location within the validated instance and
/// a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    path: JSONPointer,
    message: String,
}

impl ValidationError {
    pub(crate) fn new(path: JSONPointer, message: impl Into<String>) -> Self {
        ValidationError {
            path,
            message: message.into(),
        }
    }

    /// The JSON Pointer naming the offending location within the validated instance.
    #[must_use]
    pub fn path(&self) -> &JSONPointer {
        &self.path
    }

    /// The human-readable reason validation failed at `path`.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl error::Error for ValidationError {}

impl Serialize for ValidationError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ValidationError", 2)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("path", &self.path.to_string())?;
        state.end()
    }
}

/// The ordered sequence of [`ValidationError`]s produced by a single
/// `validate` call. An empty sequence means the instance is valid.
pub type ValidationErrors = Vec<ValidationError>;

/// Errors that can occur while ingesting a schema: loading its source
/// document(s) and resolving its `$ref`s. Fatal to [`crate::Validator::schema`];
/// unlike [`ValidationError`], these are never returned from `validate`.
#[derive(Debug)]
pub enum CompilationError {
    /// A schema document could not be fetched or parsed.
    Load {
        url: String,
        cause: anyhow::Error,
    },
    /// A `$ref` could not be resolved: the target document failed to load, or
    /// the fragment named a non-existent location within it.
    Resolve {
        reference: String,
        namespace: String,
        cause: anyhow::Error,
    },
    /// A YAML document was requested but no YAML backend is compiled in
    /// (the `yaml` feature is disabled).
    YamlBackendMissing,
    /// The schema's own structure is invalid independent of any single
    /// keyword (e.g. `$ref` is not a string, or a regex `pattern` fails to
    /// compile).
    InvalidSchema(String),
}

impl fmt::Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompilationError::Load { url, cause } => {
                write!(f, "failed to load schema from '{}': {}", url, cause)
            }
            CompilationError::Resolve {
                reference,
                namespace,
                cause,
            } => write!(
                f,
                "failed to resolve reference '{}' against namespace '{}': {}",
                reference, namespace, cause
            ),
            CompilationError::YamlBackendMissing => {
                write!(f, "a YAML document was requested but no YAML backend is available")
            }
            CompilationError::InvalidSchema(reason) => {
                write!(f, "invalid schema: {}", reason)
            }
        }
    }
}

impl error::Error for CompilationError {}

impl From<regex::Error> for CompilationError {
    fn from(error: regex::Error) -> Self {
        CompilationError::InvalidSchema(error.to_string())
    }
}

impl From<url::ParseError> for CompilationError {
    fn from(error: url::ParseError) -> Self {
        CompilationError::InvalidSchema(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::ValidationError;
    use crate::paths::JSONPointer;

    #[test]
    fn display_is_path_colon_message() {
        let mut path = JSONPointer::default();
        path.push("age");
        let error = ValidationError::new(path, "-42 < minimum(0)");
        assert_eq!(error.to_string(), "/age: -42 < minimum(0)");
    }

    #[test]
    fn root_path_renders_as_slash() {
        let error = ValidationError::new(JSONPointer::default(), "Unique items required.");
        assert_eq!(error.to_string(), "/: Unique items required.");
    }
}
