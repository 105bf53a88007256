//! The public entry point: compile a schema once, then validate any number
//! of instances against it.
use crate::{
    config::Configuration,
    error::{CompilationError, ValidationErrors},
    keywords,
    loader::Loader,
    paths::JSONPointer,
    resolver::Resolver,
    schema::Schema,
};
use serde_json::Value;
use std::rc::Rc;
use url::Url;

/// A compiled Draft 4 schema, ready to validate instances against.
///
/// Compilation resolves every `$ref` eagerly (see [`crate::resolver`]), so
/// [`Validator::validate`] never touches the network or the filesystem —
/// only [`Validator::new`]/[`Validator::with_configuration`] do, and only if
/// the schema itself contains references that cross a document boundary.
pub struct Validator {
    root: Schema,
    config: Configuration,
}

const DEFAULT_NAMESPACE: &str = "mem://root";

impl Validator {
    /// Compile `schema` with the default [`Configuration`].
    pub fn new(schema: &Value) -> Result<Self, CompilationError> {
        Self::with_configuration(schema, Configuration::new())
    }

    /// Compile `schema`, resolving any `$ref`s through `config`'s loader
    /// settings (HTTP client, embedded resources, on-disk cache).
    pub fn with_configuration(schema: &Value, config: Configuration) -> Result<Self, CompilationError> {
        let base = Url::parse(DEFAULT_NAMESPACE).expect("constant namespace parses");
        let root = {
            let mut loader = Loader::new(&config);
            let mut resolver = Resolver::new(&mut loader);
            resolver.compile(Rc::new(schema.clone()), base)?
        };
        Ok(Validator { root, config })
    }

    /// The configuration this validator was compiled with.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Validate `instance` without mutating it. Internally this validates a
    /// clone, so any coercion enabled by [`Configuration::with_coerce`] is
    /// applied to the throwaway copy and discarded; the caller's value is
    /// never touched. Use [`Validator::validate_mut`] to keep the coerced
    /// result.
    #[must_use]
    pub fn validate(&self, instance: &Value) -> ValidationErrors {
        let mut scratch = instance.clone();
        self.validate_mut(&mut scratch)
    }

    /// Validate `instance` in place: `collectionFormat` string-to-array
    /// splitting and `default` property injection are applied directly to
    /// `instance` when [`Configuration::with_coerce`] is enabled.
    #[must_use]
    pub fn validate_mut(&self, instance: &mut Value) -> ValidationErrors {
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        keywords::validate(&self.root, instance, &mut path, &self.config, &mut errors);
        errors
    }

    /// Shorthand for `self.validate(instance).is_empty()`.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate(instance).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Validator;
    use crate::config::Configuration;
    use serde_json::json;

    #[test]
    fn rejects_wrong_type() {
        let validator = Validator::new(&json!({"type": "string"})).expect("compiles");
        assert!(!validator.is_valid(&json!(42)));
        assert!(validator.is_valid(&json!("hello")));
    }

    #[test]
    fn resolves_internal_refs_and_validates_nested_fields() {
        let schema = json!({
            "type": "object",
            "properties": {
                "address": {"$ref": "#/definitions/address"}
            },
            "required": ["address"],
            "definitions": {
                "address": {
                    "type": "object",
                    "properties": {"city": {"type": "string"}},
                    "required": ["city"]
                }
            }
        });
        let validator = Validator::new(&schema).expect("compiles");
        assert!(validator.is_valid(&json!({"address": {"city": "Berlin"}})));
        let errors = validator.validate(&json!({"address": {}}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path().to_string(), "/address");
    }

    #[test]
    fn validate_does_not_mutate_the_callers_instance() {
        let schema = json!({
            "type": "array",
            "collectionFormat": "csv",
            "items": {"type": "string"}
        });
        let config = Configuration::new().with_coerce(true);
        let validator = Validator::with_configuration(&schema, config).expect("compiles");
        let instance = json!("a,b,c");
        let _ = validator.validate(&instance);
        assert_eq!(instance, json!("a,b,c"));
    }

    #[test]
    fn validate_mut_keeps_the_coercion() {
        let schema = json!({
            "type": "array",
            "collectionFormat": "csv",
            "items": {"type": "string"}
        });
        let config = Configuration::new().with_coerce(true);
        let validator = Validator::with_configuration(&schema, config).expect("compiles");
        let mut instance = json!("a,b,c");
        let errors = validator.validate_mut(&mut instance);
        assert!(errors.is_empty());
        assert_eq!(instance, json!(["a", "b", "c"]));
    }
}
