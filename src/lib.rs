//! # jsonschema4
//!
//! A JSON Schema Draft 4 validator. A schema is compiled once into a
//! [`Validator`], resolving every `$ref` eagerly (including cycles), and the
//! result validates any number of instances without touching the network or
//! the filesystem again.
//!
//! ```rust
//! use jsonschema4::Validator;
//! use serde_json::json;
//!
//! let schema = json!({"type": "string", "minLength": 3});
//! let validator = Validator::new(&schema).expect("valid schema");
//! assert!(validator.is_valid(&json!("abc")));
//! assert!(!validator.is_valid(&json!("ab")));
//! ```
//!
//! Coercion (Swagger-style `collectionFormat` splitting, `default` property
//! injection) only ever happens through [`Validator::validate_mut`]; plain
//! [`Validator::validate`] never mutates the caller's instance, even with
//! coercion enabled in the [`Configuration`].
#![warn(
    clippy::cast_possible_truncation,
    clippy::doc_markdown,
    clippy::explicit_iter_loop,
    clippy::map_unwrap_or,
    clippy::match_same_arms,
    clippy::needless_borrow,
    clippy::needless_pass_by_value,
    clippy::print_stdout,
    clippy::redundant_closure,
    clippy::trivially_copy_pass_by_ref,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    variant_size_differences
)]
#![allow(clippy::unnecessary_wraps, clippy::upper_case_acronyms)]

mod canonical;
pub mod config;
pub mod error;
mod format;
mod keywords;
mod loader;
mod paths;
pub mod primitive_type;
mod resolver;
mod schema;
mod validator;

pub use config::Configuration;
pub use error::{CompilationError, ValidationError, ValidationErrors};
pub use format::FormatTable;
pub use paths::JSONPointer;
pub use validator::Validator;

use serde_json::Value;

/// A shortcut for validating `instance` against `schema` in one call. Prefer
/// [`Validator::new`] when validating more than one instance against the
/// same schema: this function recompiles the schema on every call.
///
/// # Panics
///
/// Panics if `schema` fails to compile.
#[must_use]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    Validator::new(schema).expect("invalid schema").is_valid(instance)
}

#[cfg(test)]
mod tests {
    use super::is_valid;
    use serde_json::json;

    #[test]
    fn shortcut_compiles_and_validates_in_one_call() {
        let schema = json!({"minLength": 5});
        assert!(is_valid(&schema, &json!("foobar")));
        assert!(!is_valid(&schema, &json!("foo")));
    }
}
