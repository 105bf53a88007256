//! Keyword dispatch: given a compiled [`Schema`] position and an instance,
//! run every keyword that applies and collect the resulting
//! [`ValidationError`]s. Composite keywords (`allOf`/`anyOf`/`oneOf`/`not`)
//! and the two structural types (`array`, `object`) recurse back into
//! [`validate`], so a schema graph of arbitrary depth (including cycles
//! closed by the resolver) is walked with a single entry point.
mod array;
mod object;

use crate::{
    canonical::canonical_key,
    config::Configuration,
    error::ValidationError,
    paths::JSONPointer,
    primitive_type::{kind_of, PrimitiveType, TypeSpec},
    schema::{Schema, SchemaNode},
};
use serde_json::Value;

/// Run every applicable keyword of `schema` against `instance`, appending
/// failures to `errors`. `instance` is mutated in place when `config.coerce`
/// is set and a keyword calls for it (`collectionFormat` splitting, default
/// injection); callers that must never observe a mutated instance should
/// validate a clone and discard it, as [`crate::Validator::validate`] does.
pub(crate) fn validate(
    schema: &Schema,
    instance: &mut Value,
    path: &mut JSONPointer,
    config: &Configuration,
    errors: &mut Vec<ValidationError>,
) {
    match schema {
        Schema::Bool(true) => {}
        Schema::Bool(false) => errors.push(ValidationError::new(path.clone(), "False schema never validates.")),
        Schema::Node(rc) => {
            let node = rc.borrow();
            validate_node(&node, instance, path, config, errors);
        }
    }
}

/// Validate `schema` against a disposable clone of `instance`, returning
/// only the errors. Used by the composite keywords: `anyOf`/`oneOf` must try
/// several branches without the coercions of a discarded branch leaking into
/// the live instance. `path` is the position the branch is evaluated at, so
/// errors from a branch nested under e.g. a property still report their real
/// location rather than resetting to the document root.
fn check_only(schema: &Schema, instance: &Value, path: &JSONPointer, config: &Configuration) -> Vec<ValidationError> {
    let mut scratch = instance.clone();
    let mut local_path = path.clone();
    let mut errors = Vec::new();
    validate(schema, &mut scratch, &mut local_path, config, &mut errors);
    errors
}

fn validate_node(
    node: &SchemaNode,
    instance: &mut Value,
    path: &mut JSONPointer,
    config: &Configuration,
    errors: &mut Vec<ValidationError>,
) {
    // `type` is absent but `properties` is present: the implied type is `object`.
    let effective_types: Option<Vec<TypeSpec>> = match &node.types {
        Some(types) => Some(types.clone()),
        None if node.properties.is_some() => Some(vec![TypeSpec::Known(PrimitiveType::Object)]),
        None => None,
    };

    if let Some(types) = &effective_types {
        if config.coerce {
            coerce_instance(types, instance);
        }
        match types.iter().find_map(|t| match t {
            TypeSpec::Unknown(name) => Some(name.clone()),
            TypeSpec::Known(_) => None,
        }) {
            Some(name) => errors.push(ValidationError::new(path.clone(), format!("Cannot validate type '{}'", name))),
            None => {
                let known: Vec<PrimitiveType> = types
                    .iter()
                    .map(|t| match t {
                        TypeSpec::Known(k) => *k,
                        TypeSpec::Unknown(_) => unreachable!("checked above"),
                    })
                    .collect();
                if !known.iter().any(|t| matches_type(*t, instance)) {
                    let expected: Vec<String> = known.iter().map(ToString::to_string).collect();
                    errors.push(ValidationError::new(
                        path.clone(),
                        format!("Expected {} - got {}.", expected.join(", "), kind_of(instance)),
                    ));
                }
            }
        }
    }

    if let Some(values) = &node.enum_values {
        let key = canonical_key(instance);
        if !values.iter().any(|candidate| canonical_key(candidate) == key) {
            let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
            errors.push(ValidationError::new(path.clone(), format!("Not in enum list: {}.", rendered.join(", "))));
        }
    }

    validate_numeric(node, instance, path, config, errors);
    validate_string(node, instance, path, config, errors);

    if let Some(all_of) = &node.all_of {
        for sub in all_of {
            validate(sub, instance, path, config, errors);
        }
    }
    if let Some(any_of) = &node.any_of {
        let branch_errors: Vec<Vec<ValidationError>> = any_of.iter().map(|sub| check_only(sub, instance, path, config)).collect();
        if branch_errors.iter().all(|errs| !errs.is_empty()) {
            errors.extend(aggregate_alternatives(branch_errors));
        }
    }
    if let Some(one_of) = &node.one_of {
        let branch_errors: Vec<Vec<ValidationError>> = one_of.iter().map(|sub| check_only(sub, instance, path, config)).collect();
        let passing = branch_errors.iter().filter(|errs| errs.is_empty()).count();
        if passing == 0 {
            errors.extend(aggregate_alternatives(branch_errors));
        } else if passing > 1 {
            errors.push(ValidationError::new(path.clone(), "Expected only one to match."));
        }
    }
    if let Some(not) = &node.not {
        if check_only(not, instance, path, config).is_empty() {
            errors.push(ValidationError::new(path.clone(), "Should not match."));
        }
    }

    array::validate(node, instance, path, config, errors);
    object::validate(node, instance, path, config, errors);
}

/// Combine the error buckets of several failed alternatives (`anyOf`/`oneOf`
/// with no passing branch) into a single diagnostic per path: errors sharing
/// a path are deduplicated by message, then coalesced into one
/// `Expected X1, X2, …, Xn - got Y.` line if every one of them is a type
/// mismatch against the same actual kind, or else kept apart and prefixed by
/// the index of the alternative that produced them.
fn aggregate_alternatives(branch_errors: Vec<Vec<ValidationError>>) -> Vec<ValidationError> {
    let mut by_path: Vec<(JSONPointer, Vec<(usize, String)>)> = Vec::new();
    for (index, errors) in branch_errors.into_iter().enumerate() {
        for error in errors {
            let path = error.path().clone();
            let message = error.message().to_string();
            match by_path.iter_mut().find(|(p, _)| *p == path) {
                Some((_, messages)) => {
                    if !messages.iter().any(|(_, m)| *m == message) {
                        messages.push((index, message));
                    }
                }
                None => by_path.push((path, vec![(index, message)])),
            }
        }
    }

    let mut result = Vec::new();
    for (path, messages) in by_path {
        let parsed: Vec<Option<(String, String)>> = messages
            .iter()
            .map(|(_, m)| parse_expected_got(m).map(|(x, y)| (x.to_string(), y.to_string())))
            .collect();
        let first_actual = parsed.first().and_then(Option::as_ref).map(|(_, got)| got.clone());
        let coalesces = match &first_actual {
            Some(actual) => parsed.iter().all(|p| matches!(p, Some((_, got)) if got == actual)),
            None => false,
        };
        if coalesces {
            let actual = first_actual.expect("checked above");
            let expected: Vec<String> = parsed.into_iter().map(|p| p.expect("checked above").0).collect();
            result.push(ValidationError::new(path, format!("Expected {} - got {}.", expected.join(", "), actual)));
        } else {
            for (index, message) in messages {
                result.push(ValidationError::new(path.clone(), format!("(alternative {}) {}", index, message)));
            }
        }
    }
    result
}

fn parse_expected_got(message: &str) -> Option<(&str, &str)> {
    let rest = message.strip_prefix("Expected ")?.strip_suffix('.')?;
    rest.split_once(" - got ")
}

/// Rewrites `instance` in place, before the type check runs, so that a
/// numeric-looking string satisfies an `integer`/`number` schema and a
/// numeric instance satisfies a `string` schema (§4.5). Callers gate this on
/// `config.coerce`; `validate`'s disposable-clone entry points rely on that
/// gating to keep the rewrite from leaking into the caller's live data.
fn coerce_instance(types: &[TypeSpec], instance: &mut Value) {
    let wants_numeric = types
        .iter()
        .any(|t| matches!(t, TypeSpec::Known(PrimitiveType::Integer) | TypeSpec::Known(PrimitiveType::Number)));
    let wants_string = types.iter().any(|t| matches!(t, TypeSpec::Known(PrimitiveType::String)));

    if wants_numeric {
        if let Value::String(s) = instance {
            if let Ok(i) = s.parse::<i64>() {
                *instance = Value::from(i);
            } else if let Ok(f) = s.parse::<f64>() {
                if let Some(n) = serde_json::Number::from_f64(f) {
                    *instance = Value::Number(n);
                }
            }
        }
    }
    if wants_string {
        if let Value::Number(n) = instance {
            *instance = Value::String(n.to_string());
        }
    }
}

fn matches_type(expected: PrimitiveType, instance: &Value) -> bool {
    match expected {
        PrimitiveType::Null => instance.is_null(),
        PrimitiveType::Boolean => instance.is_boolean(),
        PrimitiveType::Integer => kind_of(instance) == PrimitiveType::Integer,
        PrimitiveType::Number => matches!(kind_of(instance), PrimitiveType::Integer | PrimitiveType::Number),
        PrimitiveType::String => instance.is_string(),
        PrimitiveType::Array => instance.is_array(),
        PrimitiveType::Object => instance.is_object(),
        PrimitiveType::Any | PrimitiveType::File => true,
    }
}

fn validate_numeric(
    node: &SchemaNode,
    instance: &Value,
    path: &JSONPointer,
    config: &Configuration,
    errors: &mut Vec<ValidationError>,
) {
    let num = match instance {
        Value::Number(n) => n,
        _ => return,
    };
    let display = num.as_f64().unwrap_or(f64::NAN);

    if let Some(format) = &node.format {
        validate_format(format, instance, path, config, errors);
    }

    if let Some(multiple) = node.multiple_of {
        let quotient = display / multiple;
        if (quotient - quotient.round()).abs() > 1e-9 {
            errors.push(ValidationError::new(path.clone(), format!("Not multiple of {}.", multiple)));
        }
    }
    if let Some(maximum) = node.maximum {
        if exceeds_maximum(num, maximum, node.exclusive_maximum) {
            let op = if node.exclusive_maximum { ">=" } else { ">" };
            errors.push(ValidationError::new(path.clone(), format!("{} {} maximum({})", display, op, maximum)));
        }
    }
    if let Some(minimum) = node.minimum {
        if below_minimum(num, minimum, node.exclusive_minimum) {
            let op = if node.exclusive_minimum { "<=" } else { "<" };
            errors.push(ValidationError::new(path.clone(), format!("{} {} minimum({})", display, op, minimum)));
        }
    }
}

/// Compares the instance's native numeric representation (`i64`/`u64`/`f64`)
/// against a schema bound without first lossily widening a large integer to
/// `f64`, using `num_cmp`'s cross-type comparisons.
fn exceeds_maximum(num: &serde_json::Number, bound: f64, exclusive: bool) -> bool {
    use num_cmp::NumCmp;
    if let Some(i) = num.as_i64() {
        if exclusive { i.num_ge(bound) } else { i.num_gt(bound) }
    } else if let Some(u) = num.as_u64() {
        if exclusive { u.num_ge(bound) } else { u.num_gt(bound) }
    } else {
        let f = num.as_f64().unwrap_or(f64::NAN);
        if exclusive { f >= bound } else { f > bound }
    }
}

fn below_minimum(num: &serde_json::Number, bound: f64, exclusive: bool) -> bool {
    use num_cmp::NumCmp;
    if let Some(i) = num.as_i64() {
        if exclusive { i.num_le(bound) } else { i.num_lt(bound) }
    } else if let Some(u) = num.as_u64() {
        if exclusive { u.num_le(bound) } else { u.num_lt(bound) }
    } else {
        let f = num.as_f64().unwrap_or(f64::NAN);
        if exclusive { f <= bound } else { f < bound }
    }
}

fn validate_string(
    node: &SchemaNode,
    instance: &Value,
    path: &JSONPointer,
    config: &Configuration,
    errors: &mut Vec<ValidationError>,
) {
    let text = match instance.as_str() {
        Some(s) => s,
        None => return,
    };
    let char_count = text.chars().count();
    if let Some(max) = node.max_length {
        if char_count > max {
            errors.push(ValidationError::new(path.clone(), format!("String is too long: {}/{}.", char_count, max)));
        }
    }
    if let Some(min) = node.min_length {
        if char_count < min {
            errors.push(ValidationError::new(path.clone(), format!("String is too short: {}/{}.", char_count, min)));
        }
    }
    if let Some(pattern) = &node.pattern {
        if !pattern.is_match(text) {
            errors.push(ValidationError::new(path.clone(), format!("String does not match '{}'", pattern)));
        }
    }
    if let Some(format) = &node.format {
        validate_format(format, instance, path, config, errors);
    }
}

/// Looks up `format` in the configured table and applies its predicate to
/// `instance`. Shared between the numeric and string validators: §4.3 lists
/// `format` among what both the `number` and `string` type validators apply.
fn validate_format(format: &str, instance: &Value, path: &JSONPointer, config: &Configuration, errors: &mut Vec<ValidationError>) {
    match config.formats.get(format) {
        Some(predicate) => {
            if !predicate(instance) {
                errors.push(ValidationError::new(path.clone(), format!("Does not match {} format.", format)));
            }
        }
        None => {
            if config.warn_on_missing_format {
                eprintln!("warning: unknown format '{}', skipping", format);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    #[test]
    fn type_mismatch_is_reported() {
        let mut node = SchemaNode::empty();
        node.types = Some(vec![TypeSpec::Known(PrimitiveType::String)]);
        let mut instance = serde_json::json!(42);
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&Schema::node(node), &mut instance, &mut path, &Configuration::new(), &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn integer_satisfies_number_type() {
        let mut node = SchemaNode::empty();
        node.types = Some(vec![TypeSpec::Known(PrimitiveType::Number)]);
        let mut instance = serde_json::json!(5);
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&Schema::node(node), &mut instance, &mut path, &Configuration::new(), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn one_of_rejects_when_more_than_one_branch_matches() {
        let mut node = SchemaNode::empty();
        node.one_of = Some(vec![Schema::Bool(true), Schema::Bool(true)]);
        let mut instance = serde_json::json!(1);
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&Schema::node(node), &mut instance, &mut path, &Configuration::new(), &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn not_rejects_when_the_inner_schema_matches() {
        let mut node = SchemaNode::empty();
        node.not = Some(Box::new(Schema::Bool(true)));
        let mut instance = serde_json::json!(1);
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&Schema::node(node), &mut instance, &mut path, &Configuration::new(), &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn any_of_branch_coercion_does_not_leak_into_the_live_instance() {
        let mut coercing = SchemaNode::empty();
        coercing.collection_format = Some(crate::schema::CollectionFormat::Csv);
        let mut rejecting = SchemaNode::empty();
        rejecting.types = Some(vec![TypeSpec::Known(PrimitiveType::Null)]);
        let mut node = SchemaNode::empty();
        node.any_of = Some(vec![Schema::node(rejecting), Schema::node(coercing)]);
        let mut instance = serde_json::json!("a,b");
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(
            &Schema::node(node),
            &mut instance,
            &mut path,
            &Configuration::new().with_coerce(true),
            &mut errors,
        );
        assert_eq!(instance, serde_json::json!("a,b"));
    }

    #[test]
    fn all_of_branches_apply_to_the_same_location_not_a_synthetic_index() {
        let mut branch = SchemaNode::empty();
        branch.types = Some(vec![TypeSpec::Known(PrimitiveType::Integer)]);
        let mut property = SchemaNode::empty();
        property.all_of = Some(vec![Schema::node(branch)]);
        let mut node = SchemaNode::empty();
        node.properties = Some(vec![("age".to_string(), Schema::node(property))]);
        let mut instance = serde_json::json!({"age": "x"});
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&Schema::node(node), &mut instance, &mut path, &Configuration::new(), &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path().to_string(), "/age");
    }

    #[test]
    fn unknown_type_name_fails_at_validate_time() {
        let mut node = SchemaNode::empty();
        node.types = Some(vec![TypeSpec::Unknown("widget".to_string())]);
        let mut instance = serde_json::json!(1);
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&Schema::node(node), &mut instance, &mut path, &Configuration::new(), &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Cannot validate type 'widget'");
    }

    #[test]
    fn properties_without_an_explicit_type_implies_object() {
        let mut child = SchemaNode::empty();
        child.types = Some(vec![TypeSpec::Known(PrimitiveType::String)]);
        let mut node = SchemaNode::empty();
        node.properties = Some(vec![("a".to_string(), Schema::node(child))]);
        let mut instance = serde_json::json!(5);
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&Schema::node(node), &mut instance, &mut path, &Configuration::new(), &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Expected object - got integer.");
    }

    #[test]
    fn coercion_rewrites_a_numeric_string_to_an_integer() {
        let mut node = SchemaNode::empty();
        node.types = Some(vec![TypeSpec::Known(PrimitiveType::Integer)]);
        node.minimum = Some(0.0);
        let mut instance = serde_json::json!("42");
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(
            &Schema::node(node),
            &mut instance,
            &mut path,
            &Configuration::new().with_coerce(true),
            &mut errors,
        );
        assert!(errors.is_empty());
        assert_eq!(instance, serde_json::json!(42));
    }

    #[test]
    fn coercion_rewrites_a_number_to_a_string() {
        let mut node = SchemaNode::empty();
        node.types = Some(vec![TypeSpec::Known(PrimitiveType::String)]);
        let mut instance = serde_json::json!(42);
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(
            &Schema::node(node),
            &mut instance,
            &mut path,
            &Configuration::new().with_coerce(true),
            &mut errors,
        );
        assert!(errors.is_empty());
        assert_eq!(instance, serde_json::json!("42"));
    }

    #[test]
    fn without_coercion_a_numeric_string_still_fails_integer() {
        let mut node = SchemaNode::empty();
        node.types = Some(vec![TypeSpec::Known(PrimitiveType::Integer)]);
        let mut instance = serde_json::json!("42");
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&Schema::node(node), &mut instance, &mut path, &Configuration::new(), &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(instance, serde_json::json!("42"));
    }

    #[test]
    fn numeric_format_is_checked_against_number_typed_instances() {
        let mut node = SchemaNode::empty();
        node.types = Some(vec![TypeSpec::Known(PrimitiveType::Number)]);
        node.format = Some("int32".to_string());
        let mut instance = serde_json::json!(3_000_000_000i64);
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&Schema::node(node), &mut instance, &mut path, &Configuration::new(), &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Does not match int32 format.");
    }
}
