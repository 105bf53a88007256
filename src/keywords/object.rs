//! Object-typed keywords: `properties`, `patternProperties`,
//! `additionalProperties`, `required` (and its Draft 3 per-property legacy
//! form), `maxProperties`/`minProperties`, and `default` injection.
use crate::{
    config::Configuration,
    error::ValidationError,
    paths::JSONPointer,
    schema::{AdditionalProperties, Schema, SchemaNode},
};
use serde_json::Value;
use std::collections::HashSet;

/// Metadata keywords exempted from the "additional properties not allowed"
/// check. Carried over from the source implementation: an instance object
/// that happens to use `id`/`title`/`description` as data keys is never
/// reported as violating `additionalProperties: false`.
const METADATA_ALLOWLIST: [&str; 3] = ["id", "title", "description"];

pub(super) fn validate(
    node: &SchemaNode,
    instance: &mut Value,
    path: &mut JSONPointer,
    config: &Configuration,
    errors: &mut Vec<ValidationError>,
) {
    let map = match instance {
        Value::Object(map) => map,
        _ => return,
    };

    if let Some(max) = node.max_properties {
        if map.len() > max {
            errors.push(ValidationError::new(
                path.clone(),
                format!("Object has {} properties, maximum {} allowed.", map.len(), max),
            ));
        }
    }
    if let Some(min) = node.min_properties {
        if map.len() < min {
            errors.push(ValidationError::new(
                path.clone(),
                format!("Object has {} properties, minimum {} required.", map.len(), min),
            ));
        }
    }

    let mut required: Vec<&str> = node.required.as_ref().map_or_else(Vec::new, |names| {
        names.iter().map(String::as_str).collect()
    });
    if let Some(properties) = &node.properties {
        for (name, schema) in properties {
            if let Schema::Node(rc) = schema {
                if rc.borrow().legacy_required_flag {
                    required.push(name.as_str());
                }
            }
        }
    }
    for name in &required {
        if !map.contains_key(*name) {
            path.push(*name);
            errors.push(ValidationError::new(path.clone(), "Missing property."));
            path.pop();
        }
    }

    if config.coerce {
        if let Some(properties) = &node.properties {
            for (name, schema) in properties {
                if map.contains_key(name) {
                    continue;
                }
                if let Schema::Node(rc) = schema {
                    if let Some(default) = rc.borrow().default.clone() {
                        map.insert(name.clone(), default);
                    }
                }
            }
        }
    }

    let mut consumed: HashSet<String> = HashSet::new();

    if let Some(properties) = &node.properties {
        for (name, schema) in properties {
            if let Some(value) = map.get_mut(name) {
                consumed.insert(name.clone());
                path.push(name.as_str());
                super::validate(schema, value, path, config, errors);
                path.pop();
            }
        }
    }
    if let Some(pattern_properties) = &node.pattern_properties {
        for (pattern, schema) in pattern_properties {
            let matching: Vec<String> = map.keys().filter(|key| pattern.is_match(key)).cloned().collect();
            for key in matching {
                consumed.insert(key.clone());
                if let Some(value) = map.get_mut(&key) {
                    path.push(key.as_str());
                    super::validate(schema, value, path, config, errors);
                    path.pop();
                }
            }
        }
    }

    match &node.additional_properties {
        Some(AdditionalProperties::Allowed(false)) => {
            let mut extra: Vec<&str> = map
                .keys()
                .filter(|key| !consumed.contains(*key) && !METADATA_ALLOWLIST.contains(&key.as_str()))
                .map(String::as_str)
                .collect();
            if !extra.is_empty() {
                extra.sort_unstable();
                errors.push(ValidationError::new(
                    path.clone(),
                    format!("Properties not allowed: {}.", extra.join(", ")),
                ));
            }
        }
        Some(AdditionalProperties::Schema(schema)) => {
            let extra_keys: Vec<String> = map.keys().filter(|key| !consumed.contains(*key)).cloned().collect();
            for key in extra_keys {
                if let Some(value) = map.get_mut(&key) {
                    path.push(key.as_str());
                    super::validate(schema, value, path, config, errors);
                    path.pop();
                }
            }
        }
        None | Some(AdditionalProperties::Allowed(true)) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_property_is_reported() {
        let mut node = SchemaNode::empty();
        node.required = Some(vec!["name".to_string()]);
        let mut instance = serde_json::json!({});
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&node, &mut instance, &mut path, &Configuration::new(), &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn legacy_required_flag_on_a_property_schema_makes_it_required() {
        let mut property = SchemaNode::empty();
        property.legacy_required_flag = true;
        let mut node = SchemaNode::empty();
        node.properties = Some(vec![("name".to_string(), Schema::node(property))]);
        let mut instance = serde_json::json!({});
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&node, &mut instance, &mut path, &Configuration::new(), &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn metadata_keys_are_exempt_from_additional_properties() {
        let mut node = SchemaNode::empty();
        node.additional_properties = Some(AdditionalProperties::Allowed(false));
        let mut instance = serde_json::json!({"id": "x", "extra": 1});
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&node, &mut instance, &mut path, &Configuration::new(), &mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().contains("extra"));
        assert!(!errors[0].message().contains('"'));
    }

    #[test]
    fn default_is_injected_only_when_coercion_is_enabled() {
        let mut property = SchemaNode::empty();
        property.default = Some(serde_json::json!(42));
        let mut node = SchemaNode::empty();
        node.properties = Some(vec![("count".to_string(), Schema::node(property))]);
        let mut instance = serde_json::json!({});
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        validate(&node, &mut instance, &mut path, &Configuration::new().with_coerce(true), &mut errors);
        assert_eq!(instance, serde_json::json!({"count": 42}));
    }
}
