//! Array-typed keywords: `items`, `additionalItems`, `maxItems`, `minItems`,
//! `uniqueItems`, and the Swagger `collectionFormat` coercion.
use crate::{
    canonical::canonical_key,
    config::Configuration,
    error::ValidationError,
    paths::JSONPointer,
    schema::{AdditionalItems, Items, SchemaNode},
};
use serde_json::Value;

pub(super) fn validate(
    node: &SchemaNode,
    instance: &mut Value,
    path: &mut JSONPointer,
    config: &Configuration,
    errors: &mut Vec<ValidationError>,
) {
    if config.coerce {
        if let Some(format) = node.collection_format {
            if let Value::String(raw) = instance {
                let parts: Vec<Value> = format.split(raw).into_iter().map(|p| Value::String(p.to_string())).collect();
                *instance = Value::Array(parts);
            }
        }
    }

    let items = match instance {
        Value::Array(items) => items,
        _ => return,
    };

    if let Some(max) = node.max_items {
        if items.len() > max {
            errors.push(ValidationError::new(path.clone(), format!("Too many items: {}/{}.", items.len(), max)));
        }
    }
    if let Some(min) = node.min_items {
        if items.len() < min {
            errors.push(ValidationError::new(path.clone(), format!("Not enough items: {}/{}.", items.len(), min)));
        }
    }
    if node.unique_items {
        let mut seen: Vec<String> = Vec::with_capacity(items.len());
        for item in items.iter() {
            let key = canonical_key(item);
            if seen.contains(&key) {
                errors.push(ValidationError::new(path.clone(), "Unique items required."));
                break;
            }
            seen.push(key);
        }
    }

    match &node.items {
        Some(Items::Single(schema)) => {
            for (idx, item) in items.iter_mut().enumerate() {
                path.push(idx);
                super::validate(schema, item, path, config, errors);
                path.pop();
            }
        }
        Some(Items::Tuple(schemas)) => {
            for (idx, schema) in schemas.iter().enumerate() {
                if let Some(item) = items.get_mut(idx) {
                    path.push(idx);
                    super::validate(schema, item, path, config, errors);
                    path.pop();
                }
            }
            if items.len() > schemas.len() {
                match &node.additional_items {
                    Some(AdditionalItems::Allowed(false)) => {
                        errors.push(ValidationError::new(
                            path.clone(),
                            format!("Too many items: {}/{}.", items.len(), schemas.len()),
                        ));
                    }
                    Some(AdditionalItems::Schema(schema)) => {
                        for idx in schemas.len()..items.len() {
                            path.push(idx);
                            super::validate(schema, &mut items[idx], path, config, errors);
                            path.pop();
                        }
                    }
                    None | Some(AdditionalItems::Allowed(true)) => {
                        if let Some(last) = schemas.last() {
                            for idx in schemas.len()..items.len() {
                                path.push(idx);
                                super::validate(last, &mut items[idx], path, config, errors);
                                path.pop();
                            }
                        }
                    }
                }
            }
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CollectionFormat, Schema};

    #[test]
    fn collection_format_splits_a_delimited_string_when_coercion_enabled() {
        let mut node = SchemaNode::empty();
        node.collection_format = Some(CollectionFormat::Csv);
        let mut instance = Value::String("a,b,c".to_string());
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        let config = Configuration::new().with_coerce(true);
        validate(&node, &mut instance, &mut path, &config, &mut errors);
        assert_eq!(instance, serde_json::json!(["a", "b", "c"]));
    }

    #[test]
    fn duplicate_items_are_rejected_when_unique() {
        let mut node = SchemaNode::empty();
        node.unique_items = true;
        let mut instance = serde_json::json!([1, 2, 1]);
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        let config = Configuration::new();
        validate(&node, &mut instance, &mut path, &config, &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn tuple_items_reject_extra_elements_when_additional_items_forbidden() {
        let mut node = SchemaNode::empty();
        node.items = Some(Items::Tuple(vec![Schema::Bool(true)]));
        node.additional_items = Some(AdditionalItems::Allowed(false));
        let mut instance = serde_json::json!([1, 2]);
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        let config = Configuration::new();
        validate(&node, &mut instance, &mut path, &config, &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn tuple_items_repeat_the_last_schema_over_extra_elements_by_default() {
        use crate::primitive_type::{PrimitiveType, TypeSpec};

        let mut tail = SchemaNode::empty();
        tail.types = Some(vec![TypeSpec::Known(PrimitiveType::String)]);
        let mut node = SchemaNode::empty();
        node.items = Some(Items::Tuple(vec![Schema::Bool(true), Schema::node(tail)]));
        let mut instance = serde_json::json!([1, "ok", "also-ok", 3]);
        let mut path = JSONPointer::default();
        let mut errors = Vec::new();
        let config = Configuration::new();
        validate(&node, &mut instance, &mut path, &config, &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path().to_string(), "/3");
    }
}
