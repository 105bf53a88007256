//! Eager `$ref` resolution.
//!
//! Every `$ref` is resolved once, at ingestion time: [`Resolver::compile`]
//! walks the raw schema document and produces a [`Schema`] graph with no
//! `$ref` keys left in it. Cycles are closed by installing an empty
//! placeholder node in a memo table *before* recursing into a reference's
//! target; a self-referential schema then resolves the cycle onto that same
//! [`Rc`] instead of recursing forever.
use crate::{
    error::CompilationError,
    primitive_type::TypeSpec,
    schema::{AdditionalItems, AdditionalProperties, CollectionFormat, Items, Schema, SchemaNode},
};
use ahash::AHashMap;
use serde_json::Value;
use std::{borrow::Cow, cell::RefCell, rc::Rc};
use url::Url;

/// Supplies the raw document behind a namespace the resolver doesn't already
/// hold, so that `$ref`s crossing document boundaries can be followed.
/// Implemented by [`crate::loader::Loader`].
pub(crate) trait DocumentStore {
    fn get(&mut self, namespace: &Url) -> Result<Rc<Value>, CompilationError>;
}

pub(crate) struct Resolver<'a> {
    store: &'a mut dyn DocumentStore,
    documents: AHashMap<Url, Rc<Value>>,
    memo: AHashMap<String, Rc<RefCell<SchemaNode>>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(store: &'a mut dyn DocumentStore) -> Self {
        Resolver {
            store,
            documents: AHashMap::new(),
            memo: AHashMap::new(),
        }
    }

    /// Compile `root` (already loaded, namespaced at `base`) into a [`Schema`]
    /// graph with every `$ref` eagerly resolved.
    pub(crate) fn compile(&mut self, root: Rc<Value>, base: Url) -> Result<Schema, CompilationError> {
        let base = canonicalize_namespace(&base);
        self.documents.insert(base.clone(), Rc::clone(&root));
        self.compile_value(&root, &base)
    }

    fn document(&mut self, namespace: &Url) -> Result<Rc<Value>, CompilationError> {
        if let Some(doc) = self.documents.get(namespace) {
            return Ok(Rc::clone(doc));
        }
        let doc = self.store.get(namespace)?;
        self.documents.insert(namespace.clone(), Rc::clone(&doc));
        Ok(doc)
    }

    fn compile_value(&mut self, value: &Value, namespace: &Url) -> Result<Schema, CompilationError> {
        match value {
            Value::Bool(b) => Ok(Schema::Bool(*b)),
            Value::Object(map) => {
                if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                    self.resolve_ref(reference, namespace)
                } else {
                    let placeholder = Schema::placeholder();
                    self.fill(&placeholder, map, namespace)?;
                    Ok(Schema::Node(placeholder))
                }
            }
            other => Err(CompilationError::InvalidSchema(format!(
                "expected a schema (object or boolean), found {}",
                crate::primitive_type::kind_of(other)
            ))),
        }
    }

    fn resolve_ref(&mut self, reference: &str, namespace: &Url) -> Result<Schema, CompilationError> {
        let (target_namespace, fragment) = split_reference(namespace, reference)?;
        let key = format!("{}#{}", target_namespace, fragment);
        if let Some(existing) = self.memo.get(&key) {
            return Ok(Schema::Node(Rc::clone(existing)));
        }
        let placeholder = Schema::placeholder();
        self.memo.insert(key.clone(), Rc::clone(&placeholder));

        let document = self.document(&target_namespace).map_err(|cause| CompilationError::Resolve {
            reference: reference.to_string(),
            namespace: namespace.to_string(),
            cause: anyhow::anyhow!(cause),
        })?;
        let pointer = if fragment.is_empty() { "" } else { &fragment };
        let target = document.pointer(pointer).ok_or_else(|| CompilationError::Resolve {
            reference: reference.to_string(),
            namespace: namespace.to_string(),
            cause: anyhow::anyhow!("no such location in the target document"),
        })?;
        match target {
            Value::Object(map) => self.fill(&placeholder, map, &target_namespace)?,
            Value::Bool(_) => {
                return Err(CompilationError::Resolve {
                    reference: reference.to_string(),
                    namespace: namespace.to_string(),
                    cause: anyhow::anyhow!("a boolean schema cannot be the target of $ref"),
                })
            }
            other => {
                return Err(CompilationError::Resolve {
                    reference: reference.to_string(),
                    namespace: namespace.to_string(),
                    cause: anyhow::anyhow!(
                        "expected a schema object, found {}",
                        crate::primitive_type::kind_of(other)
                    ),
                })
            }
        }
        Ok(Schema::Node(placeholder))
    }

    fn fill(
        &mut self,
        placeholder: &Rc<RefCell<SchemaNode>>,
        map: &serde_json::Map<String, Value>,
        namespace: &Url,
    ) -> Result<(), CompilationError> {
        let namespace = match map.get("id").and_then(Value::as_str) {
            Some(id) => namespace.join(id)?,
            None => namespace.clone(),
        };

        let mut node = SchemaNode::empty();
        node.id = Some(namespace.to_string());

        if let Some(type_value) = map.get("type") {
            node.types = Some(parse_types(type_value)?);
        }
        if let Some(enum_value) = map.get("enum").and_then(Value::as_array) {
            node.enum_values = Some(enum_value.clone());
        }
        if let Some(all_of) = map.get("allOf").and_then(Value::as_array) {
            node.all_of = Some(self.compile_each(all_of, &namespace)?);
        }
        if let Some(any_of) = map.get("anyOf").and_then(Value::as_array) {
            node.any_of = Some(self.compile_each(any_of, &namespace)?);
        }
        if let Some(one_of) = map.get("oneOf").and_then(Value::as_array) {
            node.one_of = Some(self.compile_each(one_of, &namespace)?);
        }
        if let Some(not) = map.get("not") {
            node.not = Some(Box::new(self.compile_value(not, &namespace)?));
        }

        node.multiple_of = map.get("multipleOf").and_then(Value::as_f64);
        node.maximum = map.get("maximum").and_then(Value::as_f64);
        node.exclusive_maximum = map.get("exclusiveMaximum").and_then(Value::as_bool).unwrap_or(false);
        node.minimum = map.get("minimum").and_then(Value::as_f64);
        node.exclusive_minimum = map.get("exclusiveMinimum").and_then(Value::as_bool).unwrap_or(false);

        node.max_length = map.get("maxLength").and_then(Value::as_u64).map(|n| n as usize);
        node.min_length = map.get("minLength").and_then(Value::as_u64).map(|n| n as usize);
        if let Some(pattern) = map.get("pattern").and_then(Value::as_str) {
            node.pattern = Some(regex::Regex::new(pattern)?);
        }
        node.format = map.get("format").and_then(Value::as_str).map(str::to_string);

        if let Some(items_value) = map.get("items") {
            node.items = Some(match items_value {
                Value::Array(schemas) => Items::Tuple(self.compile_each(schemas, &namespace)?),
                other => Items::Single(self.compile_value(other, &namespace)?),
            });
        }
        if let Some(format) = map.get("collectionFormat").and_then(Value::as_str) {
            node.collection_format = CollectionFormat::from_str(format);
        }
        if let Some(additional) = map.get("additionalItems") {
            node.additional_items = Some(match additional {
                Value::Bool(b) => AdditionalItems::Allowed(*b),
                other => AdditionalItems::Schema(self.compile_value(other, &namespace)?),
            });
        }
        node.max_items = map.get("maxItems").and_then(Value::as_u64).map(|n| n as usize);
        node.min_items = map.get("minItems").and_then(Value::as_u64).map(|n| n as usize);
        node.unique_items = map.get("uniqueItems").and_then(Value::as_bool).unwrap_or(false);

        node.max_properties = map.get("maxProperties").and_then(Value::as_u64).map(|n| n as usize);
        node.min_properties = map.get("minProperties").and_then(Value::as_u64).map(|n| n as usize);
        match map.get("required") {
            Some(Value::Array(names)) => {
                node.required = Some(
                    names
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                );
            }
            Some(Value::Bool(flag)) => node.legacy_required_flag = *flag,
            _ => {}
        }
        if let Some(properties) = map.get("properties").and_then(Value::as_object) {
            let mut compiled = Vec::with_capacity(properties.len());
            for (name, schema) in properties {
                compiled.push((name.clone(), self.compile_value(schema, &namespace)?));
            }
            node.properties = Some(compiled);
        }
        if let Some(pattern_properties) = map.get("patternProperties").and_then(Value::as_object) {
            let mut compiled = Vec::with_capacity(pattern_properties.len());
            for (pattern, schema) in pattern_properties {
                compiled.push((regex::Regex::new(pattern)?, self.compile_value(schema, &namespace)?));
            }
            node.pattern_properties = Some(compiled);
        }
        if let Some(additional) = map.get("additionalProperties") {
            node.additional_properties = Some(match additional {
                Value::Bool(b) => AdditionalProperties::Allowed(*b),
                other => AdditionalProperties::Schema(self.compile_value(other, &namespace)?),
            });
        }
        node.default = map.get("default").cloned();

        *placeholder.borrow_mut() = node;
        Ok(())
    }

    fn compile_each(&mut self, values: &[Value], namespace: &Url) -> Result<Vec<Schema>, CompilationError> {
        values.iter().map(|v| self.compile_value(v, namespace)).collect()
    }
}

/// Parses the `type` keyword into one [`TypeSpec`] per listed name. An
/// unrecognized name (`TypeSpec::Unknown`) is not a compilation error: only a
/// malformed shape (`type` is neither a string nor an array of strings, or an
/// array element isn't a string) fails here. See §4.3's "Unknown type" rule.
fn parse_types(value: &Value) -> Result<Vec<TypeSpec>, CompilationError> {
    match value {
        Value::String(s) => Ok(vec![TypeSpec::from(s.as_str())]),
        Value::Array(items) => items
            .iter()
            .map(|item| match item.as_str() {
                Some(s) => Ok(TypeSpec::from(s)),
                None => Err(CompilationError::InvalidSchema("type array must contain only strings".to_string())),
            })
            .collect(),
        other => Err(CompilationError::InvalidSchema(format!(
            "'type' must be a string or array of strings, found {}",
            crate::primitive_type::kind_of(other)
        ))),
    }
}

/// Strips the fragment and port from `url` so that two references differing
/// only in those (`http://host:8080/schema#/x` vs `http://host:9090/schema#/y`)
/// resolve to the same document cache entry.
fn canonicalize_namespace(url: &Url) -> Url {
    let mut canonical = url.clone();
    canonical.set_fragment(None);
    let _ = canonical.set_port(None);
    canonical
}

/// Normalize Swagger-style bare-word references (`"User"`) into a
/// `#/definitions/User` pointer, then resolve the result against `namespace`.
/// Returns the target document's namespace (fragment stripped) and the raw
/// fragment string.
fn split_reference(namespace: &Url, reference: &str) -> Result<(Url, String), CompilationError> {
    let normalized = normalize_reference(reference);
    let joined = namespace.join(&normalized)?;
    let fragment = joined.fragment().unwrap_or("").to_string();
    Ok((canonicalize_namespace(&joined), fragment))
}

fn normalize_reference(reference: &str) -> Cow<'_, str> {
    if reference.starts_with('#')
        || reference.starts_with('/')
        || reference.contains("://")
        || reference.contains('#')
    {
        Cow::Borrowed(reference)
    } else {
        Cow::Owned(format!("#/definitions/{}", reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyStore;
    impl DocumentStore for EmptyStore {
        fn get(&mut self, namespace: &Url) -> Result<Rc<Value>, CompilationError> {
            Err(CompilationError::Load {
                url: namespace.to_string(),
                cause: anyhow::anyhow!("no external documents in this test"),
            })
        }
    }

    fn base() -> Url {
        Url::parse("mem://root").unwrap()
    }

    #[test]
    fn bare_word_ref_normalizes_to_definitions() {
        assert_eq!(normalize_reference("PositiveInteger"), "#/definitions/PositiveInteger");
        assert_eq!(normalize_reference("#/definitions/PositiveInteger"), "#/definitions/PositiveInteger");
    }

    #[test]
    fn self_referential_schema_closes_the_cycle() {
        let root = serde_json::json!({
            "definitions": {
                "node": {
                    "type": "object",
                    "properties": {
                        "children": {
                            "type": "array",
                            "items": {"$ref": "#/definitions/node"}
                        }
                    }
                }
            },
            "$ref": "#/definitions/node"
        });
        let mut store = EmptyStore;
        let mut resolver = Resolver::new(&mut store);
        let compiled = resolver.compile(Rc::new(root), base()).expect("compiles");
        match compiled {
            Schema::Node(outer) => {
                let items_schema = {
                    let borrowed = outer.borrow();
                    let children = borrowed.property("children").expect("has children");
                    match children {
                        Schema::Node(n) => {
                            let inner = n.borrow();
                            match inner.items.as_ref().unwrap() {
                                Items::Single(Schema::Node(item_node)) => Rc::clone(item_node),
                                _ => panic!("expected single items schema"),
                            }
                        }
                        _ => panic!("expected node"),
                    }
                };
                assert!(Rc::ptr_eq(&outer, &items_schema));
            }
            Schema::Bool(_) => panic!("expected a node"),
        }
    }

    #[test]
    fn plain_schema_with_no_ref_compiles_directly() {
        let mut store = EmptyStore;
        let mut resolver = Resolver::new(&mut store);
        let compiled = resolver
            .compile(Rc::new(serde_json::json!({"type": "string"})), base())
            .expect("compiles");
        match compiled {
            Schema::Node(node) => assert_eq!(
                node.borrow().types.as_deref(),
                Some(&[TypeSpec::Known(crate::primitive_type::PrimitiveType::String)][..])
            ),
            Schema::Bool(_) => panic!("expected a node"),
        }
    }

    #[test]
    fn an_unrecognized_type_name_compiles_without_error() {
        let mut store = EmptyStore;
        let mut resolver = Resolver::new(&mut store);
        let compiled = resolver
            .compile(Rc::new(serde_json::json!({"type": "widget"})), base())
            .expect("unknown type names are deferred to validate time");
        match compiled {
            Schema::Node(node) => {
                assert_eq!(node.borrow().types.as_deref(), Some(&[TypeSpec::Unknown("widget".to_string())][..]));
            }
            Schema::Bool(_) => panic!("expected a node"),
        }
    }

    #[test]
    fn namespaces_differing_only_by_port_or_fragment_canonicalize_to_the_same_url() {
        let with_port = Url::parse("http://example.com:8080/schema.json#/x").unwrap();
        let without_port = Url::parse("http://example.com:9090/schema.json#/y").unwrap();
        assert_eq!(canonicalize_namespace(&with_port), canonicalize_namespace(&without_port));
    }
}
