//! The compiled schema graph: [`SchemaNode`] holds one schema's keywords in
//! typed fields, and [`Schema`] is a position that can hold either a boolean
//! schema or a node. Nested positions (`items`, `properties`, `allOf`, ...)
//! and `$ref` targets are [`Rc<RefCell<_>>`] so that cyclic schemas can be
//! built without an arena: the resolver installs an empty placeholder node
//! before recursing into a reference's target, and a self-referential schema
//! closes the cycle onto that same `Rc`.
use crate::primitive_type::TypeSpec;
use regex::Regex;
use serde_json::Value;
use std::{cell::RefCell, fmt, rc::Rc};

/// A schema position: Draft 4 allows `true`/`false` anywhere a schema is
/// expected, meaning respectively "anything validates" and "nothing does".
#[derive(Clone)]
pub(crate) enum Schema {
    Bool(bool),
    Node(Rc<RefCell<SchemaNode>>),
}

impl Schema {
    pub(crate) fn node(node: SchemaNode) -> Self {
        Schema::Node(Rc::new(RefCell::new(node)))
    }

    pub(crate) fn placeholder() -> Rc<RefCell<SchemaNode>> {
        Rc::new(RefCell::new(SchemaNode::empty()))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Bool(b) => write!(f, "Schema::Bool({})", b),
            Schema::Node(_) => f.write_str("Schema::Node(..)"),
        }
    }
}

/// The `items` keyword: either a single schema applied to every element, or
/// an ordered sequence of per-position schemas ("tuple validation").
#[derive(Clone, Debug)]
pub(crate) enum Items {
    Single(Schema),
    Tuple(Vec<Schema>),
}

/// The `additionalProperties` keyword: a bare boolean, or a schema that
/// remaining (non-`properties`, non-`patternProperties`) keys must satisfy.
#[derive(Clone, Debug)]
pub(crate) enum AdditionalProperties {
    Allowed(bool),
    Schema(Schema),
}

/// The `additionalItems` keyword, with the same shape as `additionalProperties`.
#[derive(Clone, Debug)]
pub(crate) enum AdditionalItems {
    Allowed(bool),
    Schema(Schema),
}

/// Swagger's `collectionFormat` extension on array-typed `items`: how a
/// delimited string instance is split before element validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CollectionFormat {
    Csv,
    Ssv,
    Tsv,
    Pipes,
}

impl CollectionFormat {
    pub(crate) fn from_str(value: &str) -> Option<Self> {
        match value {
            "csv" => Some(CollectionFormat::Csv),
            "ssv" => Some(CollectionFormat::Ssv),
            "tsv" => Some(CollectionFormat::Tsv),
            "pipes" => Some(CollectionFormat::Pipes),
            _ => None,
        }
    }

    pub(crate) fn split<'a>(self, s: &'a str) -> Vec<&'a str> {
        let sep = match self {
            CollectionFormat::Csv => ',',
            CollectionFormat::Ssv => ' ',
            CollectionFormat::Tsv => '\t',
            CollectionFormat::Pipes => '|',
        };
        s.split(sep).collect()
    }
}

/// One compiled schema's keywords. Every field is optional: an absent field
/// means the corresponding keyword imposes no constraint, as per Draft 4
/// semantics.
pub(crate) struct SchemaNode {
    pub(crate) id: Option<String>,

    pub(crate) types: Option<Vec<TypeSpec>>,

    pub(crate) enum_values: Option<Vec<Value>>,

    pub(crate) all_of: Option<Vec<Schema>>,
    pub(crate) any_of: Option<Vec<Schema>>,
    pub(crate) one_of: Option<Vec<Schema>>,
    pub(crate) not: Option<Box<Schema>>,

    pub(crate) multiple_of: Option<f64>,
    pub(crate) maximum: Option<f64>,
    pub(crate) exclusive_maximum: bool,
    pub(crate) minimum: Option<f64>,
    pub(crate) exclusive_minimum: bool,

    pub(crate) max_length: Option<usize>,
    pub(crate) min_length: Option<usize>,
    pub(crate) pattern: Option<Regex>,
    pub(crate) format: Option<String>,

    pub(crate) items: Option<Items>,
    pub(crate) additional_items: Option<AdditionalItems>,
    pub(crate) max_items: Option<usize>,
    pub(crate) min_items: Option<usize>,
    pub(crate) unique_items: bool,
    pub(crate) collection_format: Option<CollectionFormat>,

    pub(crate) max_properties: Option<usize>,
    pub(crate) min_properties: Option<usize>,
    pub(crate) required: Option<Vec<String>>,
    /// Draft 3 legacy: `"required": true` declared directly on a property's
    /// own subschema, rather than Draft 4's array-of-names on the parent.
    pub(crate) legacy_required_flag: bool,
    pub(crate) properties: Option<Vec<(String, Schema)>>,
    pub(crate) pattern_properties: Option<Vec<(Regex, Schema)>>,
    pub(crate) additional_properties: Option<AdditionalProperties>,

    pub(crate) default: Option<Value>,
}

impl SchemaNode {
    pub(crate) fn empty() -> Self {
        SchemaNode {
            id: None,
            types: None,
            enum_values: None,
            all_of: None,
            any_of: None,
            one_of: None,
            not: None,
            multiple_of: None,
            maximum: None,
            exclusive_maximum: false,
            minimum: None,
            exclusive_minimum: false,
            max_length: None,
            min_length: None,
            pattern: None,
            format: None,
            items: None,
            additional_items: None,
            max_items: None,
            min_items: None,
            unique_items: false,
            collection_format: None,
            max_properties: None,
            min_properties: None,
            required: None,
            legacy_required_flag: false,
            properties: None,
            pattern_properties: None,
            additional_properties: None,
            default: None,
        }
    }

    /// Look up a declared property's subschema by name, preserving the
    /// document's own declaration order.
    pub(crate) fn property(&self, name: &str) -> Option<&Schema> {
        self.properties
            .as_ref()
            .and_then(|props| props.iter().find(|(key, _)| key == name).map(|(_, s)| s))
    }
}

impl fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keywords = Vec::new();
        if self.types.is_some() {
            keywords.push("type");
        }
        if self.enum_values.is_some() {
            keywords.push("enum");
        }
        if self.properties.is_some() {
            keywords.push("properties");
        }
        if self.items.is_some() {
            keywords.push("items");
        }
        f.debug_struct("SchemaNode")
            .field("id", &self.id)
            .field("keywords", &keywords)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionFormat, Schema, SchemaNode};

    #[test]
    fn placeholder_is_an_empty_node() {
        let placeholder = Schema::placeholder();
        assert!(placeholder.borrow().types.is_none());
    }

    #[test]
    fn collection_format_splits_on_its_separator() {
        assert_eq!(CollectionFormat::Pipes.split("a|b|c"), vec!["a", "b", "c"]);
        assert_eq!(CollectionFormat::Csv.split("a,b"), vec!["a", "b"]);
    }

    #[test]
    fn property_lookup_preserves_first_match() {
        let mut node = SchemaNode::empty();
        node.properties = Some(vec![("name".to_string(), Schema::Bool(true))]);
        assert!(node.property("name").is_some());
        assert!(node.property("missing").is_none());
    }
}
