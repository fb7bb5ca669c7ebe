//! Core data model: labeled nodes, typed directed edges, and property bags.
//!
//! A [`Node`] is keyed by its `uri`, which is unique across the whole graph
//! regardless of label. An [`Edge`] (an "arc") is keyed by a store-assigned
//! [`EdgeId`] and is never mutated after creation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Well-known relation types
// ---------------------------------------------------------------------------

/// `(child SUBCLASSOF parent)`: class inheritance.
pub const SUBCLASSOF: &str = "SUBCLASSOF";
/// `(property DOMAIN class)`: the class that declares a property.
pub const DOMAIN: &str = "DOMAIN";
/// `(object_property RANGE class)`: the class whose instances are valid targets.
pub const RANGE: &str = "RANGE";
/// `(object INSTANCEOF class)`: class membership of an object.
pub const INSTANCEOF: &str = "INSTANCEOF";
/// Relation type used when an edge is created without one.
pub const RELATED: &str = "RELATED";

/// Conventional display-name property.
pub const TITLE: &str = "title";
/// Conventional free-text property.
pub const DESCRIPTION: &str = "description";

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// The single type tag carried by every node.
///
/// The four ontology labels are closed variants; anything else is kept
/// verbatim in [`Label::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Label {
    Class,
    Object,
    DatatypeProperty,
    ObjectProperty,
    Custom(String),
}

impl Label {
    /// Parse a label, returning `None` for the empty string.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            None
        } else {
            Some(Self::from(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Label::Class => "Class",
            Label::Object => "Object",
            Label::DatatypeProperty => "DatatypeProperty",
            Label::ObjectProperty => "ObjectProperty",
            Label::Custom(s) => s,
        }
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Class" => Label::Class,
            "Object" => Label::Object,
            "DatatypeProperty" => Label::DatatypeProperty,
            "ObjectProperty" => Label::ObjectProperty,
            _ => Label::Custom(s),
        }
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        match label {
            Label::Custom(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Property values
// ---------------------------------------------------------------------------

/// A single scalar property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// A property value: a scalar or a flat list of scalars.
///
/// Closed on purpose so that every stored value is one of a known set of
/// shapes; nested lists and maps are rejected at deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    List(Vec<Scalar>),
    Scalar(Scalar),
}

impl PropertyValue {
    /// The text content, if this is a text scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Scalar(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Scalar(Scalar::Null))
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Scalar(Scalar::Text(s.to_string()))
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Scalar(Scalar::Text(s))
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Scalar(Scalar::Int(n))
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Scalar(Scalar::Float(n))
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Scalar(Scalar::Bool(b))
    }
}

impl From<Vec<Scalar>> for PropertyValue {
    fn from(items: Vec<Scalar>) -> Self {
        PropertyValue::List(items)
    }
}

/// Ordered property bag: key → value.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

// ---------------------------------------------------------------------------
// Nodes and edges
// ---------------------------------------------------------------------------

/// A labeled graph node with a unique `uri` and an open property bag.
///
/// `uri` and `label` are immutable once the node is stored; `properties`
/// never contains a `uri` or `label` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub uri: String,
    pub label: Label,
    #[serde(default)]
    pub properties: PropertyMap,
}

impl Node {
    pub fn new(uri: impl Into<String>, label: Label) -> Self {
        Self {
            uri: uri.into(),
            label,
            properties: PropertyMap::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The `title` property, or an empty string.
    pub fn title(&self) -> &str {
        self.text(TITLE)
    }

    /// The `description` property, or an empty string.
    pub fn description(&self) -> &str {
        self.text(DESCRIPTION)
    }

    fn text(&self, key: &str) -> &str {
        self.properties
            .get(key)
            .and_then(PropertyValue::as_str)
            .unwrap_or("")
    }

    pub fn is(&self, label: &Label) -> bool {
        &self.label == label
    }
}

/// Store-assigned identity of an edge. Never reused within a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u64);

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EdgeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(EdgeId)
    }
}

/// A typed directed edge between two node uris.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub rel_type: String,
    pub from_uri: String,
    pub to_uri: String,
}

/// Every node and edge in a graph at one point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}
