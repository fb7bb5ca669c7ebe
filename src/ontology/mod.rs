//! Ontology engine: class hierarchies, inherited signatures, validated objects.
//!
//! [`Ontology`] owns a [`GraphStore`] and layers the ontology vocabulary on
//! top of it: `Class`, `Object`, `DatatypeProperty`, and `ObjectProperty`
//! nodes connected by `SUBCLASSOF`, `DOMAIN`, `RANGE`, and `INSTANCEOF` edges.
//!
//! - [`hierarchy`] — parent/child lookups and cycle-safe closures
//! - [`signature`] — effective attribute schema through inheritance
//! - [`validate`] — instance data checks against a resolved signature
//! - [`reconcile`] — converge an object's relationships to a desired set
//! - [`cascade`] — remove a class subtree and all its instances
//! - [`class`] / [`object`] — CRUD for schema and instance nodes
//!
//! The engine caches nothing between calls: every operation re-reads what it
//! needs from the store. Multi-step operations are not transactional; callers
//! that need isolation between concurrent updates of the same class subtree
//! or object must serialize those calls themselves.

pub mod cascade;
pub mod class;
pub mod hierarchy;
pub mod object;
pub mod reconcile;
pub mod signature;
pub mod validate;

use serde::{Deserialize, Serialize};

use crate::config::OntologyConfig;
use crate::error::{OntoResult, OntologyError, ValidationError};
use crate::model::{Edge, EdgeId, GraphSnapshot, Label, Node, PropertyMap, RELATED};
use crate::store::{DurableGraphStore, GraphStore, MemGraphStore};
use crate::uri::{RandomUriGenerator, UriGenerator};

pub use cascade::CascadePlan;
pub use object::{ObjectDraft, ObjectPatch, ObjectUpdate};
pub use reconcile::ReconcileReport;
pub use signature::{DatatypePropertyRef, ObjectPropertyRef, Signature};

/// Which way a relationship edge points relative to the object that owns it.
///
/// Serialized as `1` (forward) and `-1` (reverse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    /// Edge from the object to the target.
    #[default]
    Forward,
    /// Edge from the target to the object.
    Reverse,
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::Forward),
            -1 => Ok(Direction::Reverse),
            other => Err(format!("direction must be 1 or -1, got {other}")),
        }
    }
}

impl From<Direction> for i8 {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// One requested relationship of an object: `relation_uri` names an
/// ObjectProperty, `target_uri` the node on the other end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationAssignment {
    pub relation_uri: String,
    #[serde(alias = "obj_uri")]
    pub target_uri: String,
    #[serde(default)]
    pub direction: Direction,
}

impl RelationAssignment {
    pub fn new(relation_uri: impl Into<String>, target_uri: impl Into<String>, direction: Direction) -> Self {
        Self {
            relation_uri: relation_uri.into(),
            target_uri: target_uri.into(),
            direction,
        }
    }

    pub fn forward(relation_uri: impl Into<String>, target_uri: impl Into<String>) -> Self {
        Self::new(relation_uri, target_uri, Direction::Forward)
    }

    pub fn reverse(relation_uri: impl Into<String>, target_uri: impl Into<String>) -> Self {
        Self::new(relation_uri, target_uri, Direction::Reverse)
    }
}

/// Property-graph ontology over a pluggable store.
pub struct Ontology<S: GraphStore> {
    store: S,
    ids: Box<dyn UriGenerator>,
    config: OntologyConfig,
}

impl<S: GraphStore> Ontology<S> {
    /// Wrap an existing store.
    pub fn with_store(store: S, config: OntologyConfig) -> OntoResult<Self> {
        config.validate()?;
        Ok(Self {
            ids: Box::new(RandomUriGenerator::new(config.uri_length)),
            store,
            config,
        })
    }

    /// Replace the uri generator.
    pub fn with_uri_generator(mut self, ids: impl UriGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &OntologyConfig {
        &self.config
    }

    /// Generate a fresh uri in the configured namespace.
    pub fn new_uri(&self) -> String {
        self.ids.new_uri(&self.config.namespace)
    }

    // -----------------------------------------------------------------------
    // Generic nodes and edges
    // -----------------------------------------------------------------------

    /// Create a node with the given label.
    ///
    /// A text `uri` entry in `properties` is used as the node's uri; otherwise
    /// one is generated. A `label` entry is ignored in favor of `label`.
    pub fn create_node(&self, label: &str, mut properties: PropertyMap) -> OntoResult<Node> {
        let label = Label::parse(label).ok_or(ValidationError::MissingLabel)?;
        properties.remove("label");
        let uri = match properties.remove("uri") {
            Some(value) => match value.as_str() {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => self.new_uri(),
            },
            None => self.new_uri(),
        };
        let node = self.store.create_node(Node {
            uri,
            label,
            properties,
        })?;
        tracing::debug!(uri = %node.uri, label = %node.label, "created node");
        Ok(node)
    }

    pub fn get_node(&self, uri: &str) -> OntoResult<Option<Node>> {
        Ok(self.store.get_node(uri)?)
    }

    pub fn nodes_by_labels(&self, labels: &[Label]) -> OntoResult<Vec<Node>> {
        Ok(self.store.find_nodes_by_labels(labels)?)
    }

    /// Merge `properties` into an existing node. `uri` and `label` cannot change.
    pub fn update_node(&self, uri: &str, properties: &PropertyMap) -> OntoResult<Option<Node>> {
        for key in ["uri", "label"] {
            if properties.contains_key(key) {
                return Err(ValidationError::ImmutableKey { key: key.into() }.into());
            }
        }
        if properties.is_empty() {
            return self.get_node(uri);
        }
        Ok(self.store.update_node_properties(uri, properties)?)
    }

    /// Detach-delete a node of any label.
    pub fn delete_node(&self, uri: &str) -> OntoResult<bool> {
        Ok(self.store.delete_node(uri)?)
    }

    /// Create an edge; an empty relation type becomes `RELATED`.
    pub fn create_edge(&self, from_uri: &str, to_uri: &str, rel_type: &str) -> OntoResult<Edge> {
        let rel_type = if rel_type.is_empty() { RELATED } else { rel_type };
        Ok(self.store.create_edge(from_uri, to_uri, rel_type)?)
    }

    pub fn delete_edge(&self, id: EdgeId) -> OntoResult<bool> {
        Ok(self.store.delete_edge(id)?)
    }

    /// Every node and edge in the ontology.
    pub fn graph_snapshot(&self) -> OntoResult<GraphSnapshot> {
        Ok(self.store.snapshot()?)
    }

    /// Fetch a node and require it to carry `label`.
    fn node_with_label(&self, uri: &str, label: &Label) -> OntoResult<Option<Node>> {
        Ok(self.store.get_node(uri)?.filter(|n| n.is(label)))
    }

    fn require_class(&self, uri: &str) -> OntoResult<Node> {
        self.node_with_label(uri, &Label::Class)?.ok_or_else(|| {
            OntologyError::ClassNotFound {
                uri: uri.to_string(),
            }
            .into()
        })
    }
}

impl Ontology<MemGraphStore> {
    /// A memory-only ontology.
    pub fn in_memory(config: OntologyConfig) -> OntoResult<Self> {
        Self::with_store(MemGraphStore::new(), config)
    }
}

impl Ontology<DurableGraphStore> {
    /// Open the durable ontology in `config.data_dir`.
    pub fn open(config: OntologyConfig) -> OntoResult<Self> {
        let dir = config.data_dir.clone().ok_or_else(|| crate::config::ConfigError::Invalid {
            message: "data_dir is required for a durable ontology".into(),
        })?;
        let store = DurableGraphStore::open(&dir)?;
        Self::with_store(store, config)
    }
}

impl<S: GraphStore + std::fmt::Debug> std::fmt::Debug for Ontology<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ontology")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::uri::SequentialUriGenerator;

    pub fn ontology() -> Ontology<MemGraphStore> {
        ontology_with(OntologyConfig {
            namespace: "test".into(),
            ..Default::default()
        })
    }

    pub fn ontology_with(config: OntologyConfig) -> Ontology<MemGraphStore> {
        Ontology::in_memory(config)
            .unwrap()
            .with_uri_generator(SequentialUriGenerator::new())
    }
}
