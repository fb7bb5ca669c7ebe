//! Object (instance) CRUD.
//!
//! Every write path resolves the class signature and validates the full input
//! before the first mutation, so a rejected create or update leaves the graph
//! exactly as it was.

use serde::{Deserialize, Serialize};

use crate::error::{OntoResult, OntologyError};
use crate::model::{DESCRIPTION, INSTANCEOF, Label, Node, PropertyMap, PropertyValue, TITLE};
use crate::store::GraphStore;

use super::reconcile::ReconcileReport;
use super::validate::check_properties;
use super::{Ontology, RelationAssignment};

/// Input for a new object. `properties` is keyed by DatatypeProperty uri.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: PropertyMap,
    #[serde(default, alias = "object_properties")]
    pub relations: Vec<RelationAssignment>,
}

impl ObjectDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, property_uri: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(property_uri.into(), value.into());
        self
    }

    pub fn with_relation(mut self, relation: RelationAssignment) -> Self {
        self.relations.push(relation);
        self
    }
}

/// Changes to an existing object.
///
/// `properties` are merged into the node. `relations`, when present, is the
/// complete desired relationship set and is reconciled against the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: PropertyMap,
    #[serde(default, alias = "object_properties")]
    pub relations: Option<Vec<RelationAssignment>>,
}

/// Result of [`Ontology::update_object`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectUpdate {
    pub node: Node,
    pub report: ReconcileReport,
}

impl<S: GraphStore> Ontology<S> {
    /// Create an instance of `class_uri`.
    pub fn create_object(&self, class_uri: &str, draft: ObjectDraft) -> OntoResult<Node> {
        let signature = self.resolve_signature(class_uri)?;
        check_properties(&signature, &draft.properties)?;
        let relations = self.check_relations(&signature, &draft.relations)?;

        let mut node = Node::new(self.new_uri(), Label::Object)
            .with_property(TITLE, draft.title)
            .with_property(DESCRIPTION, draft.description);
        node.properties.extend(draft.properties);
        let node = self.store.create_node(node)?;

        self.store.create_edge(&node.uri, class_uri, INSTANCEOF)?;
        for rel in &relations {
            let (from, to) = rel.endpoints(&node.uri);
            self.store.create_edge(from, to, &rel.rel_type)?;
        }

        tracing::info!(
            uri = %node.uri,
            class = %class_uri,
            relations = relations.len(),
            "created object"
        );
        Ok(node)
    }

    /// The node at `uri`, if it is an Object.
    pub fn get_object(&self, uri: &str) -> OntoResult<Option<Node>> {
        self.node_with_label(uri, &Label::Object)
    }

    /// The class an object is an instance of.
    pub fn object_class(&self, uri: &str) -> OntoResult<Option<Node>> {
        if self.get_object(uri)?.is_none() {
            return Ok(None);
        }
        let class_uri = self.object_class_uri(uri)?;
        self.get_class(&class_uri)
    }

    /// Apply a patch to an object. Nothing changes if any part of it is invalid.
    pub fn update_object(&self, uri: &str, patch: ObjectPatch) -> OntoResult<ObjectUpdate> {
        if self.get_object(uri)?.is_none() {
            return Err(OntologyError::ObjectNotFound { uri: uri.to_string() }.into());
        }
        let class_uri = self.object_class_uri(uri)?;
        let signature = self.resolve_signature(&class_uri)?;
        check_properties(&signature, &patch.properties)?;
        let relations = match &patch.relations {
            Some(desired) => Some(self.check_relations(&signature, desired)?),
            None => None,
        };

        let report = match relations {
            Some(valid) => self.apply_relations(uri, &signature, &valid)?,
            None => ReconcileReport::default(),
        };

        let mut delta = patch.properties;
        if let Some(title) = patch.title {
            delta.insert(TITLE.into(), PropertyValue::from(title));
        }
        if let Some(description) = patch.description {
            delta.insert(DESCRIPTION.into(), PropertyValue::from(description));
        }
        let node = self
            .update_node(uri, &delta)?
            .ok_or_else(|| OntologyError::ObjectNotFound { uri: uri.to_string() })?;

        tracing::info!(
            uri = %uri,
            created = report.created.len(),
            deleted = report.deleted.len(),
            "updated object"
        );
        Ok(ObjectUpdate { node, report })
    }

    /// Detach-delete an object. `false` if `uri` is not an Object.
    pub fn delete_object(&self, uri: &str) -> OntoResult<bool> {
        self.delete_labeled(uri, &Label::Object)
    }
}
