//! Class and attribute management.

use crate::error::{OntoResult, OntologyError};
use crate::model::{
    DESCRIPTION, DOMAIN, INSTANCEOF, Label, Node, PropertyMap, PropertyValue, RANGE, SUBCLASSOF,
    TITLE,
};
use crate::store::{EdgePattern, GraphStore};

use super::Ontology;

impl<S: GraphStore> Ontology<S> {
    /// Create a class, optionally as a direct subclass of `parent_uri`.
    pub fn create_class(
        &self,
        title: &str,
        description: &str,
        parent_uri: Option<&str>,
    ) -> OntoResult<Node> {
        if let Some(parent) = parent_uri {
            self.require_class(parent)?;
        }
        let node = self.store.create_node(
            Node::new(self.new_uri(), Label::Class)
                .with_property(TITLE, title)
                .with_property(DESCRIPTION, description),
        )?;
        if let Some(parent) = parent_uri {
            self.store.create_edge(&node.uri, parent, SUBCLASSOF)?;
        }
        tracing::info!(uri = %node.uri, title, "created class");
        Ok(node)
    }

    /// The node at `uri`, if it is a Class.
    pub fn get_class(&self, uri: &str) -> OntoResult<Option<Node>> {
        self.node_with_label(uri, &Label::Class)
    }

    /// All classes, sorted by uri.
    pub fn classes(&self) -> OntoResult<Vec<Node>> {
        Ok(self.store.find_nodes_by_labels(&[Label::Class])?)
    }

    /// Update a class's title and/or description. `None` if it is not a Class.
    pub fn update_class(
        &self,
        uri: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> OntoResult<Option<Node>> {
        if self.get_class(uri)?.is_none() {
            return Ok(None);
        }
        let mut delta = PropertyMap::new();
        if let Some(title) = title {
            delta.insert(TITLE.into(), PropertyValue::from(title));
        }
        if let Some(description) = description {
            delta.insert(DESCRIPTION.into(), PropertyValue::from(description));
        }
        self.update_node(uri, &delta)
    }

    /// Make `child_uri` a direct subclass of `parent_uri`.
    pub fn add_class_parent(&self, parent_uri: &str, child_uri: &str) -> OntoResult<()> {
        self.require_class(parent_uri)?;
        self.require_class(child_uri)?;
        if self.is_subclass_of(parent_uri, child_uri)? {
            tracing::warn!(
                parent = %parent_uri,
                child = %child_uri,
                "new SUBCLASSOF edge closes a cycle"
            );
        }
        self.store.create_edge(child_uri, parent_uri, SUBCLASSOF)?;
        Ok(())
    }

    /// Remove every direct `child SUBCLASSOF parent` edge. Returns whether any existed.
    pub fn remove_class_parent(&self, parent_uri: &str, child_uri: &str) -> OntoResult<bool> {
        let edges = self
            .store
            .match_edges(&EdgePattern::outgoing(child_uri).to(parent_uri).of_type(SUBCLASSOF))?;
        let mut removed = false;
        for edge in edges {
            removed |= self.store.delete_edge(edge.id)?;
        }
        Ok(removed)
    }

    /// Direct instances of a class (not of its subclasses), sorted by uri.
    pub fn class_objects(&self, class_uri: &str) -> OntoResult<Vec<Node>> {
        let mut objects = Vec::new();
        for edge in self
            .store
            .match_edges(&EdgePattern::incoming(class_uri).of_type(INSTANCEOF))?
        {
            if let Some(object) = self.node_with_label(&edge.from_uri, &Label::Object)? {
                objects.push(object);
            }
        }
        objects.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok(objects)
    }

    /// Delete a class with its whole subtree and instances.
    pub fn delete_class(&self, uri: &str) -> OntoResult<bool> {
        self.delete_class_cascade(uri)
    }

    // -----------------------------------------------------------------------
    // Attributes
    // -----------------------------------------------------------------------

    /// Declare a scalar attribute on a class.
    pub fn add_datatype_property(&self, class_uri: &str, title: &str) -> OntoResult<Node> {
        self.require_class(class_uri)?;
        let property = self.store.create_node(
            Node::new(self.new_uri(), Label::DatatypeProperty).with_property(TITLE, title),
        )?;
        self.store.create_edge(&property.uri, class_uri, DOMAIN)?;
        tracing::info!(uri = %property.uri, class = %class_uri, title, "added datatype property");
        Ok(property)
    }

    /// Declare a relationship from instances of `class_uri` to instances of `range_class_uri`.
    pub fn add_object_property(
        &self,
        class_uri: &str,
        title: &str,
        range_class_uri: &str,
    ) -> OntoResult<Node> {
        self.require_class(class_uri)?;
        self.require_class(range_class_uri)?;
        let property = self.store.create_node(
            Node::new(self.new_uri(), Label::ObjectProperty).with_property(TITLE, title),
        )?;
        self.store.create_edge(&property.uri, class_uri, DOMAIN)?;
        self.store.create_edge(&property.uri, range_class_uri, RANGE)?;
        tracing::info!(
            uri = %property.uri,
            class = %class_uri,
            range = %range_class_uri,
            title,
            "added object property"
        );
        Ok(property)
    }

    /// Delete a DatatypeProperty node. `false` if `uri` is not one.
    pub fn delete_datatype_property(&self, uri: &str) -> OntoResult<bool> {
        self.delete_labeled(uri, &Label::DatatypeProperty)
    }

    /// Delete an ObjectProperty node. `false` if `uri` is not one.
    pub fn delete_object_property(&self, uri: &str) -> OntoResult<bool> {
        self.delete_labeled(uri, &Label::ObjectProperty)
    }

    /// Fetch a DatatypeProperty or ObjectProperty node.
    pub fn get_property(&self, uri: &str) -> OntoResult<Node> {
        self.store
            .get_node(uri)?
            .filter(|n| matches!(n.label, Label::DatatypeProperty | Label::ObjectProperty))
            .ok_or_else(|| OntologyError::PropertyNotFound { uri: uri.to_string() }.into())
    }

    pub(crate) fn delete_labeled(&self, uri: &str, label: &Label) -> OntoResult<bool> {
        if self.node_with_label(uri, label)?.is_none() {
            return Ok(false);
        }
        Ok(self.store.delete_node(uri)?)
    }
}
