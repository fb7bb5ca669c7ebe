//! Cascading class deletion.
//!
//! Deleting a class removes the class, every transitive subclass, and every
//! instance of any of them. Instances go first so that no Object is ever left
//! pointing at a deleted Class.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::OntoResult;
use crate::model::{DOMAIN, INSTANCEOF, Label, RANGE};
use crate::store::{EdgePattern, GraphStore};

use super::Ontology;

/// Everything a cascading delete of one class will remove.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadePlan {
    /// The class and all its transitive subclasses.
    pub classes: Vec<String>,
    /// Instances of any class in `classes`.
    pub objects: Vec<String>,
    /// Property nodes declared on (or ranging over) deleted classes. Only
    /// populated when orphan cleanup is enabled.
    pub properties: Vec<String>,
}

impl<S: GraphStore> Ontology<S> {
    /// Compute what [`delete_class_cascade`](Self::delete_class_cascade) would
    /// remove, without touching the graph. `None` if the class does not exist.
    pub fn plan_class_cascade(&self, class_uri: &str) -> OntoResult<Option<CascadePlan>> {
        let classes: Vec<String> = self
            .descendants_inclusive(class_uri)?
            .into_iter()
            .map(|c| c.uri)
            .collect();
        if classes.is_empty() {
            return Ok(None);
        }

        let mut objects = BTreeSet::new();
        let mut properties = BTreeSet::new();
        for class in &classes {
            for edge in self
                .store
                .match_edges(&EdgePattern::incoming(class).of_type(INSTANCEOF))?
            {
                if self.node_with_label(&edge.from_uri, &Label::Object)?.is_some() {
                    objects.insert(edge.from_uri);
                }
            }
            if self.config.cleanup_orphans {
                for rel_type in [DOMAIN, RANGE] {
                    for edge in self
                        .store
                        .match_edges(&EdgePattern::incoming(class).of_type(rel_type))?
                    {
                        let is_property = self.store.get_node(&edge.from_uri)?.is_some_and(|n| {
                            matches!(n.label, Label::DatatypeProperty | Label::ObjectProperty)
                        });
                        if is_property {
                            properties.insert(edge.from_uri);
                        }
                    }
                }
            }
        }

        Ok(Some(CascadePlan {
            classes,
            objects: objects.into_iter().collect(),
            properties: properties.into_iter().collect(),
        }))
    }

    /// Delete a class, its transitive subclasses, and all their instances.
    ///
    /// Returns `false` if `class_uri` is not a Class.
    pub fn delete_class_cascade(&self, class_uri: &str) -> OntoResult<bool> {
        let Some(plan) = self.plan_class_cascade(class_uri)? else {
            return Ok(false);
        };

        for uri in &plan.objects {
            self.store.delete_node(uri)?;
        }
        for uri in &plan.classes {
            self.store.delete_node(uri)?;
        }
        for uri in &plan.properties {
            self.store.delete_node(uri)?;
        }

        tracing::info!(
            class = %class_uri,
            classes = plan.classes.len(),
            objects = plan.objects.len(),
            properties = plan.properties.len(),
            "deleted class cascade"
        );
        Ok(true)
    }
}
