//! Relationship reconciliation for objects.
//!
//! Given the desired relationship list of an object, delete the edges that are
//! no longer wanted and create the ones that are missing. Edges whose relation
//! type is not a known ObjectProperty title of the object's class, and edges
//! to non-Object nodes, are outside the reconciler's authority and are left
//! alone. Reconciling twice with the same list changes nothing the second time.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{OntoResult, OntologyError, StoreError};
use crate::model::{Edge, EdgeId, INSTANCEOF, Label};
use crate::store::{EdgePattern, GraphStore};

use super::signature::Signature;
use super::validate::ValidRelation;
use super::{Direction, Ontology, RelationAssignment};

/// An existing edge between an object and another Object node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRelation {
    pub edge_id: EdgeId,
    pub rel_type: String,
    pub other_uri: String,
    pub direction: Direction,
}

/// Edge churn produced by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub created: Vec<Edge>,
    pub deleted: Vec<EdgeId>,
}

impl ReconcileReport {
    /// No edge was created or deleted.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty()
    }
}

impl<S: GraphStore> Ontology<S> {
    /// Validate `desired` against the object's class and converge its
    /// relationships to exactly that set.
    pub fn reconcile_relationships(
        &self,
        object_uri: &str,
        desired: &[RelationAssignment],
    ) -> OntoResult<ReconcileReport> {
        self.node_with_label(object_uri, &Label::Object)?
            .ok_or_else(|| OntologyError::ObjectNotFound {
                uri: object_uri.to_string(),
            })?;
        let class_uri = self.object_class_uri(object_uri)?;
        let signature = self.resolve_signature(&class_uri)?;
        let valid = self.check_relations(&signature, desired)?;
        self.apply_relations(object_uri, &signature, &valid)
    }

    /// Edges between `object_uri` and any Object node, with their direction
    /// relative to `object_uri`.
    pub fn current_relations(&self, object_uri: &str) -> OntoResult<Vec<CurrentRelation>> {
        let mut current = Vec::new();
        for edge in self.store.edges_touching(object_uri)? {
            let (other_uri, direction) = if edge.from_uri == object_uri {
                (edge.to_uri, Direction::Forward)
            } else {
                (edge.from_uri, Direction::Reverse)
            };
            if self.node_with_label(&other_uri, &Label::Object)?.is_none() {
                continue;
            }
            current.push(CurrentRelation {
                edge_id: edge.id,
                rel_type: edge.rel_type,
                other_uri,
                direction,
            });
        }
        Ok(current)
    }

    /// The class an object is an instance of.
    pub(crate) fn object_class_uri(&self, object_uri: &str) -> OntoResult<String> {
        self.store
            .match_edges(&EdgePattern::outgoing(object_uri).of_type(INSTANCEOF))?
            .into_iter()
            .next()
            .map(|edge| edge.to_uri)
            .ok_or_else(|| {
                StoreError::NoResult {
                    operation: format!("class of object {object_uri}"),
                }
                .into()
            })
    }

    /// Apply already-validated relationships. Deletions happen before creations.
    ///
    /// An edge is kept when its stored `(rel_type, other_uri, direction)` is
    /// wanted. `signature` only decides which relation types the reconciler
    /// owns. A self-loop has no meaningful direction and matches either.
    pub(crate) fn apply_relations(
        &self,
        object_uri: &str,
        signature: &Signature,
        desired: &[ValidRelation],
    ) -> OntoResult<ReconcileReport> {
        let wanted: HashSet<(&str, &str, Direction)> = desired
            .iter()
            .map(|r| (r.rel_type.as_str(), r.target_uri.as_str(), r.direction))
            .collect();
        let is_wanted = |rel_type: &str, other_uri: &str, direction: Direction| {
            if other_uri == object_uri {
                wanted.contains(&(rel_type, other_uri, Direction::Forward))
                    || wanted.contains(&(rel_type, other_uri, Direction::Reverse))
            } else {
                wanted.contains(&(rel_type, other_uri, direction))
            }
        };

        let mut report = ReconcileReport::default();

        for rel in self.current_relations(object_uri)? {
            if signature.object_by_title(&rel.rel_type).is_none() {
                tracing::debug!(
                    object = %object_uri,
                    rel_type = %rel.rel_type,
                    "leaving edge with unknown relation type untouched"
                );
                continue;
            }
            if !is_wanted(&rel.rel_type, &rel.other_uri, rel.direction)
                && self.store.delete_edge(rel.edge_id)?
            {
                report.deleted.push(rel.edge_id);
            }
        }

        for rel in desired {
            let (from, to) = rel.endpoints(object_uri);
            let existing = self
                .store
                .match_edges(&EdgePattern::outgoing(from).to(to).of_type(&rel.rel_type))?;
            if existing.is_empty() {
                report.created.push(self.store.create_edge(from, to, &rel.rel_type)?);
            }
        }

        tracing::debug!(
            object = %object_uri,
            created = report.created.len(),
            deleted = report.deleted.len(),
            "reconciled relationships"
        );
        Ok(report)
    }
}
