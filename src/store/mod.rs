//! Graph store adapters.
//!
//! The ontology engine only talks to storage through the [`GraphStore`] trait:
//! node and edge CRUD plus edge pattern matching. Two adapters are provided:
//!
//! - [`MemGraphStore`] — petgraph-backed graph with DashMap indexes; lost on exit
//! - [`DurableGraphStore`] — the in-memory graph mirrored into redb, one ACID
//!   transaction per store operation

pub mod durable;
pub mod mem;

pub use durable::DurableGraphStore;
pub use mem::MemGraphStore;

use crate::error::StoreError;
use crate::model::{Edge, EdgeId, GraphSnapshot, Label, Node, PropertyMap};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Filter over edges. `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgePattern {
    pub from_uri: Option<String>,
    pub to_uri: Option<String>,
    pub rel_type: Option<String>,
}

impl EdgePattern {
    /// Match every edge in the graph.
    pub fn any() -> Self {
        Self::default()
    }

    /// Edges leaving `uri`.
    pub fn outgoing(uri: &str) -> Self {
        Self {
            from_uri: Some(uri.to_string()),
            ..Self::default()
        }
    }

    /// Edges arriving at `uri`.
    pub fn incoming(uri: &str) -> Self {
        Self {
            to_uri: Some(uri.to_string()),
            ..Self::default()
        }
    }

    /// Restrict the other endpoint to `uri`.
    pub fn to(mut self, uri: &str) -> Self {
        self.to_uri = Some(uri.to_string());
        self
    }

    /// Restrict the source endpoint to `uri`.
    pub fn from_node(mut self, uri: &str) -> Self {
        self.from_uri = Some(uri.to_string());
        self
    }

    /// Restrict the relation type.
    pub fn of_type(mut self, rel_type: &str) -> Self {
        self.rel_type = Some(rel_type.to_string());
        self
    }

    pub fn matches(&self, edge: &Edge) -> bool {
        self.from_uri.as_deref().is_none_or(|u| u == edge.from_uri)
            && self.to_uri.as_deref().is_none_or(|u| u == edge.to_uri)
            && self.rel_type.as_deref().is_none_or(|t| t == edge.rel_type)
    }
}

/// Storage collaborator consumed by the ontology engine.
///
/// Each call is atomic on its own; there is no multi-call transaction.
/// Results that are lists come back in a deterministic order (nodes by uri,
/// edges by id) so that callers can rely on stable output for a fixed graph.
pub trait GraphStore: Send + Sync {
    /// Store a new node. Fails with [`StoreError::DuplicateUri`] if the uri is taken.
    fn create_node(&self, node: Node) -> StoreResult<Node>;

    fn get_node(&self, uri: &str) -> StoreResult<Option<Node>>;

    /// Nodes carrying any of the given labels.
    fn find_nodes_by_labels(&self, labels: &[Label]) -> StoreResult<Vec<Node>>;

    /// Merge `delta` into the node's properties. Returns `None` if the node is absent.
    fn update_node_properties(&self, uri: &str, delta: &PropertyMap) -> StoreResult<Option<Node>>;

    /// Detach-delete: remove the node and every edge touching it.
    fn delete_node(&self, uri: &str) -> StoreResult<bool>;

    /// Create an edge. Fails with [`StoreError::EndpointMissing`] if either end is absent.
    fn create_edge(&self, from_uri: &str, to_uri: &str, rel_type: &str) -> StoreResult<Edge>;

    fn delete_edge(&self, id: EdgeId) -> StoreResult<bool>;

    fn match_edges(&self, pattern: &EdgePattern) -> StoreResult<Vec<Edge>>;

    /// Every node and edge.
    fn snapshot(&self) -> StoreResult<GraphSnapshot>;

    /// Edges touching `uri` in either direction, each reported once.
    fn edges_touching(&self, uri: &str) -> StoreResult<Vec<Edge>> {
        let mut edges = self.match_edges(&EdgePattern::outgoing(uri))?;
        edges.extend(
            self.match_edges(&EdgePattern::incoming(uri))?
                .into_iter()
                .filter(|e| e.from_uri != uri),
        );
        edges.sort_by_key(|e| e.id);
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, to: &str, rel: &str) -> Edge {
        Edge {
            id: EdgeId(1),
            rel_type: rel.into(),
            from_uri: from.into(),
            to_uri: to.into(),
        }
    }

    #[test]
    fn pattern_matching() {
        let e = edge("a", "b", "SUBCLASSOF");
        assert!(EdgePattern::any().matches(&e));
        assert!(EdgePattern::outgoing("a").matches(&e));
        assert!(!EdgePattern::outgoing("b").matches(&e));
        assert!(EdgePattern::incoming("b").of_type("SUBCLASSOF").matches(&e));
        assert!(!EdgePattern::incoming("b").of_type("DOMAIN").matches(&e));
        assert!(EdgePattern::outgoing("a").to("b").matches(&e));
        assert!(!EdgePattern::incoming("b").from_node("c").matches(&e));
    }

    #[test]
    fn edges_touching_reports_self_loops_once() {
        let store = MemGraphStore::new();
        store.create_node(Node::new("a", Label::Object)).unwrap();
        store.create_node(Node::new("b", Label::Object)).unwrap();
        store.create_edge("a", "a", "knows").unwrap();
        store.create_edge("a", "b", "knows").unwrap();
        store.create_edge("b", "a", "knows").unwrap();

        let touching = store.edges_touching("a").unwrap();
        assert_eq!(touching.len(), 3);
    }
}
