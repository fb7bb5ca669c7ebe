//! In-memory graph store backed by petgraph with DashMap indexes.
//!
//! Nodes and edges live in a `StableDiGraph` so that indices stay valid across
//! deletions. Two secondary indexes give O(1) lookups by node uri and by edge id.
//! All data is lost on process exit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use dashmap::DashMap;
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::error::StoreError;
use crate::model::{Edge, EdgeId, GraphSnapshot, Label, Node, PropertyMap};

use super::{EdgePattern, GraphStore, StoreResult};

/// Edge weight stored on petgraph edges.
#[derive(Debug, Clone)]
struct EdgeData {
    id: EdgeId,
    rel_type: String,
}

type Graph = StableDiGraph<Node, EdgeData>;

/// Concurrent in-memory property graph.
pub struct MemGraphStore {
    graph: RwLock<Graph>,
    /// uri → NodeIndex.
    node_index: DashMap<String, NodeIndex>,
    /// EdgeId → EdgeIndex.
    edge_index: DashMap<EdgeId, EdgeIndex>,
    /// Next edge id to hand out. Ids are never reused.
    next_edge_id: AtomicU64,
}

impl MemGraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(StableDiGraph::new()),
            node_index: DashMap::new(),
            edge_index: DashMap::new(),
            next_edge_id: AtomicU64::new(1),
        }
    }

    /// Rebuild a store from a snapshot, keeping every edge's original id.
    ///
    /// `next_edge_id` is raised past the highest restored id if needed.
    pub fn restore(snapshot: GraphSnapshot, next_edge_id: u64) -> StoreResult<Self> {
        let store = Self::new();
        {
            let mut graph = store.write()?;
            for node in snapshot.nodes {
                if store.node_index.contains_key(&node.uri) {
                    return Err(StoreError::DuplicateUri { uri: node.uri });
                }
                let uri = node.uri.clone();
                let idx = graph.add_node(node);
                store.node_index.insert(uri, idx);
            }
            let mut max_id = 0;
            for edge in snapshot.edges {
                store.insert_edge(&mut graph, edge.id, &edge.from_uri, &edge.to_uri, &edge.rel_type)?;
                max_id = max_id.max(edge.id.0);
            }
            store
                .next_edge_id
                .store(next_edge_id.max(max_id + 1), Ordering::Relaxed);
        }
        Ok(store)
    }

    /// The id the next created edge will receive.
    pub fn next_edge_id(&self) -> u64 {
        self.next_edge_id.load(Ordering::Relaxed)
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    /// Look up a single edge by id.
    pub fn edge(&self, id: EdgeId) -> StoreResult<Option<Edge>> {
        let graph = self.read()?;
        Ok(self
            .edge_index
            .get(&id)
            .and_then(|eidx| edge_at(&graph, *eidx.value())))
    }

    /// Put back an edge that was removed, under its original id.
    pub(crate) fn reinsert_edge(&self, edge: &Edge) -> StoreResult<()> {
        let mut graph = self.write()?;
        if self.edge_index.contains_key(&edge.id) {
            return Ok(());
        }
        self.insert_edge(&mut graph, edge.id, &edge.from_uri, &edge.to_uri, &edge.rel_type)?;
        Ok(())
    }

    /// Overwrite the stored copy of an existing node. `false` if it is absent.
    pub(crate) fn replace_node(&self, node: Node) -> StoreResult<bool> {
        let mut graph = self.write()?;
        let Some(slot) = self.lookup(&node.uri).and_then(|idx| graph.node_weight_mut(idx)) else {
            return Ok(false);
        };
        *slot = node;
        Ok(true)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Graph>> {
        self.graph.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Graph>> {
        self.graph.write().map_err(|_| StoreError::LockPoisoned)
    }

    fn lookup(&self, uri: &str) -> Option<NodeIndex> {
        self.node_index.get(uri).map(|idx| *idx.value())
    }

    fn insert_edge(
        &self,
        graph: &mut Graph,
        id: EdgeId,
        from_uri: &str,
        to_uri: &str,
        rel_type: &str,
    ) -> StoreResult<Edge> {
        let missing = |uri: &str| StoreError::EndpointMissing {
            rel_type: rel_type.to_string(),
            uri: uri.to_string(),
        };
        let from = self.lookup(from_uri).ok_or_else(|| missing(from_uri))?;
        let to = self.lookup(to_uri).ok_or_else(|| missing(to_uri))?;
        let eidx = graph.add_edge(
            from,
            to,
            EdgeData {
                id,
                rel_type: rel_type.to_string(),
            },
        );
        self.edge_index.insert(id, eidx);
        Ok(Edge {
            id,
            rel_type: rel_type.to_string(),
            from_uri: from_uri.to_string(),
            to_uri: to_uri.to_string(),
        })
    }
}

/// Materialize the edge at `eidx` with its endpoint uris.
fn edge_at(graph: &Graph, eidx: EdgeIndex) -> Option<Edge> {
    let (src, dst) = graph.edge_endpoints(eidx)?;
    let data = graph.edge_weight(eidx)?;
    Some(Edge {
        id: data.id,
        rel_type: data.rel_type.clone(),
        from_uri: graph.node_weight(src)?.uri.clone(),
        to_uri: graph.node_weight(dst)?.uri.clone(),
    })
}

impl GraphStore for MemGraphStore {
    fn create_node(&self, node: Node) -> StoreResult<Node> {
        let mut graph = self.write()?;
        if self.node_index.contains_key(&node.uri) {
            return Err(StoreError::DuplicateUri { uri: node.uri });
        }
        let idx = graph.add_node(node.clone());
        self.node_index.insert(node.uri.clone(), idx);
        Ok(node)
    }

    fn get_node(&self, uri: &str) -> StoreResult<Option<Node>> {
        let graph = self.read()?;
        Ok(self
            .lookup(uri)
            .and_then(|idx| graph.node_weight(idx))
            .cloned())
    }

    fn find_nodes_by_labels(&self, labels: &[Label]) -> StoreResult<Vec<Node>> {
        if labels.is_empty() {
            return Ok(vec![]);
        }
        let graph = self.read()?;
        let mut nodes: Vec<Node> = graph
            .node_indices()
            .filter_map(|idx| graph.node_weight(idx))
            .filter(|n| labels.contains(&n.label))
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok(nodes)
    }

    fn update_node_properties(&self, uri: &str, delta: &PropertyMap) -> StoreResult<Option<Node>> {
        let mut graph = self.write()?;
        let Some(node) = self.lookup(uri).and_then(|idx| graph.node_weight_mut(idx)) else {
            return Ok(None);
        };
        node.properties
            .extend(delta.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(Some(node.clone()))
    }

    fn delete_node(&self, uri: &str) -> StoreResult<bool> {
        let mut graph = self.write()?;
        let Some(idx) = self.lookup(uri) else {
            return Ok(false);
        };
        let touching: Vec<EdgeId> = graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().id)
            .collect();
        for id in touching {
            self.edge_index.remove(&id);
        }
        graph.remove_node(idx);
        self.node_index.remove(uri);
        Ok(true)
    }

    fn create_edge(&self, from_uri: &str, to_uri: &str, rel_type: &str) -> StoreResult<Edge> {
        let mut graph = self.write()?;
        // Check endpoints before burning an id.
        for uri in [from_uri, to_uri] {
            if self.lookup(uri).is_none() {
                return Err(StoreError::EndpointMissing {
                    rel_type: rel_type.to_string(),
                    uri: uri.to_string(),
                });
            }
        }
        let id = EdgeId(self.next_edge_id.fetch_add(1, Ordering::Relaxed));
        self.insert_edge(&mut graph, id, from_uri, to_uri, rel_type)
    }

    fn delete_edge(&self, id: EdgeId) -> StoreResult<bool> {
        let mut graph = self.write()?;
        let Some((_, eidx)) = self.edge_index.remove(&id) else {
            return Ok(false);
        };
        Ok(graph.remove_edge(eidx).is_some())
    }

    fn match_edges(&self, pattern: &EdgePattern) -> StoreResult<Vec<Edge>> {
        let graph = self.read()?;
        let candidates: Vec<EdgeIndex> = if let Some(from) = &pattern.from_uri {
            match self.lookup(from) {
                Some(idx) => graph
                    .edges_directed(idx, Direction::Outgoing)
                    .map(|e| e.id())
                    .collect(),
                None => return Ok(vec![]),
            }
        } else if let Some(to) = &pattern.to_uri {
            match self.lookup(to) {
                Some(idx) => graph
                    .edges_directed(idx, Direction::Incoming)
                    .map(|e| e.id())
                    .collect(),
                None => return Ok(vec![]),
            }
        } else {
            graph.edge_indices().collect()
        };

        let mut edges: Vec<Edge> = candidates
            .into_iter()
            .filter_map(|eidx| edge_at(&graph, eidx))
            .filter(|e| pattern.matches(e))
            .collect();
        edges.sort_by_key(|e| e.id);
        Ok(edges)
    }

    fn snapshot(&self) -> StoreResult<GraphSnapshot> {
        let graph = self.read()?;
        let mut nodes: Vec<Node> = graph
            .node_indices()
            .filter_map(|idx| graph.node_weight(idx))
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.uri.cmp(&b.uri));
        let mut edges: Vec<Edge> = graph
            .edge_indices()
            .filter_map(|eidx| edge_at(&graph, eidx))
            .collect();
        edges.sort_by_key(|e| e.id);
        Ok(GraphSnapshot { nodes, edges })
    }
}

impl Default for MemGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemGraphStore")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}
