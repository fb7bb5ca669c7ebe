//! ACID-durable graph store backed by redb.
//!
//! Reads are served by an in-memory [`MemGraphStore`]; every mutation is
//! applied there first and then mirrored into redb in a single write
//! transaction. If the commit fails the in-memory change is undone, so memory
//! and disk never disagree. Opening a data directory replays the stored nodes
//! and edges back into memory, edge ids included.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};

use crate::error::StoreError;
use crate::model::{Edge, EdgeId, GraphSnapshot, Label, Node, PropertyMap};

use super::mem::MemGraphStore;
use super::{EdgePattern, GraphStore, StoreResult};

/// uri → JSON-encoded [`Node`].
const NODES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("nodes");
/// edge id → JSON-encoded [`Edge`].
const EDGES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("edges");
/// Counters.
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_EDGE_ID: &str = "next_edge_id";

/// File name of the database inside the data directory.
pub const DB_FILE: &str = "ontograph.redb";

fn redb_err<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::Redb {
        message: format!("{context} failed: {e}"),
    }
}

fn encode<T: serde::Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StoreError::Serialization {
        message: e.to_string(),
    })
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization {
        message: e.to_string(),
    })
}

/// Write-through persistent graph store.
pub struct DurableGraphStore {
    mem: MemGraphStore,
    db: Database,
}

impl DurableGraphStore {
    /// Open or create a durable store in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join(DB_FILE);
        let db = Database::create(&db_path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;

        // Make sure every table exists so that read transactions can open them.
        let txn = db.begin_write().map_err(redb_err("begin_write"))?;
        txn.open_table(NODES_TABLE).map_err(redb_err("open_table"))?;
        txn.open_table(EDGES_TABLE).map_err(redb_err("open_table"))?;
        txn.open_table(META_TABLE).map_err(redb_err("open_table"))?;
        txn.commit().map_err(redb_err("commit"))?;

        let (snapshot, next_edge_id) = Self::load(&db)?;
        tracing::info!(
            path = %db_path.display(),
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "opened durable graph store"
        );
        let mem = MemGraphStore::restore(snapshot, next_edge_id)?;
        Ok(Self { mem, db })
    }

    fn load(db: &Database) -> StoreResult<(GraphSnapshot, u64)> {
        let txn = db.begin_read().map_err(redb_err("begin_read"))?;

        let nodes_table = txn.open_table(NODES_TABLE).map_err(redb_err("open_table"))?;
        let mut nodes = Vec::new();
        for entry in nodes_table.iter().map_err(redb_err("iter"))? {
            let (_, value) = entry.map_err(redb_err("iter"))?;
            nodes.push(decode::<Node>(value.value())?);
        }

        let edges_table = txn.open_table(EDGES_TABLE).map_err(redb_err("open_table"))?;
        let mut edges = Vec::new();
        for entry in edges_table.iter().map_err(redb_err("iter"))? {
            let (_, value) = entry.map_err(redb_err("iter"))?;
            edges.push(decode::<Edge>(value.value())?);
        }

        let meta_table = txn.open_table(META_TABLE).map_err(redb_err("open_table"))?;
        let next_edge_id = meta_table
            .get(NEXT_EDGE_ID)
            .map_err(redb_err("get"))?
            .map(|guard| guard.value())
            .unwrap_or(1);

        Ok((GraphSnapshot { nodes, edges }, next_edge_id))
    }

    /// Run `f` inside one redb write transaction and commit it.
    fn write_txn<F>(&self, f: F) -> StoreResult<()>
    where
        F: FnOnce(&WriteTransaction) -> StoreResult<()>,
    {
        let txn = self.db.begin_write().map_err(redb_err("begin_write"))?;
        f(&txn)?;
        txn.commit().map_err(redb_err("commit"))
    }

    fn put_node(&self, node: &Node) -> StoreResult<()> {
        let bytes = encode(node)?;
        self.write_txn(|txn| {
            let mut table = txn.open_table(NODES_TABLE).map_err(redb_err("open_table"))?;
            table
                .insert(node.uri.as_str(), bytes.as_slice())
                .map_err(redb_err("insert"))?;
            Ok(())
        })
    }

    /// Undo an in-memory detach-delete after its commit failed.
    fn restore_node(&self, node: Node, edges: &[Edge]) -> StoreResult<()> {
        self.mem.create_node(node)?;
        for edge in edges {
            self.mem.reinsert_edge(edge)?;
        }
        Ok(())
    }

    /// The in-memory read path.
    pub fn memory(&self) -> &MemGraphStore {
        &self.mem
    }
}

impl GraphStore for DurableGraphStore {
    fn create_node(&self, node: Node) -> StoreResult<Node> {
        let node = self.mem.create_node(node)?;
        if let Err(e) = self.put_node(&node) {
            self.mem.delete_node(&node.uri)?;
            return Err(e);
        }
        Ok(node)
    }

    fn get_node(&self, uri: &str) -> StoreResult<Option<Node>> {
        self.mem.get_node(uri)
    }

    fn find_nodes_by_labels(&self, labels: &[Label]) -> StoreResult<Vec<Node>> {
        self.mem.find_nodes_by_labels(labels)
    }

    fn update_node_properties(&self, uri: &str, delta: &PropertyMap) -> StoreResult<Option<Node>> {
        let Some(previous) = self.mem.get_node(uri)? else {
            return Ok(None);
        };
        let updated = self.mem.update_node_properties(uri, delta)?;
        if let Some(node) = &updated {
            if let Err(e) = self.put_node(node) {
                self.mem.replace_node(previous)?;
                return Err(e);
            }
        }
        Ok(updated)
    }

    fn delete_node(&self, uri: &str) -> StoreResult<bool> {
        let Some(node) = self.mem.get_node(uri)? else {
            return Ok(false);
        };
        let touching = self.mem.edges_touching(uri)?;
        if !self.mem.delete_node(uri)? {
            return Ok(false);
        }
        let persisted = self.write_txn(|txn| {
            let mut nodes = txn.open_table(NODES_TABLE).map_err(redb_err("open_table"))?;
            nodes.remove(uri).map_err(redb_err("remove"))?;
            let mut edges = txn.open_table(EDGES_TABLE).map_err(redb_err("open_table"))?;
            for edge in &touching {
                edges.remove(edge.id.0).map_err(redb_err("remove"))?;
            }
            Ok(())
        });
        if let Err(e) = persisted {
            self.restore_node(node, &touching)?;
            return Err(e);
        }
        Ok(true)
    }

    fn create_edge(&self, from_uri: &str, to_uri: &str, rel_type: &str) -> StoreResult<Edge> {
        let edge = self.mem.create_edge(from_uri, to_uri, rel_type)?;
        let next_edge_id = self.mem.next_edge_id();
        let persisted = encode(&edge).and_then(|bytes| {
            self.write_txn(|txn| {
                let mut edges = txn.open_table(EDGES_TABLE).map_err(redb_err("open_table"))?;
                edges
                    .insert(edge.id.0, bytes.as_slice())
                    .map_err(redb_err("insert"))?;
                let mut meta = txn.open_table(META_TABLE).map_err(redb_err("open_table"))?;
                meta.insert(NEXT_EDGE_ID, next_edge_id)
                    .map_err(redb_err("insert"))?;
                Ok(())
            })
        });
        if let Err(e) = persisted {
            self.mem.delete_edge(edge.id)?;
            return Err(e);
        }
        Ok(edge)
    }

    fn delete_edge(&self, id: EdgeId) -> StoreResult<bool> {
        let Some(edge) = self.mem.edge(id)? else {
            return Ok(false);
        };
        if !self.mem.delete_edge(id)? {
            return Ok(false);
        }
        let persisted = self.write_txn(|txn| {
            let mut edges = txn.open_table(EDGES_TABLE).map_err(redb_err("open_table"))?;
            edges.remove(id.0).map_err(redb_err("remove"))?;
            Ok(())
        });
        if let Err(e) = persisted {
            self.mem.reinsert_edge(&edge)?;
            return Err(e);
        }
        Ok(true)
    }

    fn match_edges(&self, pattern: &EdgePattern) -> StoreResult<Vec<Edge>> {
        self.mem.match_edges(pattern)
    }

    fn snapshot(&self) -> StoreResult<GraphSnapshot> {
        self.mem.snapshot()
    }
}

impl std::fmt::Debug for DurableGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableGraphStore")
            .field("mem", &self.mem)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyValue;
    use tempfile::TempDir;

    #[test]
    fn nodes_and_edges_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let edge_id;
        {
            let store = DurableGraphStore::open(dir.path()).unwrap();
            store
                .create_node(Node::new("a", Label::Class).with_property("title", "A"))
                .unwrap();
            store.create_node(Node::new("b", Label::Class)).unwrap();
            edge_id = store.create_edge("a", "b", "SUBCLASSOF").unwrap().id;
        }

        let store = DurableGraphStore::open(dir.path()).unwrap();
        assert_eq!(store.get_node("a").unwrap().unwrap().title(), "A");
        let edges = store.match_edges(&EdgePattern::outgoing("a")).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].id, edge_id);
        assert_eq!(edges[0].rel_type, "SUBCLASSOF");
    }

    #[test]
    fn edge_ids_continue_after_reopen() {
        let dir = TempDir::new().unwrap();
        let first;
        {
            let store = DurableGraphStore::open(dir.path()).unwrap();
            store.create_node(Node::new("a", Label::Object)).unwrap();
            store.create_node(Node::new("b", Label::Object)).unwrap();
            first = store.create_edge("a", "b", "knows").unwrap().id;
            store.delete_edge(first).unwrap();
        }

        let store = DurableGraphStore::open(dir.path()).unwrap();
        let second = store.create_edge("a", "b", "knows").unwrap().id;
        assert!(second > first);
    }

    #[test]
    fn detach_delete_is_persisted() {
        let dir = TempDir::new().unwrap();
        {
            let store = DurableGraphStore::open(dir.path()).unwrap();
            store.create_node(Node::new("a", Label::Object)).unwrap();
            store.create_node(Node::new("b", Label::Object)).unwrap();
            store.create_edge("a", "b", "knows").unwrap();
            assert!(store.delete_node("b").unwrap());
        }

        let store = DurableGraphStore::open(dir.path()).unwrap();
        assert!(store.get_node("b").unwrap().is_none());
        assert!(store.match_edges(&EdgePattern::any()).unwrap().is_empty());
    }

    #[test]
    fn failed_detach_delete_restores_memory() {
        let dir = TempDir::new().unwrap();
        let store = DurableGraphStore::open(dir.path()).unwrap();
        store.create_node(Node::new("a", Label::Object)).unwrap();
        store.create_node(Node::new("b", Label::Object)).unwrap();
        store.create_edge("a", "b", "knows").unwrap();
        store.create_edge("b", "b", "knows").unwrap();
        let before = store.snapshot().unwrap();

        let node = store.get_node("b").unwrap().unwrap();
        let touching = store.mem.edges_touching("b").unwrap();
        store.mem.delete_node("b").unwrap();
        store.restore_node(node, &touching).unwrap();

        let after = store.snapshot().unwrap();
        assert_eq!(after.nodes, before.nodes);
        assert_eq!(after.edges, before.edges);
    }

    #[test]
    fn failed_edge_delete_restores_original_id() {
        let dir = TempDir::new().unwrap();
        let store = DurableGraphStore::open(dir.path()).unwrap();
        store.create_node(Node::new("a", Label::Object)).unwrap();
        store.create_node(Node::new("b", Label::Object)).unwrap();
        let edge = store.create_edge("a", "b", "knows").unwrap();

        store.mem.delete_edge(edge.id).unwrap();
        store.mem.reinsert_edge(&edge).unwrap();
        assert_eq!(store.mem.edge(edge.id).unwrap(), Some(edge.clone()));

        // The restored edge is the one on disk, so a real delete still works.
        assert!(store.delete_edge(edge.id).unwrap());
        drop(store);
        let store = DurableGraphStore::open(dir.path()).unwrap();
        assert!(store.match_edges(&EdgePattern::any()).unwrap().is_empty());
    }

    #[test]
    fn failed_update_restores_previous_properties() {
        let dir = TempDir::new().unwrap();
        let store = DurableGraphStore::open(dir.path()).unwrap();
        let original = store
            .create_node(Node::new("a", Label::Object).with_property("n", 1i64))
            .unwrap();

        let mut delta = PropertyMap::new();
        delta.insert("n".into(), PropertyValue::from(2i64));
        store.mem.update_node_properties("a", &delta).unwrap();
        assert!(store.mem.replace_node(original.clone()).unwrap());
        assert_eq!(store.get_node("a").unwrap(), Some(original));
    }

    #[test]
    fn deleting_missing_things_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let store = DurableGraphStore::open(dir.path()).unwrap();
        assert!(!store.delete_node("ghost").unwrap());
        assert!(!store.delete_edge(EdgeId(42)).unwrap());
        assert!(store.update_node_properties("ghost", &PropertyMap::new()).unwrap().is_none());
    }

    #[test]
    fn property_updates_are_persisted() {
        let dir = TempDir::new().unwrap();
        {
            let store = DurableGraphStore::open(dir.path()).unwrap();
            store.create_node(Node::new("a", Label::Object)).unwrap();
            let mut delta = PropertyMap::new();
            delta.insert("n".into(), PropertyValue::from(7i64));
            store.update_node_properties("a", &delta).unwrap();
        }

        let store = DurableGraphStore::open(dir.path()).unwrap();
        let node = store.get_node("a").unwrap().unwrap();
        assert_eq!(node.properties["n"], PropertyValue::from(7i64));
    }
}
