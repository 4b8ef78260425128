//! Durable single-file backing (spec §4.6).
//!
//! A SQLite database (via `rusqlite`) organized as four tables —
//! `nodes`, `neighbors`, `layers`, `metadata` — opened with WAL journaling,
//! `synchronous = FULL`, a memory-resident temp store, and a negative
//! `cache_size` (a page-cache budget in KB, not SQLite's cross-connection
//! shared-cache mode — this backing only ever opens one connection per
//! file, so there is nothing to share). Vector, layer,
//! and entry-point writes are write-through; neighbor-set writes are
//! write-behind, buffered in the node cache and flushed at the points
//! spec §9 requires: end of every public write operation, end of every
//! batch, and on close.
//!
//! [`NodeStore`] and [`LayerStore`] both overlap on method names
//! (`get`, `remove`, `contains`, `list_ids`, `clear`), so a single type
//! cannot implement both without making ordinary method calls
//! ambiguous. [`DurableNodeStore`] and [`DurableLayerStore`] are thin
//! handles onto one shared [`DurableInner`] — one open file, one
//! connection, two interfaces — produced together by [`DurableBacking::open`].

use super::{LayerStore, Node, NodeStore};
use crate::codec;
use crate::error::{Error, Result};
use crate::vector::NodeId;
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const METADATA_ENTRY_POINT_KEY: &str = "entry_point";

struct DurableInner {
    conn: Mutex<Connection>,
    node_cache: RwLock<FxHashMap<NodeId, Node>>,
    dirty: RwLock<FxHashSet<NodeId>>,
    entry_point: RwLock<Option<NodeId>>,
    layer_cache: RwLock<FxHashMap<NodeId, u8>>,
}

impl DurableInner {
    fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.pragma_update(None, "cache_size", -(8 * 1024))?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS nodes (id BLOB PRIMARY KEY, vector BLOB NOT NULL);
             CREATE TABLE IF NOT EXISTS neighbors (id BLOB PRIMARY KEY, edges BLOB NOT NULL);
             CREATE TABLE IF NOT EXISTS layers (id BLOB PRIMARY KEY, layer INTEGER NOT NULL);
             CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL);",
        )?;

        let entry_point: Option<String> = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![METADATA_ENTRY_POINT_KEY],
                |row| row.get(0),
            )
            .optional()?;
        let entry_point = match entry_point {
            Some(s) if !s.is_empty() => Some(
                s.parse::<NodeId>()
                    .map_err(|e| Error::Io(format!("corrupt entry point metadata: {e}")))?,
            ),
            _ => None,
        };

        Ok(Self {
            conn: Mutex::new(conn),
            node_cache: RwLock::new(FxHashMap::default()),
            dirty: RwLock::new(FxHashSet::default()),
            entry_point: RwLock::new(entry_point),
            layer_cache: RwLock::new(FxHashMap::default()),
        })
    }

    fn load_neighbors_from_db(conn: &Connection, id: NodeId) -> Result<BTreeMap<u8, Vec<NodeId>>> {
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT edges FROM neighbors WHERE id = ?1",
                params![id.to_bytes().to_vec()],
                |row| row.get(0),
            )
            .optional()?;
        match blob {
            Some(bytes) => codec::decode_neighbors(&bytes),
            None => Ok(BTreeMap::new()),
        }
    }

    fn load_node_from_db(conn: &Connection, id: NodeId) -> Result<Option<Node>> {
        let vector_blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT vector FROM nodes WHERE id = ?1",
                params![id.to_bytes().to_vec()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(vector_blob) = vector_blob else {
            return Ok(None);
        };
        let vector = codec::decode_vector(&vector_blob)?;
        let neighbors = Self::load_neighbors_from_db(conn, id)?;
        Ok(Some(Node { id, vector, neighbors }))
    }

    fn cache_insert(&self, node: Node) {
        self.node_cache.write().insert(node.id, node);
    }

    fn write_entry_point(&self, conn: &Connection, id: Option<NodeId>) -> Result<()> {
        let text = id.map(|i| i.to_string()).unwrap_or_default();
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![METADATA_ENTRY_POINT_KEY, text],
        )?;
        Ok(())
    }
}

/// A pair of handles onto one open durable file: a [`NodeStore`] side
/// and a [`LayerStore`] side, sharing one SQLite connection.
pub struct DurableBacking {
    /// The node-storage handle.
    pub nodes: DurableNodeStore,
    /// The layer-storage handle.
    pub layers: DurableLayerStore,
}

impl DurableBacking {
    /// Opens (creating if absent) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = Arc::new(DurableInner::open(path)?);
        Ok(Self {
            nodes: DurableNodeStore(inner.clone()),
            layers: DurableLayerStore(inner),
        })
    }

    /// Flushes pending neighbor writes (see [`NodeStore::flush`]).
    pub fn close(self) -> Result<()> {
        self.nodes.flush()
    }
}

/// Node-storage handle onto a [`DurableBacking`].
#[derive(Clone)]
pub struct DurableNodeStore(Arc<DurableInner>);

/// Layer-storage handle onto a [`DurableBacking`].
#[derive(Clone)]
pub struct DurableLayerStore(Arc<DurableInner>);

impl NodeStore for DurableNodeStore {
    fn count(&self) -> usize {
        let conn = self.0.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get::<_, i64>(0))
            .map(|c| c as usize)
            .unwrap_or(0)
    }

    fn add(&self, id: NodeId, vector: Vec<f32>) -> Result<()> {
        let inner = &self.0;
        let conn = inner.conn.lock();
        let was_empty = conn
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get::<_, i64>(0))?
            == 0;
        conn.execute(
            "INSERT INTO nodes (id, vector) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET vector = excluded.vector",
            params![id.to_bytes().to_vec(), codec::encode_vector(&vector)],
        )?;
        conn.execute("DELETE FROM neighbors WHERE id = ?1", params![id.to_bytes().to_vec()])?;
        inner.dirty.write().remove(&id);
        inner.cache_insert(Node {
            id,
            vector,
            neighbors: BTreeMap::new(),
        });
        if was_empty {
            inner.write_entry_point(&conn, Some(id))?;
            *inner.entry_point.write() = Some(id);
        }
        Ok(())
    }

    fn add_batch(&self, items: &[(NodeId, Vec<f32>)]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let inner = &self.0;
        let mut conn = inner.conn.lock();
        let tx = conn.transaction()?;
        let was_empty = tx
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get::<_, i64>(0))?
            == 0;
        for (id, vector) in items {
            tx.execute(
                "INSERT INTO nodes (id, vector) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET vector = excluded.vector",
                params![id.to_bytes().to_vec(), codec::encode_vector(vector)],
            )?;
            tx.execute("DELETE FROM neighbors WHERE id = ?1", params![id.to_bytes().to_vec()])?;
        }
        if was_empty {
            let first = items[0].0;
            tx.execute(
                "INSERT INTO metadata (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![METADATA_ENTRY_POINT_KEY, first.to_string()],
            )?;
        }
        tx.commit()?;
        if was_empty {
            *inner.entry_point.write() = Some(items[0].0);
        }
        let mut dirty = inner.dirty.write();
        let mut cache = inner.node_cache.write();
        for (id, vector) in items {
            dirty.remove(id);
            cache.insert(
                *id,
                Node {
                    id: *id,
                    vector: vector.clone(),
                    neighbors: BTreeMap::new(),
                },
            );
        }
        Ok(())
    }

    fn set_neighbors(&self, id: NodeId, layer: u8, neighbors: Vec<NodeId>) -> Result<()> {
        let inner = &self.0;
        {
            let cached = inner.node_cache.read().contains_key(&id);
            if !cached {
                let conn = inner.conn.lock();
                let Some(node) = DurableInner::load_node_from_db(&conn, id)? else {
                    return Ok(());
                };
                drop(conn);
                inner.cache_insert(node);
            }
        }
        let mut cache = inner.node_cache.write();
        if let Some(node) = cache.get_mut(&id) {
            if neighbors.is_empty() {
                node.neighbors.remove(&layer);
            } else {
                node.neighbors.insert(layer, neighbors);
            }
            drop(cache);
            inner.dirty.write().insert(id);
        }
        Ok(())
    }

    fn remove(&self, id: NodeId) -> Result<()> {
        let inner = &self.0;
        let conn = inner.conn.lock();
        conn.execute("DELETE FROM nodes WHERE id = ?1", params![id.to_bytes().to_vec()])?;
        conn.execute("DELETE FROM neighbors WHERE id = ?1", params![id.to_bytes().to_vec()])?;
        inner.node_cache.write().remove(&id);
        inner.dirty.write().remove(&id);
        let mut ep = inner.entry_point.write();
        if *ep == Some(id) {
            inner.write_entry_point(&conn, None)?;
            *ep = None;
        }
        Ok(())
    }

    fn remove_batch(&self, ids: &[NodeId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let inner = &self.0;
        let mut conn = inner.conn.lock();
        let tx = conn.transaction()?;
        for id in ids {
            tx.execute("DELETE FROM nodes WHERE id = ?1", params![id.to_bytes().to_vec()])?;
            tx.execute("DELETE FROM neighbors WHERE id = ?1", params![id.to_bytes().to_vec()])?;
        }
        let mut ep = inner.entry_point.write();
        let ep_removed = ep.is_some_and(|e| ids.contains(&e));
        if ep_removed {
            tx.execute(
                "INSERT INTO metadata (key, value) VALUES (?1, '')
                 ON CONFLICT(key) DO UPDATE SET value = ''",
                params![METADATA_ENTRY_POINT_KEY],
            )?;
        }
        tx.commit()?;
        if ep_removed {
            *ep = None;
        }
        drop(ep);
        let mut cache = inner.node_cache.write();
        let mut dirty = inner.dirty.write();
        for id in ids {
            cache.remove(id);
            dirty.remove(id);
        }
        Ok(())
    }

    fn get(&self, id: NodeId) -> Result<Option<Node>> {
        let inner = &self.0;
        if let Some(node) = inner.node_cache.read().get(&id) {
            return Ok(Some(node.clone()));
        }
        let conn = inner.conn.lock();
        let Some(node) = DurableInner::load_node_from_db(&conn, id)? else {
            return Ok(None);
        };
        drop(conn);
        inner.cache_insert(node.clone());
        Ok(Some(node))
    }

    fn get_many(&self, ids: &[NodeId]) -> Result<FxHashMap<NodeId, Node>> {
        let inner = &self.0;
        let mut out = FxHashMap::default();
        let mut missing = Vec::new();
        {
            let cache = inner.node_cache.read();
            for id in ids {
                if let Some(node) = cache.get(id) {
                    out.insert(*id, node.clone());
                } else {
                    missing.push(*id);
                }
            }
        }
        if missing.is_empty() {
            return Ok(out);
        }
        let conn = inner.conn.lock();
        let mut loaded = Vec::new();
        {
            let placeholders = missing.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!("SELECT id, vector FROM nodes WHERE id IN ({placeholders})");
            let mut stmt = conn.prepare(&sql)?;
            let raw_ids: Vec<Vec<u8>> = missing.iter().map(|id| id.to_bytes().to_vec()).collect();
            let rows = stmt.query_map(rusqlite::params_from_iter(raw_ids.iter()), |row| {
                let id_bytes: Vec<u8> = row.get(0)?;
                let vector_bytes: Vec<u8> = row.get(1)?;
                Ok((id_bytes, vector_bytes))
            })?;
            for row in rows {
                let (id_bytes, vector_bytes) = row?;
                let mut raw = [0u8; 16];
                raw.copy_from_slice(&id_bytes);
                let id = NodeId::from_bytes(raw);
                let vector = codec::decode_vector(&vector_bytes)?;
                let neighbors = DurableInner::load_neighbors_from_db(&conn, id)?;
                loaded.push(Node { id, vector, neighbors });
            }
        }
        drop(conn);
        let mut cache = inner.node_cache.write();
        for node in loaded {
            out.insert(node.id, node.clone());
            cache.insert(node.id, node);
        }
        Ok(out)
    }

    fn contains(&self, id: NodeId) -> Result<bool> {
        let inner = &self.0;
        if inner.node_cache.read().contains_key(&id) {
            return Ok(true);
        }
        let conn = inner.conn.lock();
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM nodes WHERE id = ?1",
            params![id.to_bytes().to_vec()],
            |row| row.get(0),
        )?;
        Ok(exists > 0)
    }

    fn list_ids(&self) -> Result<Vec<NodeId>> {
        let conn = self.0.conn.lock();
        let mut stmt = conn.prepare("SELECT id FROM nodes")?;
        let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;
        let mut out = Vec::new();
        for row in rows {
            let bytes = row?;
            let mut raw = [0u8; 16];
            raw.copy_from_slice(&bytes);
            out.push(NodeId::from_bytes(raw));
        }
        Ok(out)
    }

    fn clear(&self) -> Result<()> {
        let inner = &self.0;
        let conn = inner.conn.lock();
        conn.execute_batch("DELETE FROM nodes; DELETE FROM neighbors;")?;
        inner.write_entry_point(&conn, None)?;
        drop(conn);
        inner.node_cache.write().clear();
        inner.dirty.write().clear();
        *inner.entry_point.write() = None;
        Ok(())
    }

    fn entry_point(&self) -> Result<Option<NodeId>> {
        Ok(*self.0.entry_point.read())
    }

    fn set_entry_point(&self, id: Option<NodeId>) -> Result<()> {
        let inner = &self.0;
        let conn = inner.conn.lock();
        inner.write_entry_point(&conn, id)?;
        drop(conn);
        *inner.entry_point.write() = id;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let inner = &self.0;
        let dirty_ids: Vec<NodeId> = inner.dirty.read().iter().copied().collect();
        if dirty_ids.is_empty() {
            return Ok(());
        }
        let cache = inner.node_cache.read();
        let mut conn = inner.conn.lock();
        let tx = conn.transaction()?;
        for id in &dirty_ids {
            let Some(node) = cache.get(id) else { continue };
            if node.neighbors.is_empty() {
                tx.execute("DELETE FROM neighbors WHERE id = ?1", params![id.to_bytes().to_vec()])?;
            } else {
                tx.execute(
                    "INSERT INTO neighbors (id, edges) VALUES (?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET edges = excluded.edges",
                    params![id.to_bytes().to_vec(), codec::encode_neighbors(&node.neighbors)],
                )?;
            }
        }
        tx.commit()?;
        drop(cache);
        inner.dirty.write().clear();
        Ok(())
    }
}

impl LayerStore for DurableLayerStore {
    fn get(&self, id: NodeId) -> Result<u8> {
        let inner = &self.0;
        if let Some(layer) = inner.layer_cache.read().get(&id) {
            return Ok(*layer);
        }
        let conn = inner.conn.lock();
        let layer: Option<i64> = conn
            .query_row(
                "SELECT layer FROM layers WHERE id = ?1",
                params![id.to_bytes().to_vec()],
                |row| row.get(0),
            )
            .optional()?;
        drop(conn);
        let layer = layer.unwrap_or(0) as u8;
        inner.layer_cache.write().insert(id, layer);
        Ok(layer)
    }

    fn set(&self, id: NodeId, layer: u8) -> Result<()> {
        if layer > crate::params::MAX_LAYER {
            return Err(Error::invalid(format!(
                "layer {layer} exceeds max {}",
                crate::params::MAX_LAYER
            )));
        }
        let inner = &self.0;
        let conn = inner.conn.lock();
        conn.execute(
            "INSERT INTO layers (id, layer) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET layer = excluded.layer",
            params![id.to_bytes().to_vec(), i64::from(layer)],
        )?;
        drop(conn);
        inner.layer_cache.write().insert(id, layer);
        Ok(())
    }

    fn remove(&self, id: NodeId) -> Result<()> {
        let inner = &self.0;
        let conn = inner.conn.lock();
        conn.execute("DELETE FROM layers WHERE id = ?1", params![id.to_bytes().to_vec()])?;
        drop(conn);
        inner.layer_cache.write().remove(&id);
        Ok(())
    }

    fn contains(&self, id: NodeId) -> Result<bool> {
        let inner = &self.0;
        if inner.layer_cache.read().contains_key(&id) {
            return Ok(true);
        }
        let conn = inner.conn.lock();
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM layers WHERE id = ?1",
            params![id.to_bytes().to_vec()],
            |row| row.get(0),
        )?;
        Ok(exists > 0)
    }

    fn list_ids(&self) -> Result<Vec<NodeId>> {
        let conn = self.0.conn.lock();
        let mut stmt = conn.prepare("SELECT id FROM layers")?;
        let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;
        let mut out = Vec::new();
        for row in rows {
            let bytes = row?;
            let mut raw = [0u8; 16];
            raw.copy_from_slice(&bytes);
            out.push(NodeId::from_bytes(raw));
        }
        Ok(out)
    }

    fn all_entries(&self) -> Result<Vec<(NodeId, u8)>> {
        let conn = self.0.conn.lock();
        let mut stmt = conn.prepare("SELECT id, layer FROM layers")?;
        let rows = stmt.query_map([], |row| {
            let bytes: Vec<u8> = row.get(0)?;
            let layer: i64 = row.get(1)?;
            Ok((bytes, layer))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (bytes, layer) = row?;
            let mut raw = [0u8; 16];
            raw.copy_from_slice(&bytes);
            out.push((NodeId::from_bytes(raw), layer as u8));
        }
        Ok(out)
    }

    fn clear(&self) -> Result<()> {
        let conn = self.0.conn.lock();
        conn.execute("DELETE FROM layers", [])?;
        drop(conn);
        self.0.layer_cache.write().clear();
        Ok(())
    }
}
