//! Purely in-memory node and layer storage.
//!
//! The outer map guards structural changes (insert/remove/iterate); each
//! node additionally carries its own lock so that neighbor-set mutation
//! during graph repair doesn't require taking the outer write lock
//! (spec §5: "Individual nodes have their own reader/writer locks for
//! neighbor mutation").

use super::{LayerStore, Node, NodeStore};
use crate::error::{Error, Result};
use crate::vector::NodeId;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// In-memory [`NodeStore`].
#[derive(Default)]
pub struct MemoryNodeStore {
    nodes: RwLock<FxHashMap<NodeId, RwLock<Node>>>,
    entry_point: RwLock<Option<NodeId>>,
}

impl MemoryNodeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeStore for MemoryNodeStore {
    fn count(&self) -> usize {
        self.nodes.read().len()
    }

    fn add(&self, id: NodeId, vector: Vec<f32>) -> Result<()> {
        let mut nodes = self.nodes.write();
        nodes.insert(
            id,
            RwLock::new(Node {
                id,
                vector,
                neighbors: BTreeMap::new(),
            }),
        );
        drop(nodes);
        let mut ep = self.entry_point.write();
        if ep.is_none() {
            *ep = Some(id);
        }
        Ok(())
    }

    fn add_batch(&self, items: &[(NodeId, Vec<f32>)]) -> Result<()> {
        let mut nodes = self.nodes.write();
        for (id, vector) in items {
            nodes.insert(
                *id,
                RwLock::new(Node {
                    id: *id,
                    vector: vector.clone(),
                    neighbors: BTreeMap::new(),
                }),
            );
        }
        drop(nodes);
        if let Some((first_id, _)) = items.first() {
            let mut ep = self.entry_point.write();
            if ep.is_none() {
                *ep = Some(*first_id);
            }
        }
        Ok(())
    }

    fn set_neighbors(&self, id: NodeId, layer: u8, neighbors: Vec<NodeId>) -> Result<()> {
        let nodes = self.nodes.read();
        if let Some(node) = nodes.get(&id) {
            let mut node = node.write();
            if neighbors.is_empty() {
                node.neighbors.remove(&layer);
            } else {
                node.neighbors.insert(layer, neighbors);
            }
        }
        Ok(())
    }

    fn remove(&self, id: NodeId) -> Result<()> {
        let mut nodes = self.nodes.write();
        nodes.remove(&id);
        drop(nodes);
        let mut ep = self.entry_point.write();
        if *ep == Some(id) {
            *ep = None;
        }
        Ok(())
    }

    fn remove_batch(&self, ids: &[NodeId]) -> Result<()> {
        let mut nodes = self.nodes.write();
        for id in ids {
            nodes.remove(id);
        }
        drop(nodes);
        let mut ep = self.entry_point.write();
        if ep.is_some_and(|e| ids.contains(&e)) {
            *ep = None;
        }
        Ok(())
    }

    fn get(&self, id: NodeId) -> Result<Option<Node>> {
        Ok(self.nodes.read().get(&id).map(|n| n.read().clone()))
    }

    fn get_many(&self, ids: &[NodeId]) -> Result<FxHashMap<NodeId, Node>> {
        let nodes = self.nodes.read();
        let mut out = FxHashMap::default();
        for id in ids {
            if let Some(n) = nodes.get(id) {
                out.insert(*id, n.read().clone());
            }
        }
        Ok(out)
    }

    fn contains(&self, id: NodeId) -> Result<bool> {
        Ok(self.nodes.read().contains_key(&id))
    }

    fn list_ids(&self) -> Result<Vec<NodeId>> {
        Ok(self.nodes.read().keys().copied().collect())
    }

    fn clear(&self) -> Result<()> {
        self.nodes.write().clear();
        *self.entry_point.write() = None;
        Ok(())
    }

    fn entry_point(&self) -> Result<Option<NodeId>> {
        Ok(*self.entry_point.read())
    }

    fn set_entry_point(&self, id: Option<NodeId>) -> Result<()> {
        if let Some(id) = id {
            if !self.nodes.read().contains_key(&id) {
                return Err(Error::invalid("entry point must reference an existing node"));
            }
        }
        *self.entry_point.write() = id;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// In-memory [`LayerStore`].
#[derive(Default)]
pub struct MemoryLayerStore {
    layers: RwLock<FxHashMap<NodeId, u8>>,
}

impl MemoryLayerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayerStore for MemoryLayerStore {
    fn get(&self, id: NodeId) -> Result<u8> {
        Ok(self.layers.read().get(&id).copied().unwrap_or(0))
    }

    fn set(&self, id: NodeId, layer: u8) -> Result<()> {
        if layer > crate::params::MAX_LAYER {
            return Err(Error::invalid(format!(
                "layer {layer} exceeds max {}",
                crate::params::MAX_LAYER
            )));
        }
        self.layers.write().insert(id, layer);
        Ok(())
    }

    fn remove(&self, id: NodeId) -> Result<()> {
        self.layers.write().remove(&id);
        Ok(())
    }

    fn contains(&self, id: NodeId) -> Result<bool> {
        Ok(self.layers.read().contains_key(&id))
    }

    fn list_ids(&self) -> Result<Vec<NodeId>> {
        Ok(self.layers.read().keys().copied().collect())
    }

    fn all_entries(&self) -> Result<Vec<(NodeId, u8)>> {
        Ok(self.layers.read().iter().map(|(&k, &v)| (k, v)).collect())
    }

    fn clear(&self) -> Result<()> {
        self.layers.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sets_entry_point_once() {
        let store = MemoryNodeStore::new();
        store.add(NodeId(1), vec![1.0]).unwrap();
        assert_eq!(store.entry_point().unwrap(), Some(NodeId(1)));
        store.add(NodeId(2), vec![2.0]).unwrap();
        assert_eq!(store.entry_point().unwrap(), Some(NodeId(1)));
    }

    #[test]
    fn add_replaces_existing() {
        let store = MemoryNodeStore::new();
        store.add(NodeId(1), vec![1.0]).unwrap();
        store.add(NodeId(1), vec![9.0]).unwrap();
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(NodeId(1)).unwrap().unwrap().vector, vec![9.0]);
    }

    #[test]
    fn remove_unsets_entry_point() {
        let store = MemoryNodeStore::new();
        store.add(NodeId(1), vec![1.0]).unwrap();
        store.remove(NodeId(1)).unwrap();
        assert_eq!(store.entry_point().unwrap(), None);
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn remove_absent_is_noop() {
        let store = MemoryNodeStore::new();
        store.add(NodeId(1), vec![1.0]).unwrap();
        store.remove(NodeId(2)).unwrap();
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn get_many_returns_only_found() {
        let store = MemoryNodeStore::new();
        store.add(NodeId(1), vec![1.0]).unwrap();
        let found = store.get_many(&[NodeId(1), NodeId(2)]).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key(&NodeId(1)));
    }

    #[test]
    fn layer_default_is_zero() {
        let layers = MemoryLayerStore::new();
        assert_eq!(layers.get(NodeId(1)).unwrap(), 0);
        layers.set(NodeId(1), 5).unwrap();
        assert_eq!(layers.get(NodeId(1)).unwrap(), 5);
    }

    #[test]
    fn layer_rejects_out_of_range() {
        let layers = MemoryLayerStore::new();
        assert!(layers.set(NodeId(1), 64).is_err());
    }
}
