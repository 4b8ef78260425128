//! Per-operation search context (spec §4.4).
//!
//! Constructed fresh for every public engine operation and dropped
//! before that operation returns — it never outlives its operation and
//! is never shared across threads. It is the primary performance lever:
//! graph traversal enumerates many neighbor edges but hits storage at
//! most once per unique id per operation.

use crate::distance::Distance;
use crate::storage::{Node, NodeStore};
use crate::vector::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};

/// A short-lived node prefetch cache scoped to one engine operation.
pub struct SearchContext<'a> {
    store: &'a dyn NodeStore,
    cache: FxHashMap<NodeId, Node>,
    absent: FxHashSet<NodeId>,
}

/// Lookup outcome for [`SearchContext::get`].
pub enum Lookup<'a> {
    /// The node is cached.
    Found(&'a Node),
    /// Storage confirmed this id does not exist.
    Absent,
    /// Neither cached nor known-absent; call [`SearchContext::prefetch`] first.
    Miss,
}

impl<'a> SearchContext<'a> {
    /// Creates an empty context bound to `store` for the duration of one
    /// operation.
    #[must_use]
    pub fn new(store: &'a dyn NodeStore) -> Self {
        Self {
            store,
            cache: FxHashMap::default(),
            absent: FxHashSet::default(),
        }
    }

    /// Bulk-loads any of `ids` not already cached or known-absent, via a
    /// single `get_many` call. Never re-fetches an id already resolved.
    pub fn prefetch(&mut self, ids: &[NodeId]) -> crate::error::Result<()> {
        let to_fetch: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| !self.cache.contains_key(id) && !self.absent.contains(id))
            .collect();
        if to_fetch.is_empty() {
            return Ok(());
        }
        let found = self.store.get_many(&to_fetch)?;
        for id in &to_fetch {
            match found.get(id) {
                Some(node) => {
                    self.cache.insert(*id, node.clone());
                }
                None => {
                    self.absent.insert(*id);
                }
            }
        }
        Ok(())
    }

    /// Resolves `id` against the cache without touching storage. Returns
    /// [`Lookup::Miss`] when a prefetch is still needed.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Lookup<'_> {
        if let Some(node) = self.cache.get(&id) {
            Lookup::Found(node)
        } else if self.absent.contains(&id) {
            Lookup::Absent
        } else {
            Lookup::Miss
        }
    }

    /// Convenience: prefetches `id` if necessary, then returns the node
    /// or `None` if it does not exist.
    pub fn get_or_fetch(&mut self, id: NodeId) -> crate::error::Result<Option<&Node>> {
        if matches!(self.get(id), Lookup::Miss) {
            self.prefetch(&[id])?;
        }
        Ok(self.cache.get(&id))
    }

    /// Updates the cached neighbor set for `id` at `layer`, if `id` is
    /// cached. Used after a neighbor-set mutation lands in storage so
    /// the rest of the same operation sees the fresh edges without a
    /// redundant round-trip (spec §4.4 "prefetch... never re-fetches").
    pub fn update_neighbors(&mut self, id: NodeId, layer: u8, neighbors: Vec<NodeId>) {
        if let Some(node) = self.cache.get_mut(&id) {
            if neighbors.is_empty() {
                node.neighbors.remove(&layer);
            } else {
                node.neighbors.insert(layer, neighbors);
            }
        }
    }

    /// Distance from `query` to the (already-cached) node `id`, under
    /// `metric`. Panics if `id` was never prefetched — callers always
    /// prefetch before computing distances in the traversal loops.
    #[must_use]
    pub fn distance(&self, metric: Distance, query: &[f32], id: NodeId) -> f32 {
        let node = self
            .cache
            .get(&id)
            .expect("distance() requires a prefetched node");
        metric.eval(query, &node.vector)
    }
}
