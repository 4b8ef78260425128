//! Node and layer storage interfaces (spec §4.2, §4.3) and their two
//! backings: [`memory`] (pure in-memory) and [`durable`] (single SQLite
//! file).

pub mod durable;
pub mod memory;

use crate::error::Result;
use crate::vector::NodeId;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// A node: its vector and its per-layer neighbor sets (spec §3). A layer
/// entry exists only if non-empty — sparse by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The node's identity.
    pub id: NodeId,
    /// The node's vector, length equal to the index dimension.
    pub vector: Vec<f32>,
    /// Per-layer neighbor sets. Invariant: `id` never appears in its own
    /// sets (spec §8).
    pub neighbors: BTreeMap<u8, Vec<NodeId>>,
}

impl Node {
    /// Neighbors at `layer`, or an empty slice if the layer entry is
    /// absent.
    #[must_use]
    pub fn neighbors_at(&self, layer: u8) -> &[NodeId] {
        self.neighbors.get(&layer).map_or(&[], |v| v.as_slice())
    }
}

/// Keyed node storage (spec §4.2). Implementations must uphold: `add`
/// replaces an existing node with the same id; batch operations are
/// atomic with respect to observers; precondition violations leave
/// storage unchanged.
pub trait NodeStore: Send + Sync {
    /// Current node count.
    fn count(&self) -> usize;

    /// Inserts or replaces a node's vector. Neighbor sets for a freshly
    /// created node start empty. Sets the entry point if it was unset.
    fn add(&self, id: NodeId, vector: Vec<f32>) -> Result<()>;

    /// Atomic multi-insert: readers observe either the pre- or
    /// post-batch state, never a partial mix.
    fn add_batch(&self, items: &[(NodeId, Vec<f32>)]) -> Result<()>;

    /// Replaces the neighbor set of `id` at `layer`. No-op if `id` is
    /// absent.
    fn set_neighbors(&self, id: NodeId, layer: u8, neighbors: Vec<NodeId>) -> Result<()>;

    /// Removes a node. No-op if absent. If it was the entry point, the
    /// entry point is left to the caller (the engine) to recompute and
    /// set explicitly via [`NodeStore::set_entry_point`]; storage itself
    /// only guarantees it does not keep pointing at a deleted node.
    fn remove(&self, id: NodeId) -> Result<()>;

    /// Batch form of [`NodeStore::remove`].
    fn remove_batch(&self, ids: &[NodeId]) -> Result<()>;

    /// Fetches a single node, or `None` if absent.
    fn get(&self, id: NodeId) -> Result<Option<Node>>;

    /// Bulk lookup; the returned map contains only ids that were found.
    fn get_many(&self, ids: &[NodeId]) -> Result<FxHashMap<NodeId, Node>>;

    /// `true` iff `id` is present.
    fn contains(&self, id: NodeId) -> Result<bool>;

    /// All node ids currently stored.
    fn list_ids(&self) -> Result<Vec<NodeId>>;

    /// Removes every node and unsets the entry point.
    fn clear(&self) -> Result<()>;

    /// The current entry point, if the index is non-empty.
    fn entry_point(&self) -> Result<Option<NodeId>>;

    /// Sets the entry point directly. Used by the engine after insertion
    /// (when a new top layer is reached) and after removal (once it has
    /// computed the deterministic replacement).
    fn set_entry_point(&self, id: Option<NodeId>) -> Result<()>;

    /// Durable backings only: synchronously persists write-behind
    /// neighbor edges. A no-op for the in-memory backing.
    fn flush(&self) -> Result<()>;
}

/// Keyed layer-assignment storage (spec §4.3): node id -> integer layer
/// in `[0, 63]`, default `0` when absent.
pub trait LayerStore: Send + Sync {
    /// Layer of `id`, or `0` if absent.
    fn get(&self, id: NodeId) -> Result<u8>;

    /// Sets the layer of `id`. Precondition: `layer <= 63`.
    fn set(&self, id: NodeId, layer: u8) -> Result<()>;

    /// Removes the layer entry for `id`. No-op if absent.
    fn remove(&self, id: NodeId) -> Result<()>;

    /// `true` iff an explicit entry exists for `id`.
    fn contains(&self, id: NodeId) -> Result<bool>;

    /// All ids with an explicit layer entry.
    fn list_ids(&self) -> Result<Vec<NodeId>>;

    /// All `(id, layer)` pairs with an explicit entry.
    fn all_entries(&self) -> Result<Vec<(NodeId, u8)>>;

    /// Removes every entry.
    fn clear(&self) -> Result<()>;
}
