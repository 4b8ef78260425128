//! The HNSW engine (spec §4.5): public add/remove/search/export/import,
//! and the internal layer-search and neighbor-selection algorithms that
//! back them.
//!
//! Split the way the teacher's own index module is split: construction
//! and shared state here, then one file per operation family.

mod algorithms;
mod io;
mod insert;
mod remove;
mod search;

pub use search::SearchResult;

use crate::error::{Error, Result};
use crate::params::{IndexParameters, MAX_LAYER};
use crate::storage::durable::DurableBacking;
use crate::storage::memory::{MemoryLayerStore, MemoryNodeStore};
use crate::storage::{LayerStore, NodeStore};
use crate::vector::NodeId;
use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

/// A candidate in a distance-ordered heap: distance first, id breaks
/// ties (spec §4.5 "tie-break rule throughout").
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Scored {
    pub dist: f32,
    pub id: NodeId,
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[derive(Debug, Clone, Copy)]
struct EngineConfig {
    dimension: usize,
    params: IndexParameters,
}

/// A single HNSW index: graph construction, search, and persistence
/// over a pluggable [`NodeStore`]/[`LayerStore`] pair.
pub struct HnswEngine {
    nodes: Box<dyn NodeStore>,
    layers: Box<dyn LayerStore>,
    config: RwLock<EngineConfig>,
    lease: RwLock<()>,
    rng: Mutex<u64>,
    corrupted: AtomicBool,
}

impl HnswEngine {
    /// Builds an engine over caller-supplied storage backings. Validates
    /// `dimension` and `params` up front (spec §8 "validation tests").
    pub fn new(
        dimension: usize,
        params: IndexParameters,
        nodes: Box<dyn NodeStore>,
        layers: Box<dyn LayerStore>,
    ) -> Result<Self> {
        crate::params::validate_dimension(dimension)?;
        params.validate()?;
        let seed = if params.seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { params.seed };
        Ok(Self {
            nodes,
            layers,
            config: RwLock::new(EngineConfig { dimension, params }),
            lease: RwLock::new(()),
            rng: Mutex::new(seed),
            corrupted: AtomicBool::new(false),
        })
    }

    /// Builds an engine over purely in-memory storage.
    pub fn in_memory(dimension: usize, params: IndexParameters) -> Result<Self> {
        Self::new(
            dimension,
            params,
            Box::new(MemoryNodeStore::new()),
            Box::new(MemoryLayerStore::new()),
        )
    }

    /// Builds an engine over a single-file durable backing (spec §4.6).
    /// Reopening an existing file preserves its nodes, layers, and entry
    /// point; `dimension`/`params` are supplied fresh each time since the
    /// durable store does not persist them (only `nodes`/`neighbors`/
    /// `layers`/`metadata`, per spec §4.6).
    pub fn open_durable(
        path: impl AsRef<Path>,
        dimension: usize,
        params: IndexParameters,
    ) -> Result<Self> {
        let backing = DurableBacking::open(path)?;
        Self::new(dimension, params, Box::new(backing.nodes), Box::new(backing.layers))
    }

    /// The configured vector dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.config.read().dimension
    }

    /// The current index parameters.
    #[must_use]
    pub fn parameters(&self) -> IndexParameters {
        self.config.read().params
    }

    /// Current node count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.count()
    }

    /// `true` iff the index has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Synchronously persists any write-behind neighbor edges (spec
    /// §4.2 `flush`). A no-op for the in-memory backing.
    pub fn flush(&self) -> Result<()> {
        self.nodes.flush()
    }

    fn ensure_not_corrupted(&self) -> Result<()> {
        if self.corrupted.load(AtomicOrdering::Acquire) {
            return Err(Error::CorruptionPossible(
                "a previous edge install could not be rolled back; refusing further writes"
                    .into(),
            ));
        }
        Ok(())
    }

    fn mark_corrupted(&self, reason: impl Into<String>) -> Error {
        self.corrupted.store(true, AtomicOrdering::Release);
        Error::CorruptionPossible(reason.into())
    }

    /// Samples an insertion level `⌊−ln(U)·mL⌋`, clamped to `[0, 63]`
    /// (spec §4.5 step 3, §9 "implementations must clamp rather than
    /// fail").
    fn sample_level(&self, params: &IndexParameters) -> u8 {
        let u = self.next_uniform();
        let raw = (-u.ln() * params.m_l).floor();
        raw.clamp(0.0, f64::from(MAX_LAYER)) as u8
    }

    /// xorshift64* step seeded from `IndexParameters.seed` (spec §6
    /// "engine-to-host surface: a random source seeded by
    /// IndexParameters.seed").
    fn next_uniform(&self) -> f64 {
        let mut state = self.rng.lock();
        let mut x = *state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        *state = x;
        // Top 53 bits give a uniform f64 mantissa's worth of entropy.
        let mantissa = x >> 11;
        ((mantissa as f64) + 1.0) / ((1u64 << 53) as f64 + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_dimension() {
        assert!(HnswEngine::in_memory(0, IndexParameters::auto(8)).is_err());
        assert!(HnswEngine::in_memory(5000, IndexParameters::auto(8)).is_err());
    }

    #[test]
    fn rejects_bad_params() {
        let mut p = IndexParameters::auto(8);
        p.m = 0;
        assert!(HnswEngine::in_memory(4, p).is_err());
    }

    #[test]
    fn empty_engine_is_empty() {
        let engine = HnswEngine::in_memory(4, IndexParameters::auto(8)).unwrap();
        assert!(engine.is_empty());
        assert_eq!(engine.len(), 0);
    }

    #[test]
    fn sample_level_stays_in_range() {
        let engine = HnswEngine::in_memory(4, IndexParameters::auto(8)).unwrap();
        let params = engine.parameters();
        for _ in 0..1000 {
            let level = engine.sample_level(&params);
            assert!(level <= MAX_LAYER);
        }
    }
}
