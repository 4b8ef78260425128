//! `top_k` (spec §4.5).

use super::HnswEngine;
use crate::cancel::{self, Cancellation};
use crate::error::{Error, Result};
use crate::params::SearchQuality;
use crate::search_context::{Lookup, SearchContext};
use crate::vector::{validate_vector, NodeId};

/// One `top_k` hit: the node's id, its full vector (copied out of
/// storage), and its distance to the query (spec §4.5 step 6).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: NodeId,
    pub vector: Vec<f32>,
    pub distance: f32,
}

impl HnswEngine {
    /// Finds the `k` nearest neighbors of `query` (spec §4.5 `top-k`).
    /// `ef` defaults to `max(k, efConstruction)` when unset. Returns an
    /// empty list when the index has no entry point.
    pub fn top_k(
        &self,
        query: &[f32],
        k: usize,
        ef: Option<usize>,
        cancel: &impl Cancellation,
    ) -> Result<Vec<SearchResult>> {
        cancel::check(cancel)?;
        let config = *self.config.read();
        validate_vector(query, config.dimension)?;
        if k < 1 {
            return Err(Error::invalid("k must be >= 1"));
        }

        let _lease = self.lease.read();
        self.ensure_not_corrupted()?;

        let Some(entry_id) = self.nodes.entry_point()? else {
            return Ok(Vec::new());
        };
        let top_layer = self.layers.get(entry_id)?;
        let ef = ef.unwrap_or(config.params.ef_construction).max(k);

        let mut ctx = SearchContext::new(self.nodes.as_ref());
        ctx.prefetch(&[entry_id])?;

        let mut current = entry_id;
        for layer in (1..=top_layer).rev() {
            cancel::check(cancel)?;
            current =
                self.greedy_search(&mut ctx, config.params.distance, query, current, layer, cancel)?;
        }

        let results = self.search_layer(&mut ctx, config.params.distance, query, &[current], 0, ef)?;

        let mut out = Vec::with_capacity(k.min(results.len()));
        for scored in results.into_iter().take(k) {
            if let Lookup::Found(node) = ctx.get(scored.id) {
                out.push(SearchResult {
                    id: scored.id,
                    vector: node.vector.clone(),
                    distance: scored.dist,
                });
            }
        }
        Ok(out)
    }

    /// Convenience over [`Self::top_k`] using a [`SearchQuality`] label
    /// instead of a raw `ef` (SPEC_FULL §4, additive sugar).
    pub fn top_k_with_quality(
        &self,
        query: &[f32],
        k: usize,
        quality: SearchQuality,
        cancel: &impl Cancellation,
    ) -> Result<Vec<SearchResult>> {
        self.top_k(query, k, Some(quality.ef_search(k)), cancel)
    }
}
