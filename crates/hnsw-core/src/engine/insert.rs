//! `add` and `add_batch` (spec §4.5).

use super::{HnswEngine, Scored};
use crate::cancel::{self, Cancellation};
use crate::error::{Error, Result};
use crate::params::IndexParameters;
use crate::search_context::{Lookup, SearchContext};
use crate::vector::{validate_id, validate_vector, NodeId};

impl HnswEngine {
    /// Inserts or replaces `id` with `vector` (spec §4.5 `add`).
    pub fn add(&self, id: NodeId, vector: Vec<f32>, cancel: &impl Cancellation) -> Result<()> {
        cancel::check(cancel)?;
        let config = *self.config.read();
        validate_id(id)?;
        validate_vector(&vector, config.dimension)?;

        let _lease = self.lease.write();
        self.ensure_not_corrupted()?;
        cancel::check(cancel)?;

        self.insert_locked(id, vector, &config.params, cancel)
    }

    /// Inserts every entry with the write lease held once (spec §4.5
    /// `add-batch`): same per-node semantics as repeated `add`, honoring
    /// cancellation between items.
    pub fn add_batch(
        &self,
        items: Vec<(NodeId, Vec<f32>)>,
        cancel: &impl Cancellation,
    ) -> Result<()> {
        cancel::check(cancel)?;
        if items.is_empty() {
            return Err(Error::invalid("add_batch requires at least one item"));
        }
        let config = *self.config.read();
        for (id, vector) in &items {
            validate_id(*id)?;
            validate_vector(vector, config.dimension)?;
        }

        let _lease = self.lease.write();
        self.ensure_not_corrupted()?;

        for (id, vector) in items {
            cancel::check(cancel)?;
            self.insert_locked(id, vector, &config.params, cancel)?;
        }
        self.nodes.flush()?;
        Ok(())
    }

    /// Graph-wiring body shared by `add` and `add_batch`. Caller holds
    /// the write lease.
    fn insert_locked(
        &self,
        id: NodeId,
        vector: Vec<f32>,
        params: &IndexParameters,
        cancel: &impl Cancellation,
    ) -> Result<()> {
        let level = self.sample_level(params);
        let was_empty = self.nodes.count() == 0;
        self.nodes.add(id, vector.clone())?;
        self.layers.set(id, level)?;

        if was_empty {
            self.nodes.set_entry_point(Some(id))?;
            self.nodes.flush()?;
            return Ok(());
        }

        let entry_id = match self.nodes.entry_point()? {
            Some(e) if e != id => e,
            _ => {
                self.nodes.flush()?;
                return Ok(());
            }
        };
        let top_layer = self.layers.get(entry_id)?;

        let mut ctx = SearchContext::new(self.nodes.as_ref());
        ctx.prefetch(&[entry_id])?;

        let mut current = entry_id;
        if top_layer > level {
            for layer in ((level + 1)..=top_layer).rev() {
                cancel::check(cancel)?;
                current = self.greedy_search(&mut ctx, params.distance, &vector, current, layer, cancel)?;
            }
        }

        let lower = top_layer.min(level);
        for layer in (0..=lower).rev() {
            cancel::check(cancel)?;
            let candidates =
                self.search_layer(&mut ctx, params.distance, &vector, &[current], layer, params.ef_construction)?;
            if let Some(best) = candidates.first() {
                current = best.id;
            }

            let selected = self.select_neighbors_heuristic(
                &mut ctx,
                params.distance,
                &vector,
                id,
                candidates,
                layer,
                params.m,
                params.extend_candidates,
                params.keep_pruned_connections,
            )?;

            if let Err(err) = self.install_edges(&mut ctx, params, id, layer, &selected) {
                if self.rollback_edges(&mut ctx, id, layer, &selected).is_err() {
                    return Err(self.mark_corrupted(format!(
                        "failed to roll back edges for node {id} at layer {layer}: {err}"
                    )));
                }
                return Err(err);
            }
        }

        if level > top_layer {
            self.nodes.set_entry_point(Some(id))?;
        }

        self.nodes.flush()?;
        Ok(())
    }

    /// Installs `new_id ↔ n` at `layer` for each `n` in `selected`, then
    /// shrinks any neighbor whose degree at `layer` now exceeds its cap
    /// back down via the heuristic, dropping the reverse edge on the
    /// evicted side (spec §4.5 step 7).
    fn install_edges(
        &self,
        ctx: &mut SearchContext<'_>,
        params: &IndexParameters,
        new_id: NodeId,
        layer: u8,
        selected: &[NodeId],
    ) -> Result<()> {
        self.nodes.set_neighbors(new_id, layer, selected.to_vec())?;
        ctx.update_neighbors(new_id, layer, selected.to_vec());

        ctx.prefetch(selected)?;
        for &n in selected {
            let mut n_neighbors = match ctx.get(n) {
                Lookup::Found(node) => node.neighbors_at(layer).to_vec(),
                _ => continue,
            };
            if !n_neighbors.contains(&new_id) {
                n_neighbors.push(new_id);
            }

            let cap = params.cap_for_layer(layer);
            if n_neighbors.len() <= cap {
                self.nodes.set_neighbors(n, layer, n_neighbors.clone())?;
                ctx.update_neighbors(n, layer, n_neighbors);
                continue;
            }

            let n_vector = match ctx.get(n) {
                Lookup::Found(node) => node.vector.clone(),
                _ => continue,
            };
            ctx.prefetch(&n_neighbors)?;
            let mut scored = Vec::with_capacity(n_neighbors.len());
            for &m_id in &n_neighbors {
                if let Lookup::Found(m_node) = ctx.get(m_id) {
                    scored.push(Scored { dist: params.distance.eval(&n_vector, &m_node.vector), id: m_id });
                }
            }
            scored.sort();

            let kept = self.select_neighbors_heuristic(
                ctx,
                params.distance,
                &n_vector,
                n,
                scored,
                layer,
                cap,
                false,
                params.keep_pruned_connections,
            )?;
            let dropped: Vec<NodeId> =
                n_neighbors.iter().copied().filter(|m| !kept.contains(m)).collect();

            self.nodes.set_neighbors(n, layer, kept.clone())?;
            ctx.update_neighbors(n, layer, kept);

            for d in dropped {
                if let Lookup::Found(d_node) = ctx.get(d) {
                    let mut d_neighbors = d_node.neighbors_at(layer).to_vec();
                    d_neighbors.retain(|x| *x != n);
                    self.nodes.set_neighbors(d, layer, d_neighbors.clone())?;
                    ctx.update_neighbors(d, layer, d_neighbors);
                }
            }
        }
        Ok(())
    }

    /// Best-effort symmetric rollback of edges just installed by
    /// [`Self::install_edges`], used when a later step in the same
    /// layer fails (spec §4.5 failure semantics).
    fn rollback_edges(
        &self,
        ctx: &mut SearchContext<'_>,
        new_id: NodeId,
        layer: u8,
        selected: &[NodeId],
    ) -> Result<()> {
        self.nodes.set_neighbors(new_id, layer, Vec::new())?;
        ctx.update_neighbors(new_id, layer, Vec::new());
        ctx.prefetch(selected)?;
        for &n in selected {
            if let Lookup::Found(node) = ctx.get(n) {
                let mut neighbors = node.neighbors_at(layer).to_vec();
                neighbors.retain(|x| *x != new_id);
                self.nodes.set_neighbors(n, layer, neighbors.clone())?;
                ctx.update_neighbors(n, layer, neighbors);
            }
        }
        Ok(())
    }
}
