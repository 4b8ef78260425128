//! `remove` and `remove_batch` (spec §4.5).

use super::HnswEngine;
use crate::cancel::{self, Cancellation};
use crate::error::{Error, Result};
use crate::search_context::{Lookup, SearchContext};
use crate::vector::{validate_id, NodeId};

impl HnswEngine {
    /// Removes `id`. A no-op, not a failure, if `id` is absent (spec
    /// §4.5 `remove` step 1, §7 "not-found... for remove this is
    /// success").
    pub fn remove(&self, id: NodeId, cancel: &impl Cancellation) -> Result<()> {
        cancel::check(cancel)?;
        validate_id(id)?;

        let _lease = self.lease.write();
        self.ensure_not_corrupted()?;
        self.remove_locked(id)?;
        self.nodes.flush()?;
        Ok(())
    }

    /// Removes every id in `ids` with the write lease held once (spec
    /// §4.5 `remove-batch`).
    pub fn remove_batch(&self, ids: Vec<NodeId>, cancel: &impl Cancellation) -> Result<()> {
        cancel::check(cancel)?;
        if ids.is_empty() {
            return Err(Error::invalid("remove_batch requires at least one id"));
        }
        for id in &ids {
            validate_id(*id)?;
        }

        let _lease = self.lease.write();
        self.ensure_not_corrupted()?;
        for id in ids {
            cancel::check(cancel)?;
            self.remove_locked(id)?;
        }
        self.nodes.flush()?;
        Ok(())
    }

    fn remove_locked(&self, id: NodeId) -> Result<()> {
        let Some(node) = self.nodes.get(id)? else {
            return Ok(());
        };
        let was_entry = self.nodes.entry_point()? == Some(id);

        let mut ctx = SearchContext::new(self.nodes.as_ref());
        for (&layer, neighbors) in &node.neighbors {
            ctx.prefetch(neighbors)?;
            for &n in neighbors {
                if let Lookup::Found(n_node) = ctx.get(n) {
                    let mut n_neighbors = n_node.neighbors_at(layer).to_vec();
                    n_neighbors.retain(|x| *x != id);
                    self.nodes.set_neighbors(n, layer, n_neighbors.clone())?;
                    ctx.update_neighbors(n, layer, n_neighbors);
                }
            }
        }

        self.nodes.remove(id)?;
        self.layers.remove(id)?;

        if was_entry {
            let replacement = self.pick_entry_point_replacement()?;
            self.nodes.set_entry_point(replacement)?;
        }

        Ok(())
    }

    /// Deterministic entry-point replacement after removal: the
    /// remaining id with the maximal layer, ties broken by the smallest
    /// id (spec §4.5, §9 "Open questions... specification above
    /// mandates maximal-layer-then-smallest-id").
    fn pick_entry_point_replacement(&self) -> Result<Option<NodeId>> {
        let ids = self.nodes.list_ids()?;
        let mut best: Option<(u8, NodeId)> = None;
        for id in ids {
            let layer = self.layers.get(id)?;
            best = Some(match best {
                None => (layer, id),
                Some((best_layer, best_id)) => {
                    if layer > best_layer || (layer == best_layer && id < best_id) {
                        (layer, id)
                    } else {
                        (best_layer, best_id)
                    }
                }
            });
        }
        Ok(best.map(|(_, id)| id))
    }
}
