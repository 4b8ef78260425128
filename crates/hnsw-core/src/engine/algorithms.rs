//! Internal graph algorithms shared by insert, remove, and search (spec
//! §4.5 "Internal algorithms").

use super::{HnswEngine, Scored};
use crate::cancel::{self, Cancellation};
use crate::distance::Distance;
use crate::error::Result;
use crate::search_context::{Lookup, SearchContext};
use crate::vector::NodeId;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

impl HnswEngine {
    /// Standard HNSW beam search at one layer: expands from `entry_ids`,
    /// keeping the `ef` closest nodes seen (spec §4.5 `search-layer`).
    /// Returns results sorted ascending by distance.
    pub(super) fn search_layer(
        &self,
        ctx: &mut SearchContext<'_>,
        metric: Distance,
        query: &[f32],
        entry_ids: &[NodeId],
        layer: u8,
        ef: usize,
    ) -> Result<Vec<Scored>> {
        ctx.prefetch(entry_ids)?;

        let mut visited: std::collections::HashSet<NodeId> = entry_ids.iter().copied().collect();
        let mut candidates: BinaryHeap<Reverse<Scored>> = BinaryHeap::new();
        let mut results: BinaryHeap<Scored> = BinaryHeap::new();

        for &id in entry_ids {
            if let Lookup::Found(_) = ctx.get(id) {
                let scored = Scored { dist: ctx.distance(metric, query, id), id };
                candidates.push(Reverse(scored));
                results.push(scored);
            }
        }

        while let Some(Reverse(current)) = candidates.pop() {
            if results.len() >= ef {
                if let Some(worst) = results.peek() {
                    if current.dist > worst.dist {
                        break;
                    }
                }
            }

            let neighbor_ids: Vec<NodeId> = match ctx.get(current.id) {
                Lookup::Found(node) => node.neighbors_at(layer).to_vec(),
                _ => Vec::new(),
            };
            let unseen: Vec<NodeId> = neighbor_ids
                .into_iter()
                .filter(|id| !visited.contains(id))
                .collect();
            for &id in &unseen {
                visited.insert(id);
            }
            ctx.prefetch(&unseen)?;

            for id in unseen {
                if let Lookup::Found(_) = ctx.get(id) {
                    let scored = Scored { dist: ctx.distance(metric, query, id), id };
                    let should_push = results.len() < ef
                        || results.peek().is_some_and(|worst| scored < *worst);
                    if should_push {
                        candidates.push(Reverse(scored));
                        results.push(scored);
                        if results.len() > ef {
                            results.pop();
                        }
                    }
                }
            }
        }

        let mut out: Vec<Scored> = results.into_vec();
        out.sort();
        Ok(out)
    }

    /// Single-result hill-climb toward `query` at `layer` (spec §4.5
    /// `greedy-search`): always moves to the strictly closer neighbor,
    /// returns when none is.
    pub(super) fn greedy_search(
        &self,
        ctx: &mut SearchContext<'_>,
        metric: Distance,
        query: &[f32],
        entry_id: NodeId,
        layer: u8,
        cancel: &impl Cancellation,
    ) -> Result<NodeId> {
        cancel::check(cancel)?;
        ctx.prefetch(&[entry_id])?;
        let mut current = entry_id;
        let mut current_dist = ctx.distance(metric, query, current);

        loop {
            let neighbor_ids: Vec<NodeId> = match ctx.get(current) {
                Lookup::Found(node) => node.neighbors_at(layer).to_vec(),
                _ => Vec::new(),
            };
            ctx.prefetch(&neighbor_ids)?;

            let mut best: Option<Scored> = None;
            for id in neighbor_ids {
                if let Lookup::Found(_) = ctx.get(id) {
                    let candidate = Scored { dist: ctx.distance(metric, query, id), id };
                    best = Some(match best {
                        Some(b) if b <= candidate => b,
                        _ => candidate,
                    });
                }
            }

            match best {
                Some(b) if b.dist < current_dist => {
                    current = b.id;
                    current_dist = b.dist;
                }
                _ => return Ok(current),
            }
        }
    }

    /// Malkov §4 neighbor-selection heuristic (spec §4.5
    /// `select-neighbors-heuristic`): keeps candidates that are closer
    /// to `query` than to every already-accepted neighbor, capped at
    /// `m`. Optionally extends the candidate set with one-hop neighbors
    /// first, and optionally backfills from rejects when under `m`.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn select_neighbors_heuristic(
        &self,
        ctx: &mut SearchContext<'_>,
        metric: Distance,
        query: &[f32],
        exclude_id: NodeId,
        mut candidates: Vec<Scored>,
        layer: u8,
        m: usize,
        extend_candidates: bool,
        keep_pruned_connections: bool,
    ) -> Result<Vec<NodeId>> {
        if extend_candidates {
            let seen: std::collections::HashSet<NodeId> =
                candidates.iter().map(|c| c.id).collect();
            let mut extra_ids = Vec::new();
            for c in &candidates {
                if let Lookup::Found(node) = ctx.get(c.id) {
                    for &n in node.neighbors_at(layer) {
                        if n != exclude_id && !seen.contains(&n) && !extra_ids.contains(&n) {
                            extra_ids.push(n);
                        }
                    }
                }
            }
            ctx.prefetch(&extra_ids)?;
            for id in extra_ids {
                if id == exclude_id {
                    continue;
                }
                if let Lookup::Found(_) = ctx.get(id) {
                    candidates.push(Scored { dist: ctx.distance(metric, query, id), id });
                }
            }
        }

        candidates.sort();

        let mut accepted: Vec<(NodeId, Vec<f32>)> = Vec::new();
        let mut rejected: Vec<NodeId> = Vec::new();

        for c in &candidates {
            if c.id == exclude_id {
                continue;
            }
            let vector = match ctx.get(c.id) {
                Lookup::Found(node) => node.vector.clone(),
                _ => continue,
            };
            if accepted.len() >= m {
                rejected.push(c.id);
                continue;
            }
            let is_diverse = accepted
                .iter()
                .all(|(_, avec)| c.dist < metric.eval(avec, &vector));
            if is_diverse {
                accepted.push((c.id, vector));
            } else {
                rejected.push(c.id);
            }
        }

        if keep_pruned_connections {
            for id in rejected {
                if accepted.len() >= m {
                    break;
                }
                accepted.push((id, Vec::new()));
            }
        }

        Ok(accepted.into_iter().map(|(id, _)| id).collect())
    }
}
