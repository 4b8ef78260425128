//! `export_state` and `import_state` (spec §4.5).

use super::{EngineConfig, HnswEngine};
use crate::cancel::{self, Cancellation};
use crate::error::{Error, Result};
use crate::export::{ExportNode, ExportParameters, ExportState};
use crate::params::validate_dimension;
use crate::vector::{validate_vector, NodeId};
use rustc_hash::FxHashSet;

impl HnswEngine {
    /// Snapshots the index: dimension, parameters, entry point, and
    /// every node with its vector, layer, and neighbor sets (spec §4.5
    /// `export-state`).
    pub fn export_state(&self) -> Result<ExportState> {
        let _lease = self.lease.read();
        self.ensure_not_corrupted()?;
        let config = *self.config.read();

        let ids = self.nodes.list_ids()?;
        let found = self.nodes.get_many(&ids)?;
        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(node) = found.get(&id) else { continue };
            let layer = self.layers.get(id)?;
            nodes.push(ExportNode::from_map(id, node.vector.clone(), layer, &node.neighbors));
        }
        nodes.sort_by_key(|n| n.id);

        Ok(ExportState {
            vector_dimension: config.dimension,
            parameters: ExportParameters::from(config.params),
            entry_point_id: self.nodes.entry_point()?,
            nodes,
        })
    }

    /// Replaces the index contents with `state` (spec §4.5
    /// `import-state`): validates coherence first, then clears storage
    /// and bulk-installs vectors, layers, and neighbor sets directly,
    /// without re-running the insertion algorithm.
    pub fn import_state(&self, state: &ExportState, cancel: &impl Cancellation) -> Result<()> {
        cancel::check(cancel)?;

        let params = state.parameters.to_index_parameters()?;
        params.validate()?;
        validate_dimension(state.vector_dimension)?;

        let mut id_set: FxHashSet<NodeId> = FxHashSet::default();
        for node in &state.nodes {
            validate_vector(&node.vector, state.vector_dimension)?;
            id_set.insert(node.id);
        }
        if let Some(entry) = state.entry_point_id {
            if !id_set.contains(&entry) {
                return Err(Error::invalid("entry point id is not present in the node list"));
            }
        }

        let mut parsed_neighbors = Vec::with_capacity(state.nodes.len());
        for node in &state.nodes {
            let neighbors = node.neighbors_as_map()?;
            for (&layer, ids) in &neighbors {
                if layer > node.layer {
                    return Err(Error::invalid(format!(
                        "node {} has a neighbor set at layer {layer} above its own layer {}",
                        node.id, node.layer
                    )));
                }
                for nid in ids {
                    if !id_set.contains(nid) {
                        return Err(Error::invalid(format!(
                            "node {} references unknown neighbor {nid}",
                            node.id
                        )));
                    }
                }
            }
            parsed_neighbors.push(neighbors);
        }

        let _lease = self.lease.write();
        self.ensure_not_corrupted()?;

        self.nodes.clear()?;
        self.layers.clear()?;

        let batch: Vec<(NodeId, Vec<f32>)> =
            state.nodes.iter().map(|n| (n.id, n.vector.clone())).collect();
        if !batch.is_empty() {
            self.nodes.add_batch(&batch)?;
        }
        for node in &state.nodes {
            self.layers.set(node.id, node.layer)?;
        }
        for (node, neighbors) in state.nodes.iter().zip(parsed_neighbors) {
            for (layer, ids) in neighbors {
                self.nodes.set_neighbors(node.id, layer, ids)?;
            }
        }

        self.nodes.set_entry_point(state.entry_point_id)?;
        *self.config.write() = EngineConfig { dimension: state.vector_dimension, params };
        self.nodes.flush()?;
        Ok(())
    }
}
