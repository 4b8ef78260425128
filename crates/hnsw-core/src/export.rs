//! Snapshot payload for `export_state`/`import_state` (spec §4.5, §6).
//!
//! Field names and nesting mirror the language-neutral contract in spec
//! §6 exactly (`vectorDimension`, `entryPointId`, `extendCandidates`,
//! ...) so the payload can cross a JSON boundary (e.g. the HTTP
//! collaborator) without translation.

use crate::distance::Distance;
use crate::error::{Error, Result};
use crate::params::IndexParameters;
use crate::vector::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters as they appear inside an export payload: identical fields
/// to [`IndexParameters`] but with `distance` carried as its stable
/// name rather than the enum, per spec §6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportParameters {
    pub m: usize,
    pub m_max: usize,
    pub m_max0: usize,
    pub ef_construction: usize,
    pub m_l: f64,
    pub extend_candidates: bool,
    pub keep_pruned_connections: bool,
    pub seed: u64,
    pub distance: String,
}

impl From<IndexParameters> for ExportParameters {
    fn from(p: IndexParameters) -> Self {
        Self {
            m: p.m,
            m_max: p.m_max,
            m_max0: p.m_max0,
            ef_construction: p.ef_construction,
            m_l: p.m_l,
            extend_candidates: p.extend_candidates,
            keep_pruned_connections: p.keep_pruned_connections,
            seed: p.seed,
            distance: p.distance.name().to_string(),
        }
    }
}

impl ExportParameters {
    /// Recovers an [`IndexParameters`], rejecting an unrecognized
    /// distance name.
    pub fn to_index_parameters(&self) -> Result<IndexParameters> {
        let distance = Distance::from_name(&self.distance)
            .ok_or_else(|| Error::invalid(format!("unknown distance name: {}", self.distance)))?;
        Ok(IndexParameters {
            m: self.m,
            m_max: self.m_max,
            m_max0: self.m_max0,
            ef_construction: self.ef_construction,
            m_l: self.m_l,
            extend_candidates: self.extend_candidates,
            keep_pruned_connections: self.keep_pruned_connections,
            seed: self.seed,
            distance,
        })
    }
}

/// One exported node: its vector, its level, and its neighbor sets keyed
/// by layer as a decimal string (spec §6: "map of layer-string → array
/// of ids").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportNode {
    pub id: NodeId,
    pub vector: Vec<f32>,
    pub layer: u8,
    pub neighbors: BTreeMap<String, Vec<NodeId>>,
}

impl ExportNode {
    pub(crate) fn neighbors_as_map(&self) -> Result<BTreeMap<u8, Vec<NodeId>>> {
        let mut out = BTreeMap::new();
        for (k, v) in &self.neighbors {
            let layer: u8 = k
                .parse()
                .map_err(|_| Error::invalid(format!("neighbor layer key is not an integer: {k}")))?;
            out.insert(layer, v.clone());
        }
        Ok(out)
    }

    pub(crate) fn from_map(
        id: NodeId,
        vector: Vec<f32>,
        layer: u8,
        neighbors: &BTreeMap<u8, Vec<NodeId>>,
    ) -> Self {
        Self {
            id,
            vector,
            layer,
            neighbors: neighbors
                .iter()
                .map(|(&l, ids)| (l.to_string(), ids.clone()))
                .collect(),
        }
    }
}

/// A full index snapshot (spec §4.5 `export-state`/`import-state`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportState {
    pub vector_dimension: usize,
    pub parameters: ExportParameters,
    pub entry_point_id: Option<NodeId>,
    pub nodes: Vec<ExportNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_round_trip_through_stable_name() {
        let p = IndexParameters::auto(16);
        let exported = ExportParameters::from(p);
        let recovered = exported.to_index_parameters().unwrap();
        assert_eq!(recovered, p);
    }

    #[test]
    fn unknown_distance_name_is_rejected() {
        let mut exported = ExportParameters::from(IndexParameters::auto(16));
        exported.distance = "manhattan".into();
        assert!(exported.to_index_parameters().is_err());
    }

    #[test]
    fn neighbor_keys_round_trip() {
        let mut map = BTreeMap::new();
        map.insert(0u8, vec![NodeId(1), NodeId(2)]);
        map.insert(3u8, vec![NodeId(9)]);
        let node = ExportNode::from_map(NodeId(42), vec![1.0, 2.0], 3, &map);
        assert_eq!(node.neighbors_as_map().unwrap(), map);
    }

    #[test]
    fn malformed_layer_key_is_rejected() {
        let mut neighbors = BTreeMap::new();
        neighbors.insert("not-a-number".to_string(), vec![NodeId(1)]);
        let node = ExportNode {
            id: NodeId(1),
            vector: vec![0.0],
            layer: 0,
            neighbors,
        };
        assert!(node.neighbors_as_map().is_err());
    }
}
