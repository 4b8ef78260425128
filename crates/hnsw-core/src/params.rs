//! Index parameters and the search-quality convenience knob (spec §3,
//! supplemented per SPEC_FULL §4).

use crate::distance::Distance;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maximum supported vector dimension (spec §3).
pub const MAX_DIMENSION: usize = 4096;
/// Maximum supported node layer, inclusive (spec §3).
pub const MAX_LAYER: u8 = 63;

/// Tuning parameters for an index (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexParameters {
    /// Target degree above layer 0.
    pub m: usize,
    /// Hard cap above layer 0. Defaults to `m`.
    pub m_max: usize,
    /// Hard cap at layer 0. Defaults to `2 * m`.
    pub m_max0: usize,
    /// Candidate-list size during insertion.
    pub ef_construction: usize,
    /// Level normalization factor. Default `1 / ln(m)`.
    pub m_l: f64,
    /// Whether to extend the candidate set with one-hop neighbors before
    /// selection.
    pub extend_candidates: bool,
    /// Whether to fill remaining neighbor slots from heuristic rejects.
    pub keep_pruned_connections: bool,
    /// Seed for the level-assignment generator.
    pub seed: u64,
    /// Distance metric.
    pub distance: Distance,
}

impl IndexParameters {
    /// Derives reasonable defaults from `m`, matching the teacher's
    /// `auto()` convenience constructor (SPEC_FULL §4). `distance`
    /// defaults to Euclidean; callers needing another metric should set
    /// `.distance` afterward.
    #[must_use]
    pub fn auto(m: usize) -> Self {
        Self {
            m,
            m_max: m,
            m_max0: m * 2,
            ef_construction: 200,
            m_l: 1.0 / (m.max(2) as f64).ln(),
            extend_candidates: false,
            keep_pruned_connections: false,
            seed: 0x5DEE_CE66_D1A4_B5B5,
            distance: Distance::Euclidean,
        }
    }

    /// Validates the constraints from spec §3: `M >= 1`, `Mmax >= M`,
    /// `Mmax0 >= M`, `efConstruction >= 1`, `mL > 0`.
    pub fn validate(&self) -> Result<()> {
        if self.m < 1 {
            return Err(Error::invalid("M must be >= 1"));
        }
        if self.m_max < self.m {
            return Err(Error::invalid("Mmax must be >= M"));
        }
        if self.m_max0 < self.m {
            return Err(Error::invalid("Mmax0 must be >= M"));
        }
        if self.ef_construction < 1 {
            return Err(Error::invalid("efConstruction must be >= 1"));
        }
        if !(self.m_l > 0.0) {
            return Err(Error::invalid("mL must be > 0"));
        }
        Ok(())
    }

    /// Degree cap for `layer`: `Mmax0` at layer 0, else `Mmax`.
    #[must_use]
    pub fn cap_for_layer(&self, layer: u8) -> usize {
        if layer == 0 {
            self.m_max0
        } else {
            self.m_max
        }
    }
}

/// Convenience mapping from a quality label to an `ef_search` value for
/// `top_k` (SPEC_FULL §4; additive sugar over the spec's `ef?` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchQuality {
    /// `ef_search = max(k, 64)`.
    Fast,
    /// `ef_search = max(k, 128)`.
    #[default]
    Balanced,
    /// `ef_search = max(k, 256)`.
    Accurate,
    /// `ef_search = max(k, 512)`.
    HighRecall,
    /// Caller-supplied `ef_search`, still floored at `k`.
    Custom(usize),
}

impl SearchQuality {
    /// Resolves this quality profile to a concrete `ef_search` for a
    /// given `k`.
    #[must_use]
    pub fn ef_search(self, k: usize) -> usize {
        match self {
            Self::Fast => k.max(64),
            Self::Balanced => k.max(128),
            Self::Accurate => k.max(256),
            Self::HighRecall => k.max(512),
            Self::Custom(ef) => k.max(ef),
        }
    }
}

pub(crate) fn validate_dimension(dimension: usize) -> Result<()> {
    if dimension == 0 || dimension > MAX_DIMENSION {
        return Err(Error::invalid(format!(
            "dimension must be in 1..={MAX_DIMENSION}, got {dimension}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_defaults_are_coherent() {
        let p = IndexParameters::auto(16);
        assert!(p.validate().is_ok());
        assert_eq!(p.m_max, 16);
        assert_eq!(p.m_max0, 32);
    }

    #[test]
    fn rejects_bad_m() {
        let mut p = IndexParameters::auto(16);
        p.m = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_small_caps() {
        let mut p = IndexParameters::auto(16);
        p.m_max = 1;
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_dimension_out_of_range() {
        assert!(validate_dimension(0).is_err());
        assert!(validate_dimension(MAX_DIMENSION + 1).is_err());
        assert!(validate_dimension(MAX_DIMENSION).is_ok());
    }

    #[test]
    fn search_quality_floors_at_k() {
        assert_eq!(SearchQuality::Fast.ef_search(100), 100);
        assert_eq!(SearchQuality::Custom(10).ef_search(3), 10);
    }
}
