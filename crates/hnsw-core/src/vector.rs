//! Node identifiers and vector validation (spec §3).

use crate::error::{Error, Result};
use std::fmt;

/// An opaque 128-bit identifier, unique per index, never the all-zero
/// value. Stable across the node's lifetime and the only key clients use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeId(pub u128);

impl NodeId {
    /// The reserved all-zero sentinel. Never a valid node id.
    pub const ZERO: Self = Self(0);

    /// Raw 16-byte big-endian encoding, used by the durable backing and
    /// the binary codec (spec §6).
    #[must_use]
    pub fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Inverse of [`NodeId::to_bytes`].
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }

    /// `true` unless this is the reserved zero id.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        u128::from_str_radix(s, 16).map(Self)
    }
}

/// Validates a vector against the index dimension (spec §3, §4.5 step 1).
///
/// Every component must be finite and the length must match `dimension`
/// exactly.
pub fn validate_vector(vector: &[f32], dimension: usize) -> Result<()> {
    if vector.len() != dimension {
        return Err(Error::invalid(format!(
            "dimension mismatch: expected {dimension}, got {}",
            vector.len()
        )));
    }
    if let Some(bad) = vector.iter().position(|v| !v.is_finite()) {
        return Err(Error::invalid(format!(
            "non-finite component at index {bad}"
        )));
    }
    Ok(())
}

/// Validates a node id: must not be the all-zero sentinel.
pub fn validate_id(id: NodeId) -> Result<()> {
    if !id.is_valid() {
        return Err(Error::invalid("node id must not be zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_id_is_invalid() {
        assert!(validate_id(NodeId::ZERO).is_err());
        assert!(validate_id(NodeId(1)).is_ok());
    }

    #[test]
    fn rejects_wrong_dimension() {
        assert!(validate_vector(&[1.0, 2.0], 3).is_err());
        assert!(validate_vector(&[1.0, 2.0, 3.0], 3).is_ok());
    }

    #[test]
    fn rejects_non_finite() {
        assert!(validate_vector(&[1.0, f32::NAN], 2).is_err());
        assert!(validate_vector(&[1.0, f32::INFINITY], 2).is_err());
    }

    #[test]
    fn byte_round_trip() {
        let id = NodeId(0x0123_4567_89ab_cdef_0011_2233_4455_6677);
        assert_eq!(NodeId::from_bytes(id.to_bytes()), id);
    }
}
