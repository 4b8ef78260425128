//! Distance kernels (spec §4.1).
//!
//! Each kernel is a pure function over two equal-length float slices,
//! `f(u, v) >= 0`, smaller meaning closer. Callers must validate
//! finiteness before reaching these; the kernels themselves never
//! allocate.

use serde::{Deserialize, Serialize};

/// Selectable distance metric. The `name()` string is the serialization
/// identity used by the durable backing and by export/import payloads
/// (spec §4.1, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    /// L2 / Euclidean distance.
    Euclidean,
    /// `1 - cosine_similarity`. Zero-norm vectors map to the maximum
    /// distance, 1.0, rather than failing (spec §4.1, §9).
    Cosine,
    /// Negated dot product, so smaller is still closer.
    DotProduct,
}

impl Distance {
    /// Computes the distance between `u` and `v`.
    ///
    /// # Panics
    ///
    /// Debug builds assert equal lengths; callers are responsible for
    /// validating this ahead of time (the kernel contract never
    /// allocates or re-validates).
    #[must_use]
    pub fn eval(self, u: &[f32], v: &[f32]) -> f32 {
        debug_assert_eq!(u.len(), v.len(), "distance kernel requires equal-length vectors");
        match self {
            Self::Euclidean => euclidean(u, v),
            Self::Cosine => cosine(u, v),
            Self::DotProduct => -dot(u, v),
        }
    }

    /// Stable name used in serialization (spec §4.1).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Cosine => "cosine",
            Self::DotProduct => "dotproduct",
        }
    }

    /// Parses the stable name back into a metric.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "euclidean" => Some(Self::Euclidean),
            "cosine" => Some(Self::Cosine),
            "dotproduct" => Some(Self::DotProduct),
            _ => None,
        }
    }
}

fn dot(u: &[f32], v: &[f32]) -> f32 {
    u.iter().zip(v).map(|(a, b)| a * b).sum()
}

fn euclidean(u: &[f32], v: &[f32]) -> f32 {
    u.iter()
        .zip(v)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f32>()
        .sqrt()
}

fn cosine(u: &[f32], v: &[f32]) -> f32 {
    let norm_u = dot(u, u).sqrt();
    let norm_v = dot(v, v).sqrt();
    if norm_u == 0.0 || norm_v == 0.0 {
        return 1.0;
    }
    1.0 - dot(u, v) / (norm_u * norm_v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_self_is_zero() {
        let v = [1.0, 2.0, 3.0];
        assert!((Distance::Euclidean.eval(&v, &v)).abs() < 1e-6);
    }

    #[test]
    fn euclidean_known_value() {
        let d = Distance::Euclidean.eval(&[0.0, 0.0], &[3.0, 4.0]);
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_is_one() {
        let d = Distance::Cosine.eval(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_parallel_is_zero() {
        let d = Distance::Cosine.eval(&[2.0, 0.0], &[4.0, 0.0]);
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn cosine_zero_norm_is_sentinel_max() {
        assert_eq!(Distance::Cosine.eval(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(Distance::Cosine.eval(&[0.0, 0.0], &[0.0, 0.0]), 1.0);
    }

    #[test]
    fn dot_product_is_negated() {
        let d = Distance::DotProduct.eval(&[1.0, 2.0], &[3.0, 4.0]);
        assert!((d + 11.0).abs() < 1e-6);
    }

    #[test]
    fn names_round_trip() {
        for d in [Distance::Euclidean, Distance::Cosine, Distance::DotProduct] {
            assert_eq!(Distance::from_name(d.name()), Some(d));
        }
        assert_eq!(Distance::from_name("nope"), None);
    }
}
