//! Fixed little-endian binary codec for vectors, layers, and neighbor
//! maps (spec §6). Used by the durable backing's BLOB columns; avoids a
//! language-native serializer whose wire format could drift across
//! versions (spec §9).

use crate::error::{Error, Result};
use crate::vector::NodeId;
use std::collections::BTreeMap;

/// Encodes a vector record: `i32 dimension` followed by `dimension` LE
/// `f32`s.
#[must_use]
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + vector.len() * 4);
    buf.extend_from_slice(&(vector.len() as i32).to_le_bytes());
    for component in vector {
        buf.extend_from_slice(&component.to_le_bytes());
    }
    buf
}

/// Decodes a vector record produced by [`encode_vector`].
pub fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() < 4 {
        return Err(Error::Io("truncated vector record".into()));
    }
    let dimension = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
    if dimension < 0 {
        return Err(Error::Io("negative dimension in vector record".into()));
    }
    let dimension = dimension as usize;
    let expected_len = 4 + dimension * 4;
    if bytes.len() != expected_len {
        return Err(Error::Io(format!(
            "vector record length mismatch: expected {expected_len}, got {}",
            bytes.len()
        )));
    }
    let mut out = Vec::with_capacity(dimension);
    for chunk in bytes[4..].chunks_exact(4) {
        out.push(f32::from_le_bytes(chunk.try_into().unwrap()));
    }
    Ok(out)
}

/// Encodes a layer record: a single LE `i32` in `[0, 63]`.
#[must_use]
pub fn encode_layer(layer: u8) -> Vec<u8> {
    (i32::from(layer)).to_le_bytes().to_vec()
}

/// Decodes a layer record produced by [`encode_layer`].
pub fn decode_layer(bytes: &[u8]) -> Result<u8> {
    if bytes.len() != 4 {
        return Err(Error::Io("malformed layer record".into()));
    }
    let v = i32::from_le_bytes(bytes.try_into().unwrap());
    if !(0..=i32::from(crate::params::MAX_LAYER)).contains(&v) {
        return Err(Error::Io(format!("layer {v} out of range")));
    }
    Ok(v as u8)
}

/// Encodes a neighbors record: `i32 layer_count`, then for each layer
/// `i32 layer_index`, `i32 neighbor_count`, and `neighbor_count` raw
/// 16-byte node ids.
#[must_use]
pub fn encode_neighbors(neighbors: &BTreeMap<u8, Vec<NodeId>>) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(neighbors.len() as i32).to_le_bytes());
    for (&layer, ids) in neighbors {
        buf.extend_from_slice(&(i32::from(layer)).to_le_bytes());
        buf.extend_from_slice(&(ids.len() as i32).to_le_bytes());
        for id in ids {
            buf.extend_from_slice(&id.to_bytes());
        }
    }
    buf
}

/// Decodes a neighbors record produced by [`encode_neighbors`].
pub fn decode_neighbors(bytes: &[u8]) -> Result<BTreeMap<u8, Vec<NodeId>>> {
    let mut cursor = 0usize;
    let read_i32 = |bytes: &[u8], cursor: &mut usize| -> Result<i32> {
        if *cursor + 4 > bytes.len() {
            return Err(Error::Io("truncated neighbors record".into()));
        }
        let v = i32::from_le_bytes(bytes[*cursor..*cursor + 4].try_into().unwrap());
        *cursor += 4;
        Ok(v)
    };

    let layer_count = read_i32(bytes, &mut cursor)?;
    if layer_count < 0 {
        return Err(Error::Io("negative layer count".into()));
    }
    let mut out = BTreeMap::new();
    for _ in 0..layer_count {
        let layer_index = read_i32(bytes, &mut cursor)?;
        if !(0..=i32::from(crate::params::MAX_LAYER)).contains(&layer_index) {
            return Err(Error::Io(format!("layer index {layer_index} out of range")));
        }
        let neighbor_count = read_i32(bytes, &mut cursor)?;
        if neighbor_count < 0 {
            return Err(Error::Io("negative neighbor count".into()));
        }
        let mut ids = Vec::with_capacity(neighbor_count as usize);
        for _ in 0..neighbor_count {
            if cursor + 16 > bytes.len() {
                return Err(Error::Io("truncated neighbor id".into()));
            }
            let mut raw = [0u8; 16];
            raw.copy_from_slice(&bytes[cursor..cursor + 16]);
            ids.push(NodeId::from_bytes(raw));
            cursor += 16;
        }
        out.insert(layer_index as u8, ids);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::Strategy;

    #[test]
    fn vector_round_trip() {
        let v = vec![1.0_f32, -2.5, 0.0, 3.25];
        let bytes = encode_vector(&v);
        assert_eq!(decode_vector(&bytes).unwrap(), v);
    }

    #[test]
    fn empty_vector_round_trip() {
        let bytes = encode_vector(&[]);
        assert_eq!(decode_vector(&bytes).unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn layer_round_trip() {
        for l in [0u8, 1, 63] {
            assert_eq!(decode_layer(&encode_layer(l)).unwrap(), l);
        }
    }

    #[test]
    fn neighbors_round_trip() {
        let mut map = BTreeMap::new();
        map.insert(0u8, vec![NodeId(1), NodeId(2), NodeId(3)]);
        map.insert(2u8, vec![NodeId(7)]);
        let bytes = encode_neighbors(&map);
        assert_eq!(decode_neighbors(&bytes).unwrap(), map);
    }

    #[test]
    fn empty_neighbors_round_trip() {
        let map: BTreeMap<u8, Vec<NodeId>> = BTreeMap::new();
        let bytes = encode_neighbors(&map);
        assert_eq!(decode_neighbors(&bytes).unwrap(), map);
    }

    #[test]
    fn rejects_truncated_vector() {
        assert!(decode_vector(&[1, 0]).is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_vector_round_trips(v in proptest::collection::vec(-1e6f32..1e6, 0..64)) {
            let bytes = encode_vector(&v);
            let out = decode_vector(&bytes).unwrap();
            proptest::prop_assert_eq!(out, v);
        }

        #[test]
        fn prop_neighbors_round_trips(
            layers in proptest::collection::btree_map(
                0u8..=crate::params::MAX_LAYER,
                proptest::collection::vec((1u128..=u128::MAX).prop_map(NodeId), 0..8),
                0..6,
            )
        ) {
            let bytes = encode_neighbors(&layers);
            let out = decode_neighbors(&bytes).unwrap();
            proptest::prop_assert_eq!(out, layers);
        }
    }
}
