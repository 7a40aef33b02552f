//! Vector payload codec.
//!
//! The storage format is a versioned binary layout:
//!
//! ```text
//! [1 byte version][8 bytes LE i64 inserted_at millis][4 bytes LE f32]...
//! ```
//!
//! Earlier deployments stored vectors as a JSON float array. Decoding
//! transparently falls back to that legacy format so old caches keep
//! working, but the legacy format is never written: new puts always
//! produce the binary layout.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::EmbeddingError;

/// Current binary format version.
pub const BINARY_VERSION: u8 = 1;

const HEADER_LEN: usize = 1 + 8;

/// A decoded payload, with provenance of the encoding that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedVector {
    pub values: Vec<f32>,
    /// Write timestamp; `None` for legacy payloads, which carried none.
    pub inserted_at: Option<DateTime<Utc>>,
}

/// Encode a vector into the binary layout.
///
/// Fails only on degenerate input (empty vector); the cache falls back
/// to the textual encoding in that case rather than dropping the entry.
pub fn encode(values: &[f32], inserted_at: DateTime<Utc>) -> Result<Vec<u8>, EmbeddingError> {
    if values.is_empty() {
        return Err(EmbeddingError::InvalidInput(
            "cannot binary-encode an empty vector".to_string(),
        ));
    }
    let mut buf = Vec::with_capacity(HEADER_LEN + values.len() * 4);
    buf.push(BINARY_VERSION);
    buf.extend_from_slice(&inserted_at.timestamp_millis().to_le_bytes());
    for value in values {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    Ok(buf)
}

/// Textual fallback encoding: a bare JSON float array, identical to the
/// legacy on-disk format.
pub fn encode_legacy(values: &[f32]) -> Vec<u8> {
    serde_json::to_vec(values).unwrap_or_default()
}

/// Decode a payload, trying the binary layout first and falling back to
/// the legacy JSON array.
pub fn decode(raw: &[u8]) -> Result<DecodedVector, EmbeddingError> {
    match decode_binary(raw) {
        Ok(decoded) => Ok(decoded),
        Err(binary_err) => decode_legacy(raw).map_err(|_| binary_err),
    }
}

fn decode_binary(raw: &[u8]) -> Result<DecodedVector, EmbeddingError> {
    if raw.len() < HEADER_LEN {
        return Err(EmbeddingError::MalformedPayload(format!(
            "payload too short for binary header: {} bytes",
            raw.len()
        )));
    }
    if raw[0] != BINARY_VERSION {
        return Err(EmbeddingError::MalformedPayload(format!(
            "unknown binary version {}",
            raw[0]
        )));
    }
    let body = &raw[HEADER_LEN..];
    if body.len() % 4 != 0 {
        return Err(EmbeddingError::MalformedPayload(format!(
            "binary body length {} not a multiple of 4",
            body.len()
        )));
    }

    let millis = i64::from_le_bytes(raw[1..9].try_into().expect("header slice is 8 bytes"));
    let inserted_at = Utc.timestamp_millis_opt(millis).single();

    let values = body
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok(DecodedVector {
        values,
        inserted_at,
    })
}

fn decode_legacy(raw: &[u8]) -> Result<DecodedVector, EmbeddingError> {
    let values: Vec<f32> = serde_json::from_slice(raw).map_err(|e| {
        EmbeddingError::MalformedPayload(format!("legacy decode failed: {e}"))
    })?;
    Ok(DecodedVector {
        values,
        inserted_at: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_roundtrip_bit_for_bit() {
        let values = vec![1.0f32, -2.5, 0.0, f32::MIN_POSITIVE, 1e30];
        let now = Utc::now();
        let payload = encode(&values, now).unwrap();
        let decoded = decode(&payload).unwrap();
        // Bit-for-bit equality, not approximate
        for (a, b) in values.iter().zip(decoded.values.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        assert_eq!(
            decoded.inserted_at.unwrap().timestamp_millis(),
            now.timestamp_millis()
        );
    }

    #[test]
    fn test_legacy_json_array_decodes() {
        let raw = b"[0.25,-1.5,3.0]".to_vec();
        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded.values, vec![0.25, -1.5, 3.0]);
        assert!(decoded.inserted_at.is_none());
    }

    #[test]
    fn test_garbage_fails_with_binary_error() {
        let err = decode(b"not a payload").unwrap_err();
        match err {
            EmbeddingError::MalformedPayload(_) => {}
            other => panic!("expected MalformedPayload, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_binary_body_rejected() {
        let mut payload = encode(&[1.0, 2.0], Utc::now()).unwrap();
        payload.pop();
        assert!(matches!(
            decode(&payload),
            Err(EmbeddingError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_empty_vector_refuses_binary() {
        assert!(encode(&[], Utc::now()).is_err());
        // but the legacy fallback representation still roundtrips
        let raw = encode_legacy(&[]);
        assert_eq!(decode(&raw).unwrap().values, Vec::<f32>::new());
    }

    #[test]
    fn test_unknown_version_is_not_silently_read() {
        let mut payload = encode(&[1.0], Utc::now()).unwrap();
        payload[0] = 9;
        assert!(matches!(
            decode(&payload),
            Err(EmbeddingError::MalformedPayload(_))
        ));
    }
}
