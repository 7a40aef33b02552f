//! Key encoding and decoding for the storage layer.
//!
//! Key formats:
//! - embeddings: `emb:{model}:{text}`, unique per (text, model) pair
//! - items:      `itm:{kind}:{id:020}`, zero-padded so lexicographic
//!   order equals id order, enabling cursor pages via prefix iteration
//! - models:     `mdl:{owner}`

use lexsort_types::ItemKind;

use crate::error::StorageError;

/// Width of the zero-padded item id (u64::MAX has 20 decimal digits).
const ITEM_ID_WIDTH: usize = 20;

/// Encode an embedding key. The model name is length-prefixed to keep
/// the key unambiguous when model names or texts contain `:`.
pub fn embedding_key(model: &str, text: &str) -> Vec<u8> {
    format!("emb:{}:{}:{}", model.len(), model, text).into_bytes()
}

/// Encode an item key.
pub fn item_key(kind: ItemKind, id: u64) -> Vec<u8> {
    format!("itm:{}:{:0width$}", kind.tag(), id, width = ITEM_ID_WIDTH).into_bytes()
}

/// Prefix shared by all items of a kind.
pub fn item_prefix(kind: ItemKind) -> Vec<u8> {
    format!("itm:{}:", kind.tag()).into_bytes()
}

/// Decode the id portion of an item key.
pub fn parse_item_id(key: &[u8], kind: ItemKind) -> Result<u64, StorageError> {
    let prefix = item_prefix(kind);
    let rest = key
        .strip_prefix(prefix.as_slice())
        .ok_or_else(|| StorageError::Key(format!("item key missing {} prefix", kind)))?;
    std::str::from_utf8(rest)
        .map_err(|e| StorageError::Key(format!("invalid UTF-8 in item key: {e}")))?
        .parse::<u64>()
        .map_err(|e| StorageError::Key(format!("invalid item id: {e}")))
}

/// Encode a model key.
pub fn model_key(owner: &str) -> Vec<u8> {
    format!("mdl:{owner}").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_keys_sort_by_id() {
        let a = item_key(ItemKind::Target, 9);
        let b = item_key(ItemKind::Target, 10);
        let c = item_key(ItemKind::Target, 100);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_item_id_roundtrip() {
        let key = item_key(ItemKind::Category, 42);
        assert_eq!(parse_item_id(&key, ItemKind::Category).unwrap(), 42);
    }

    #[test]
    fn test_item_key_wrong_kind_rejected() {
        let key = item_key(ItemKind::Category, 42);
        assert!(parse_item_id(&key, ItemKind::Target).is_err());
    }

    #[test]
    fn test_embedding_keys_unambiguous() {
        // Same concatenation, different (model, text) splits
        let a = embedding_key("m:x", "t");
        let b = embedding_key("m", "x:t");
        assert_ne!(a, b);
    }

    #[test]
    fn test_max_id_fits_width() {
        let key = item_key(ItemKind::Target, u64::MAX);
        assert_eq!(parse_item_id(&key, ItemKind::Target).unwrap(), u64::MAX);
    }
}
