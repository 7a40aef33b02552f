//! RocksDB wrapper for lexsort storage.
//!
//! Provides:
//! - Database open with column family setup
//! - Embedding payload get / multi-get / idempotent put
//! - Cursor pages over items ordered by id
//! - Batched ready-flag updates
//! - Model upsert-by-owner

use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use tracing::{debug, info};

use lexsort_types::{
    EmbeddingStore, Item, ItemKind, ItemStore, ModelStore, PersistedModel, StoreError,
};

use crate::column_families::{build_cf_descriptors, CF_EMBEDDINGS, CF_ITEMS, CF_MODELS};
use crate::error::StorageError;
use crate::keys::{embedding_key, item_key, item_prefix, model_key, parse_item_id};

/// Maximum ids updated per ready-flag write batch.
pub const READY_BATCH_SIZE: usize = 500;

/// Main storage interface for lexsort.
///
/// One database per project; concurrent jobs on different projects use
/// separate databases and processes.
pub struct Database {
    db: DB,
}

impl Database {
    /// Open storage at the given path, creating if necessary.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    // ── Embedding payloads ──────────────────────────────────────────

    /// Read one embedding payload.
    pub fn get_embedding(
        &self,
        model: &str,
        text: &str,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        let cf = self.cf(CF_EMBEDDINGS)?;
        Ok(self.db.get_cf(&cf, embedding_key(model, text))?)
    }

    /// Read many embedding payloads; output aligned with `texts`.
    pub fn multi_get_embeddings(
        &self,
        model: &str,
        texts: &[&str],
    ) -> Result<Vec<Option<Vec<u8>>>, StorageError> {
        let cf = self.cf(CF_EMBEDDINGS)?;
        let keys: Vec<(_, Vec<u8>)> = texts
            .iter()
            .map(|text| (cf, embedding_key(model, text)))
            .collect();
        let mut results = Vec::with_capacity(texts.len());
        for result in self.db.multi_get_cf(keys) {
            results.push(result?);
        }
        Ok(results)
    }

    /// Overwrite one embedding payload. Idempotent: re-putting the same
    /// bytes leaves the entry unchanged.
    pub fn put_embedding(
        &self,
        model: &str,
        text: &str,
        payload: &[u8],
    ) -> Result<(), StorageError> {
        let cf = self.cf(CF_EMBEDDINGS)?;
        self.db.put_cf(&cf, embedding_key(model, text), payload)?;
        Ok(())
    }

    // ── Items ───────────────────────────────────────────────────────

    /// Insert or replace items in one write batch.
    pub fn put_items(&self, kind: ItemKind, items: &[Item]) -> Result<(), StorageError> {
        let cf = self.cf(CF_ITEMS)?;
        let mut batch = WriteBatch::default();
        for item in items {
            let bytes = serde_json::to_vec(item)?;
            batch.put_cf(&cf, item_key(kind, item.id), bytes);
        }
        self.db.write(batch)?;
        debug!(count = items.len(), kind = %kind, "stored items");
        Ok(())
    }

    /// Read one item.
    pub fn get_item(&self, kind: ItemKind, id: u64) -> Result<Option<Item>, StorageError> {
        let cf = self.cf(CF_ITEMS)?;
        match self.db.get_cf(&cf, item_key(kind, id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Items with `id > after_id`, ordered by id, at most `limit`.
    pub fn items_after(
        &self,
        kind: ItemKind,
        after_id: u64,
        limit: usize,
    ) -> Result<Vec<Item>, StorageError> {
        let Some(start_id) = after_id.checked_add(1) else {
            return Ok(Vec::new());
        };
        let cf = self.cf(CF_ITEMS)?;
        let prefix = item_prefix(kind);
        let start = item_key(kind, start_id);

        let mut items = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&start, Direction::Forward));
        for result in iter {
            let (key, value) = result?;
            if !key.starts_with(&prefix) {
                break;
            }
            // Key parse guards against records written under a bad key
            parse_item_id(&key, kind)?;
            items.push(serde_json::from_slice(&value)?);
            if items.len() >= limit {
                break;
            }
        }
        Ok(items)
    }

    /// Count items of a kind.
    pub fn count_items(&self, kind: ItemKind) -> Result<u64, StorageError> {
        let cf = self.cf(CF_ITEMS)?;
        let prefix = item_prefix(kind);
        let mut count = 0u64;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));
        for result in iter {
            let (key, _) = result?;
            if !key.starts_with(&prefix) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    /// Set the ready flag on items, at most [`READY_BATCH_SIZE`] ids per
    /// write batch. Unknown ids are skipped.
    pub fn mark_items_ready(&self, kind: ItemKind, ids: &[u64]) -> Result<(), StorageError> {
        let cf = self.cf(CF_ITEMS)?;
        for chunk in ids.chunks(READY_BATCH_SIZE) {
            let mut batch = WriteBatch::default();
            for &id in chunk {
                let Some(mut item) = self.get_item(kind, id)? else {
                    continue;
                };
                if item.ready {
                    continue;
                }
                item.ready = true;
                batch.put_cf(&cf, item_key(kind, id), serde_json::to_vec(&item)?);
            }
            self.db.write(batch)?;
        }
        debug!(count = ids.len(), kind = %kind, "marked items ready");
        Ok(())
    }

    // ── Models ──────────────────────────────────────────────────────

    /// Fetch the persisted model for an owner.
    pub fn get_persisted_model(
        &self,
        owner: &str,
    ) -> Result<Option<PersistedModel>, StorageError> {
        let cf = self.cf(CF_MODELS)?;
        match self.db.get_cf(&cf, model_key(owner))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Overwrite the owner's persisted model.
    pub fn put_persisted_model(
        &self,
        owner: &str,
        model: &PersistedModel,
    ) -> Result<(), StorageError> {
        let cf = self.cf(CF_MODELS)?;
        self.db
            .put_cf(&cf, model_key(owner), serde_json::to_vec(model)?)?;
        info!(owner, model = %model.model_name, "persisted classifier model");
        Ok(())
    }
}

impl EmbeddingStore for Database {
    fn get_payload(&self, model: &str, text: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get_embedding(model, text)?)
    }

    fn multi_get_payload(
        &self,
        model: &str,
        texts: &[&str],
    ) -> Result<Vec<Option<Vec<u8>>>, StoreError> {
        Ok(self.multi_get_embeddings(model, texts)?)
    }

    fn put_payload(&self, model: &str, text: &str, payload: &[u8]) -> Result<(), StoreError> {
        Ok(self.put_embedding(model, text, payload)?)
    }
}

impl ItemStore for Database {
    fn page_after(
        &self,
        kind: ItemKind,
        after_id: u64,
        limit: usize,
    ) -> Result<Vec<Item>, StoreError> {
        Ok(self.items_after(kind, after_id, limit)?)
    }

    fn count(&self, kind: ItemKind) -> Result<u64, StoreError> {
        Ok(self.count_items(kind)?)
    }

    fn mark_ready(&self, kind: ItemKind, ids: &[u64]) -> Result<(), StoreError> {
        Ok(self.mark_items_ready(kind, ids)?)
    }
}

impl ModelStore for Database {
    fn get_model(&self, owner: &str) -> Result<Option<PersistedModel>, StoreError> {
        Ok(self.get_persisted_model(owner)?)
    }

    fn put_model(&self, owner: &str, model: &PersistedModel) -> Result<(), StoreError> {
        Ok(self.put_persisted_model(owner, model)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path()).unwrap();
        (dir, db)
    }

    #[test]
    fn test_embedding_roundtrip() {
        let (_dir, db) = open_db();
        db.put_embedding("m1", "hello", b"payload").unwrap();
        assert_eq!(
            db.get_embedding("m1", "hello").unwrap().as_deref(),
            Some(b"payload".as_slice())
        );
        // Different model is a different key
        assert!(db.get_embedding("m2", "hello").unwrap().is_none());
    }

    #[test]
    fn test_embedding_put_is_idempotent_overwrite() {
        let (_dir, db) = open_db();
        db.put_embedding("m", "t", b"one").unwrap();
        db.put_embedding("m", "t", b"one").unwrap();
        db.put_embedding("m", "t", b"two").unwrap();
        assert_eq!(
            db.get_embedding("m", "t").unwrap().as_deref(),
            Some(b"two".as_slice())
        );
    }

    #[test]
    fn test_multi_get_alignment() {
        let (_dir, db) = open_db();
        db.put_embedding("m", "a", b"va").unwrap();
        db.put_embedding("m", "c", b"vc").unwrap();
        let results = db.multi_get_embeddings("m", &["a", "b", "c"]).unwrap();
        assert_eq!(results[0].as_deref(), Some(b"va".as_slice()));
        assert!(results[1].is_none());
        assert_eq!(results[2].as_deref(), Some(b"vc".as_slice()));
    }

    #[test]
    fn test_items_paged_in_id_order() {
        let (_dir, db) = open_db();
        let items: Vec<Item> = [5u64, 2, 9, 7].iter().map(|&id| Item::new(id, format!("item-{id}"))).collect();
        db.put_items(ItemKind::Target, &items).unwrap();

        let page = db.items_after(ItemKind::Target, 0, 3).unwrap();
        let ids: Vec<u64> = page.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 5, 7]);

        let next = db.items_after(ItemKind::Target, 7, 3).unwrap();
        let ids: Vec<u64> = next.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![9]);

        assert!(db.items_after(ItemKind::Target, 9, 3).unwrap().is_empty());
    }

    #[test]
    fn test_kinds_do_not_mix() {
        let (_dir, db) = open_db();
        db.put_items(ItemKind::Target, &[Item::new(1, "t")]).unwrap();
        db.put_items(ItemKind::Category, &[Item::new(1, "c")]).unwrap();
        assert_eq!(db.count_items(ItemKind::Target).unwrap(), 1);
        let page = db.items_after(ItemKind::Category, 0, 10).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].text, "c");
    }

    #[test]
    fn test_mark_ready_batches_and_skips_unknown() {
        let (_dir, db) = open_db();
        let items: Vec<Item> = (1..=1200u64).map(|id| Item::new(id, format!("i{id}"))).collect();
        db.put_items(ItemKind::Category, &items).unwrap();

        // More ids than one batch, plus an unknown id
        let mut ids: Vec<u64> = (1..=1100).collect();
        ids.push(99_999);
        db.mark_items_ready(ItemKind::Category, &ids).unwrap();

        assert!(db.get_item(ItemKind::Category, 1).unwrap().unwrap().ready);
        assert!(db.get_item(ItemKind::Category, 1100).unwrap().unwrap().ready);
        assert!(!db.get_item(ItemKind::Category, 1101).unwrap().unwrap().ready);
    }

    #[test]
    fn test_model_upsert_by_owner() {
        let (_dir, db) = open_db();
        let first = PersistedModel {
            model_name: "classifier".to_string(),
            vector_model_tag: "v1".to_string(),
            payload: "{}".to_string(),
        };
        db.put_persisted_model("project-1", &first).unwrap();

        let second = PersistedModel {
            model_name: "classifier".to_string(),
            vector_model_tag: "v2".to_string(),
            payload: "{\"labels\":[]}".to_string(),
        };
        db.put_persisted_model("project-1", &second).unwrap();

        let loaded = db.get_persisted_model("project-1").unwrap().unwrap();
        assert_eq!(loaded.vector_model_tag, "v2");
        assert!(db.get_persisted_model("project-2").unwrap().is_none());
    }
}
