//! Cursor-based paging over an item store.

use lexsort_types::{Item, ItemKind, ItemStore, StoreError};

/// Forward-only page cursor: "items with id > last_seen, limit N,
/// ordered by id". Avoids offset scans that degrade as data grows.
pub struct PageCursor<'a, S: ItemStore> {
    store: &'a S,
    kind: ItemKind,
    page_size: usize,
    last_seen: u64,
    exhausted: bool,
}

impl<'a, S: ItemStore> PageCursor<'a, S> {
    pub fn new(store: &'a S, kind: ItemKind, page_size: usize) -> Self {
        Self {
            store,
            kind,
            page_size,
            last_seen: 0,
            exhausted: false,
        }
    }

    /// Fetch the next page; `None` once the collection is exhausted.
    pub fn next_page(&mut self) -> Result<Option<Vec<Item>>, StoreError> {
        if self.exhausted {
            return Ok(None);
        }
        let page = self
            .store
            .page_after(self.kind, self.last_seen, self.page_size)?;
        match page.last() {
            Some(last) => {
                self.last_seen = last.id;
                if page.len() < self.page_size {
                    self.exhausted = true;
                }
                Ok(Some(page))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Restart from the beginning (used for repeated category scans).
    pub fn reset(&mut self) {
        self.last_seen = 0;
        self.exhausted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct VecStore {
        items: Mutex<BTreeMap<u64, Item>>,
    }

    impl VecStore {
        fn with_ids(ids: &[u64]) -> Self {
            let items = ids
                .iter()
                .map(|&id| (id, Item::new(id, format!("item-{id}"))))
                .collect();
            Self {
                items: Mutex::new(items),
            }
        }
    }

    impl ItemStore for VecStore {
        fn page_after(
            &self,
            _kind: ItemKind,
            after_id: u64,
            limit: usize,
        ) -> Result<Vec<Item>, StoreError> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .range(after_id.saturating_add(1)..)
                .take(limit)
                .map(|(_, item)| item.clone())
                .collect())
        }

        fn count(&self, _kind: ItemKind) -> Result<u64, StoreError> {
            Ok(self.items.lock().unwrap().len() as u64)
        }

        fn mark_ready(&self, _kind: ItemKind, ids: &[u64]) -> Result<(), StoreError> {
            let mut items = self.items.lock().unwrap();
            for id in ids {
                if let Some(item) = items.get_mut(id) {
                    item.ready = true;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_pages_cover_collection_in_order() {
        let store = VecStore::with_ids(&[1, 3, 5, 7, 9]);
        let mut cursor = PageCursor::new(&store, ItemKind::Target, 2);

        let mut all = Vec::new();
        while let Some(page) = cursor.next_page().unwrap() {
            assert!(page.len() <= 2);
            all.extend(page.iter().map(|i| i.id));
        }
        assert_eq!(all, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_exhausted_cursor_stays_exhausted() {
        let store = VecStore::with_ids(&[1]);
        let mut cursor = PageCursor::new(&store, ItemKind::Target, 10);
        assert!(cursor.next_page().unwrap().is_some());
        assert!(cursor.next_page().unwrap().is_none());
        assert!(cursor.next_page().unwrap().is_none());
    }

    #[test]
    fn test_reset_restarts_scan() {
        let store = VecStore::with_ids(&[2, 4]);
        let mut cursor = PageCursor::new(&store, ItemKind::Category, 10);
        assert_eq!(cursor.next_page().unwrap().unwrap().len(), 2);
        assert!(cursor.next_page().unwrap().is_none());
        cursor.reset();
        assert_eq!(cursor.next_page().unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_store_yields_no_pages() {
        let store = VecStore::with_ids(&[]);
        let mut cursor = PageCursor::new(&store, ItemKind::Target, 4);
        assert!(cursor.next_page().unwrap().is_none());
    }
}
