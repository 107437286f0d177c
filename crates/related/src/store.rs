use folio_refs::RefParser;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Item lists by ref.
///
/// Keys are case-insensitive (see [`RefParser::cache_key`]).
#[derive(Debug)]
pub struct ItemStore<T> {
    parser: Arc<RefParser>,
    entries: RwLock<HashMap<String, Arc<Vec<T>>>>,
}

impl<T> ItemStore<T> {
    pub fn new(parser: Arc<RefParser>) -> Self {
        Self { parser, entries: RwLock::new(HashMap::new()) }
    }

    pub fn get(&self, reference: &str) -> Option<Arc<Vec<T>>> {
        self.read().get(&self.parser.cache_key(reference)).cloned()
    }

    /// Store `items` under `reference`, replacing whatever was there.
    pub fn insert(&self, reference: &str, items: Vec<T>) -> Arc<Vec<T>> {
        let items = Arc::new(items);
        self.write().insert(self.parser.cache_key(reference), Arc::clone(&items));
        items
    }

    /// Store each bucket under its ref, unless that ref already holds at
    /// least as many items.
    ///
    /// A broad fetch can bucket fewer items under a ref than a narrower
    /// fetch of that ref found; the longer list is kept. All buckets are
    /// applied under one lock.
    pub fn merge(&self, buckets: HashMap<String, Vec<T>>) {
        let mut entries = self.write();
        for (reference, items) in buckets {
            let key = self.parser.cache_key(&reference);
            if entries.get(&key).is_some_and(|existing| existing.len() >= items.len()) {
                tracing::trace!(%key, items = items.len(), "Keeping longer cached list");
                continue;
            }
            entries.insert(key, Arc::new(items));
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Vec<T>>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Vec<T>>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_refs::TitleIndex;
    use rstest::rstest;

    fn store() -> ItemStore<u32> {
        ItemStore::new(Arc::new(RefParser::new(TitleIndex::with_titles(["Genesis"]))))
    }

    #[rstest]
    #[case(5, 3, 5)]
    #[case(3, 5, 5)]
    #[case(4, 4, 4)]
    fn test_merge_keeps_longer_list(#[case] cached: u32, #[case] merged: u32, #[case] expected: usize) {
        let store = store();
        store.insert("Genesis 1:1", (0..cached).collect());
        store.merge(HashMap::from([("Genesis 1:1".to_string(), (100..100 + merged).collect())]));
        assert_eq!(store.get("Genesis 1:1").unwrap().len(), expected);
    }

    #[test]
    fn test_equal_length_merge_keeps_cached_items() {
        let store = store();
        store.insert("Genesis 1:1", vec![1, 2]);
        store.merge(HashMap::from([("Genesis 1:1".to_string(), vec![3, 4])]));
        assert_eq!(*store.get("Genesis 1:1").unwrap(), [1, 2]);
    }

    #[test]
    fn test_keys_ignore_case() {
        let store = store();
        store.merge(HashMap::from([("Genesis 1:2".to_string(), vec![7])]));
        assert_eq!(*store.get("genesis.1.2").unwrap(), [7]);
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }
}
