use std::sync::RwLock;

use mtree_types::NodeId;

use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::scan::Scan;
use crate::table::Table;
use crate::traits::RecordStore;

/// In-memory, `BTreeMap`-based record store.
///
/// Intended for tests and embedding. All rows are held behind a `RwLock`
/// and cloned on read/write. Data is lost when the store is dropped.
pub struct InMemoryRecordStore {
    table: RwLock<Table>,
}

impl InMemoryRecordStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table::default()),
        }
    }

    /// Remove all records. The identifier counter is not reset.
    pub fn clear(&self) -> StoreResult<()> {
        let mut table = self
            .table
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        table.rows.clear();
        Ok(())
    }

    /// Sorted list of all record identifiers.
    pub fn all_ids(&self) -> StoreResult<Vec<NodeId>> {
        let table = self
            .table
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(table.rows.keys().copied().collect())
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn persist(&self, record: Record) -> StoreResult<Record> {
        let mut table = self
            .table
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        table.upsert(record)
    }

    fn find(&self, id: NodeId) -> StoreResult<Option<Record>> {
        let table = self
            .table
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(table.rows.get(&id).cloned())
    }

    fn scan(&self, scan: &Scan) -> StoreResult<Vec<Record>> {
        let table = self
            .table
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(scan.apply(table.rows.values()))
    }

    fn delete(&self, id: NodeId) -> StoreResult<bool> {
        let mut table = self
            .table
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(table.rows.remove(&id).is_some())
    }

    fn len(&self) -> StoreResult<usize> {
        let table = self
            .table
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(table.rows.len())
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{Filter, OrderBy};

    fn node(path: &str, level: u64) -> Record {
        Record::new()
            .with_field("path", path)
            .with_field("level", level)
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn persist_assigns_id_and_timestamps() {
        let store = InMemoryRecordStore::new();
        let saved = store.persist(node("", 0)).unwrap();
        assert_eq!(saved.id, Some(NodeId::new(1)));
        assert!(saved.created_at.is_some());
        assert!(saved.updated_at.is_some());
    }

    #[test]
    fn persist_existing_updates_in_place() {
        let store = InMemoryRecordStore::new();
        let mut saved = store.persist(node("", 0)).unwrap();
        saved.set("path", "1/");
        let updated = store.persist(saved).unwrap();
        assert_eq!(updated.id, Some(NodeId::new(1)));
        assert_eq!(store.len().unwrap(), 1);
        let read = store.find(NodeId::new(1)).unwrap().expect("should exist");
        assert_eq!(read.get_str("path"), Some("1/"));
    }

    #[test]
    fn find_missing_returns_none() {
        let store = InMemoryRecordStore::new();
        assert!(store.find(NodeId::new(99)).unwrap().is_none());
        assert!(!store.exists(NodeId::new(99)).unwrap());
    }

    #[test]
    fn delete_present_and_missing() {
        let store = InMemoryRecordStore::new();
        let saved = store.persist(node("1/", 0)).unwrap();
        let id = saved.id.unwrap();
        assert!(store.delete(id).unwrap());
        assert!(!store.exists(id).unwrap());
        assert!(!store.delete(id).unwrap());
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = InMemoryRecordStore::new();
        let a = store.persist(Record::new()).unwrap().id.unwrap();
        store.delete(a).unwrap();
        let b = store.persist(Record::new()).unwrap().id.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn persisting_last_id_is_an_error() {
        let store = InMemoryRecordStore::new();
        let result = store.persist(Record {
            id: Some(NodeId::new(u64::MAX)),
            ..Record::new()
        });
        assert!(matches!(result, Err(StoreError::IdsExhausted(_))));
        assert!(store.is_empty().unwrap());
        assert_eq!(store.persist(Record::new()).unwrap().id, Some(NodeId::new(1)));
    }

    // -----------------------------------------------------------------------
    // Scans
    // -----------------------------------------------------------------------

    #[test]
    fn scan_filters_and_orders() {
        let store = InMemoryRecordStore::new();
        store.persist(node("1/2/3/", 2)).unwrap();
        store.persist(node("1/", 0)).unwrap();
        store.persist(node("1/2/", 1)).unwrap();
        store.persist(node("4/", 0)).unwrap();

        let scan = Scan::all()
            .filter(Filter::prefix("path", "1/"))
            .order(OrderBy::asc("level"));
        let paths: Vec<_> = store
            .scan(&scan)
            .unwrap()
            .into_iter()
            .map(|r| r.get_str("path").unwrap().to_string())
            .collect();
        assert_eq!(paths, vec!["1/", "1/2/", "1/2/3/"]);
    }

    #[test]
    fn unordered_scan_is_in_id_order() {
        let store = InMemoryRecordStore::new();
        for _ in 0..5 {
            store.persist(Record::new()).unwrap();
        }
        let ids: Vec<_> = store
            .scan(&Scan::all())
            .unwrap()
            .into_iter()
            .map(|r| r.id.unwrap())
            .collect();
        assert_eq!(ids, store.all_ids().unwrap());
    }

    #[test]
    fn find_batch_preserves_order() {
        let store = InMemoryRecordStore::new();
        let a = store.persist(Record::new()).unwrap().id.unwrap();
        let results = store.find_batch(&[NodeId::new(42), a]).unwrap();
        assert!(results[0].is_none());
        assert!(results[1].is_some());
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[test]
    fn len_is_empty_and_clear() {
        let store = InMemoryRecordStore::default();
        assert!(store.is_empty().unwrap());
        store.persist(Record::new()).unwrap();
        store.persist(Record::new()).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryRecordStore::new());
        let id = store.persist(node("1/", 0)).unwrap().id.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let read = store.find(id).unwrap().expect("should exist");
                    assert_eq!(read.get_str("path"), Some("1/"));
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryRecordStore::new();
        store.persist(Record::new()).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryRecordStore"));
        assert!(debug.contains("record_count"));
    }
}
