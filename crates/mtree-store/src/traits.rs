use mtree_types::NodeId;

use crate::error::StoreResult;
use crate::record::Record;
use crate::scan::Scan;

/// Flat record store backing a materialized-path tree.
///
/// All implementations must satisfy these invariants:
/// - `persist` is create-or-update. A record without an id is inserted and
///   receives a fresh identifier; a record with an id replaces the stored row.
/// - Identifiers are never reused within one store.
/// - `scan` results honour every filter and the requested ordering, with
///   identifier order as the final tie-break.
/// - All I/O errors are propagated, never silently ignored.
pub trait RecordStore: Send + Sync {
    /// Insert or update a record and return it as stored (with its id and
    /// timestamps filled in).
    ///
    /// Persisting a record whose id the store has never seen inserts it under
    /// that id.
    fn persist(&self, record: Record) -> StoreResult<Record>;

    /// Read a record by identifier.
    ///
    /// Returns `Ok(None)` if the record does not exist.
    fn find(&self, id: NodeId) -> StoreResult<Option<Record>>;

    /// Return every record matching the scan, in scan order.
    fn scan(&self, scan: &Scan) -> StoreResult<Vec<Record>>;

    /// Delete a record. Returns `true` if it existed.
    ///
    /// Deleting a node does not touch its descendants.
    fn delete(&self, id: NodeId) -> StoreResult<bool>;

    /// Number of stored records.
    fn len(&self) -> StoreResult<usize>;

    /// Returns `true` if the store holds no records.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns `true` if a record with this identifier exists.
    fn exists(&self, id: NodeId) -> StoreResult<bool> {
        Ok(self.find(id)?.is_some())
    }

    /// Read multiple records in one call.
    ///
    /// Default implementation calls `find()` for each id. Backends may
    /// override for fewer round-trips.
    fn find_batch(&self, ids: &[NodeId]) -> StoreResult<Vec<Option<Record>>> {
        ids.iter().map(|id| self.find(*id)).collect()
    }
}
