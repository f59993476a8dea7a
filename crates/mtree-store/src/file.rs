//! Single-file JSON record store.
//!
//! The whole table lives in memory and is rewritten to disk after every
//! mutation. The write goes to a sibling `*.tmp` file first and is then
//! renamed over the original, so a crash leaves either the old or the new
//! document, never a torn one.
//!
//! On-disk format:
//! ```json
//! { "next_id": 5, "records": [ { "id": 1, "fields": { "path": "1/", ... } } ] }
//! ```

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mtree_types::NodeId;

use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::scan::Scan;
use crate::table::Table;
use crate::traits::RecordStore;

#[derive(Serialize, Deserialize)]
struct Document {
    next_id: NodeId,
    records: Vec<Record>,
}

impl Document {
    fn into_table(self, location: &Path) -> StoreResult<Table> {
        let mut table = Table {
            next_id: self.next_id,
            ..Table::default()
        };
        for record in self.records {
            let Some(id) = record.id else {
                return Err(StoreError::CorruptRecord {
                    location: location.display().to_string(),
                    reason: "record without id".into(),
                });
            };
            if table.rows.insert(id, record).is_some() {
                return Err(StoreError::CorruptRecord {
                    location: location.display().to_string(),
                    reason: format!("duplicate record id {id}"),
                });
            }
            table.reserve(id).map_err(|e| StoreError::CorruptRecord {
                location: location.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(table)
    }

    fn from_table(table: &Table) -> Self {
        Self {
            next_id: table.next_id,
            records: table.rows.values().cloned().collect(),
        }
    }
}

/// Record store persisted as one JSON document.
pub struct FileRecordStore {
    path: PathBuf,
    table: Mutex<Table>,
    read_only: bool,
}

impl FileRecordStore {
    /// Open (or create) a store at the given path.
    ///
    /// A missing file is treated as an empty store; it is created on the
    /// first write.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::open_inner(path, false)
    }

    /// Open an existing store for reading only. Mutations fail with
    /// [`StoreError::ReadOnly`].
    pub fn open_read_only(path: &Path) -> StoreResult<Self> {
        Self::open_inner(path, true)
    }

    fn open_inner(path: &Path, read_only: bool) -> StoreResult<Self> {
        let table = if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let document: Document =
                serde_json::from_reader(reader).map_err(|e| StoreError::CorruptRecord {
                    location: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            document.into_table(path)?
        } else {
            Table::default()
        };

        info!(
            path = %path.display(),
            records = table.rows.len(),
            read_only,
            "opened record store"
        );

        Ok(Self {
            path: path.to_path_buf(),
            table: Mutex::new(table),
            read_only,
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Table>> {
        self.table
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn flush(&self, table: &Table) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, &Document::from_table(table))?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), records = table.rows.len(), "flushed record store");
        Ok(())
    }

    /// Apply a mutation to a copy of the table, write it, and only then make
    /// it visible.
    fn mutate<T>(&self, f: impl FnOnce(&mut Table) -> StoreResult<T>) -> StoreResult<T> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        let mut table = self.lock()?;
        let mut next = table.clone();
        let out = f(&mut next)?;
        self.flush(&next)?;
        *table = next;
        Ok(out)
    }
}

impl RecordStore for FileRecordStore {
    fn persist(&self, record: Record) -> StoreResult<Record> {
        self.mutate(|table| table.upsert(record))
    }

    fn find(&self, id: NodeId) -> StoreResult<Option<Record>> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    fn scan(&self, scan: &Scan) -> StoreResult<Vec<Record>> {
        Ok(scan.apply(self.lock()?.rows.values()))
    }

    fn delete(&self, id: NodeId) -> StoreResult<bool> {
        if !self.lock()?.rows.contains_key(&id) {
            return Ok(false);
        }
        self.mutate(|table| Ok(table.rows.remove(&id).is_some()))
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.rows.len())
    }
}

impl std::fmt::Debug for FileRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRecordStore")
            .field("path", &self.path)
            .field("read_only", &self.read_only)
            .finish()
    }
}
