//! Row table shared by the bundled backends.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use mtree_types::NodeId;

use crate::error::{StoreError, StoreResult};
use crate::record::Record;

/// Identifier-keyed rows plus the next identifier to hand out.
///
/// Identifiers start at 1 so that no node ever renders as a `0/` segment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Table {
    pub next_id: NodeId,
    pub rows: BTreeMap<NodeId, Record>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            next_id: NodeId::new(1),
            rows: BTreeMap::new(),
        }
    }
}

impl Table {
    /// Insert or replace a row, assigning an id and stamping timestamps.
    ///
    /// Fails without changing the table when the row would take the last
    /// representable id.
    pub fn upsert(&mut self, mut record: Record) -> StoreResult<Record> {
        let now = Utc::now();
        let id = record.id.unwrap_or(self.next_id);
        self.reserve(id)?;

        record.id = Some(id);
        record.created_at = self
            .rows
            .get(&id)
            .and_then(|existing| existing.created_at)
            .or(record.created_at)
            .or(Some(now));
        record.updated_at = Some(now);

        self.rows.insert(id, record.clone());
        Ok(record)
    }

    /// Advance `next_id` past `id`.
    pub fn reserve(&mut self, id: NodeId) -> StoreResult<()> {
        if id >= self.next_id {
            self.next_id = id.checked_next().ok_or(StoreError::IdsExhausted(id))?;
        }
        Ok(())
    }
}
