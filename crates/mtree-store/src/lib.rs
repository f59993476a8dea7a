//! Flat record storage for materialized-path trees.
//!
//! The tree layer never talks to a database directly. It produces
//! [`Record`]s (an identifier plus named column values) and [`Scan`]
//! requests (filters plus ordering) and hands them to a [`RecordStore`].
//!
//! # Storage Backends
//!
//! - [`InMemoryRecordStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FileRecordStore`] -- single JSON document on disk, rewritten per write
//!
//! # Design Rules
//!
//! 1. `persist` is create-or-update and assigns identifiers in increasing order.
//! 2. The store never interprets column values beyond what a [`Filter`] asks.
//! 3. Scans without explicit ordering return records in identifier order.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod record;
pub mod scan;
mod table;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileRecordStore;
pub use memory::InMemoryRecordStore;
pub use record::Record;
pub use scan::{Direction, Filter, OrderBy, Scan};
pub use traits::RecordStore;
