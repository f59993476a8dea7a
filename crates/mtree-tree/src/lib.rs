//! Materialized-path trees over a flat record store.
//!
//! Each node stores its parent id, its depth, and a path listing every
//! ancestor id followed by its own (`"1/2/3/"`). Attaching a node computes
//! those three fields from a reference node and persists them; relationship
//! queries are derived from the path alone, so descendant and ancestor
//! lookups are prefix and set-membership scans instead of recursive walks.
//!
//! Re-attaching a node does not rewrite the paths of its existing
//! descendants.
//!
//! # Modules
//!
//! - [`config`] — [`TreeConfig`] and the logical-to-column [`FieldMapping`]
//! - [`node`] — [`Node`] and its record encoding
//! - [`tree`] — [`PathTree`]: attachment operations and queries
//! - [`query`] — [`NodeQuery`], a lazy, re-executable scan
//! - [`cache`] — [`ParentCache`], the id-keyed parent lookup cache

pub mod cache;
pub mod config;
pub mod error;
pub mod node;
pub mod query;
pub mod tree;

pub use cache::ParentCache;
pub use config::{FieldMapping, TreeConfig, TreeField};
pub use error::{TreeError, TreeResult};
pub use node::Node;
pub use query::NodeQuery;
pub use tree::PathTree;

pub use mtree_store::{FileRecordStore, InMemoryRecordStore, RecordStore};
pub use mtree_types::{NodeId, TreePath};
