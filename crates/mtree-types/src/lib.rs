//! Foundation types for materialized-path trees.
//!
//! Every other `mtree` crate depends on `mtree-types`.
//!
//! # Key Types
//!
//! - [`NodeId`] — Store-assigned numeric node identifier
//! - [`TreePath`] — Root-first sequence of node identifiers, serialized as
//!   delimiter-terminated segments (`"1/2/3/"`)

pub mod error;
pub mod id;
pub mod path;

pub use error::TypeError;
pub use id::NodeId;
pub use path::{TreePath, PATH_DELIMITER};
