//! Error types for tree maintenance and queries.

use mtree_store::StoreError;
use mtree_types::{NodeId, TypeError};

/// Errors that can occur during tree operations.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// A node's path is missing, unparsable, or does not end in its own id.
    #[error("invalid path format {path:?}: {reason}")]
    InvalidPathFormat { path: String, reason: String },

    /// A reference node (parent or sibling) cannot be used for attachment
    /// or querying because it lacks an id or a path.
    #[error("malformed reference node: {0}")]
    MalformedReference(String),

    /// Attaching the node would place it inside its own subtree.
    #[error("cannot attach node {node} under {reference}: it is an ancestor of the reference")]
    CyclicAttachment { node: NodeId, reference: NodeId },

    /// A node referenced by a path or parent id does not exist.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// A stored record could not be decoded into a node.
    #[error("cannot decode record {id:?}: {reason}")]
    Decode { id: Option<NodeId>, reason: String },

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Failure reported by the record store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<TypeError> for TreeError {
    fn from(e: TypeError) -> Self {
        match e {
            TypeError::InvalidPath { path, reason } => Self::InvalidPathFormat { path, reason },
            TypeError::InvalidId(id) => Self::Decode {
                id: None,
                reason: format!("invalid node id {id:?}"),
            },
        }
    }
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
