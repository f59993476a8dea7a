use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use mtree_types::NodeId;

use crate::node::Node;

/// Id-keyed cache of resolved parent nodes.
///
/// Owned by the [`PathTree`](crate::PathTree), never by a node, so parent
/// and child values do not reference each other. Entries are plain copies;
/// a poisoned lock is recovered because the cached data cannot be left
/// half-written.
///
/// Entries are evicted only when the node they hold is written through the
/// tree, so the cache grows with the number of distinct parents resolved.
/// Long-lived trees can drop it with [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct ParentCache {
    entries: RwLock<HashMap<NodeId, Node>>,
}

impl ParentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached copy of the node with this id, if present.
    pub fn get(&self, id: NodeId) -> Option<Node> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Cache a persisted node under its id. Unpersisted nodes are ignored.
    pub fn insert(&self, node: &Node) {
        if let Some(id) = node.id {
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id, node.clone());
        }
    }

    /// Drop the entry for `id`. Returns `true` if one was present.
    pub fn invalidate(&self, id: NodeId) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64) -> Node {
        Node {
            id: Some(NodeId::new(id)),
            ..Node::new()
        }
    }

    #[test]
    fn insert_get_invalidate() {
        let cache = ParentCache::new();
        cache.insert(&node(1));
        assert_eq!(cache.get(NodeId::new(1)), Some(node(1)));
        assert!(cache.invalidate(NodeId::new(1)));
        assert!(!cache.invalidate(NodeId::new(1)));
        assert!(cache.get(NodeId::new(1)).is_none());
    }

    #[test]
    fn unpersisted_nodes_are_not_cached() {
        let cache = ParentCache::new();
        cache.insert(&Node::new());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_empties_cache() {
        let cache = ParentCache::new();
        cache.insert(&node(1));
        cache.insert(&node(2));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
