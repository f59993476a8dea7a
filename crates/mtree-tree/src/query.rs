use mtree_store::{RecordStore, Scan};

use crate::error::TreeResult;
use crate::node::Node;
use crate::tree::PathTree;

/// A lazy scan over a tree's nodes.
///
/// Building a `NodeQuery` performs no I/O. Every call to [`get`],
/// [`first`], or [`count`] runs the scan against the store's current state,
/// so the same query can be executed again after the tree changes.
///
/// [`get`]: NodeQuery::get
/// [`first`]: NodeQuery::first
/// [`count`]: NodeQuery::count
pub struct NodeQuery<'t, S: RecordStore> {
    tree: &'t PathTree<S>,
    scan: Scan,
}

impl<'t, S: RecordStore> NodeQuery<'t, S> {
    pub(crate) fn new(tree: &'t PathTree<S>, scan: Scan) -> Self {
        Self { tree, scan }
    }

    /// The scan request this query sends to the store.
    pub fn scan(&self) -> &Scan {
        &self.scan
    }

    /// Consume the query and return its scan request.
    pub fn into_scan(self) -> Scan {
        self.scan
    }

    /// Run the scan and decode every matching node.
    pub fn get(&self) -> TreeResult<Vec<Node>> {
        self.tree
            .store()
            .scan(&self.scan)?
            .into_iter()
            .map(|record| Node::from_record(record, &self.tree.config().fields))
            .collect()
    }

    /// Run the scan and return the first node in scan order.
    pub fn first(&self) -> TreeResult<Option<Node>> {
        Ok(self.get()?.into_iter().next())
    }

    /// Run the scan and count matches without decoding them.
    pub fn count(&self) -> TreeResult<usize> {
        Ok(self.tree.store().scan(&self.scan)?.len())
    }
}

impl<S: RecordStore> std::fmt::Debug for NodeQuery<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeQuery").field("scan", &self.scan).finish()
    }
}
