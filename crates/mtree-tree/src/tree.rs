//! Path maintenance and relationship queries.
//!
//! [`PathTree`] wraps a [`RecordStore`] and a [`TreeConfig`]. The three
//! attachment operations are the only code that writes the path, parent,
//! and level columns. Every query is derived from those columns and returned
//! as a [`NodeQuery`] (or a single node), so nothing is traversed
//! recursively.
//!
//! # Invariants after an attachment
//!
//! - The path ends with the node's own id.
//! - A child's path is its parent's path plus its own id.
//! - `level` is the number of path segments minus one.
//! - `parent_id` is absent exactly when `level == 0`.
//!
//! Attachment only rewrites the attached node. Descendants of a re-attached
//! node keep their old paths.

use mtree_store::{Filter, OrderBy, RecordStore, Scan};
use mtree_types::{NodeId, TreePath};
use tracing::debug;

use crate::cache::ParentCache;
use crate::config::{TreeConfig, TreeField};
use crate::error::{TreeError, TreeResult};
use crate::node::Node;
use crate::query::NodeQuery;

/// A materialized-path tree over a record store.
pub struct PathTree<S: RecordStore> {
    store: S,
    config: TreeConfig,
    parents: ParentCache,
}

impl<S: RecordStore> PathTree<S> {
    /// Create a tree over `store`. Fails if the configuration is invalid.
    pub fn new(store: S, config: TreeConfig) -> TreeResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            parents: ParentCache::new(),
        })
    }

    /// Create a tree with the default column mapping.
    pub fn with_defaults(store: S) -> Self {
        Self {
            store,
            config: TreeConfig::default(),
            parents: ParentCache::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn parent_cache(&self) -> &ParentCache {
        &self.parents
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    /// Load a node by id.
    pub fn find(&self, id: NodeId) -> TreeResult<Option<Node>> {
        self.store
            .find(id)?
            .map(|record| Node::from_record(record, &self.config.fields))
            .transpose()
    }

    /// Persist a node's attributes.
    ///
    /// The path, parent, and level columns keep the values already stored
    /// for the node; whatever the caller set on those fields is ignored. A
    /// node the store has never seen is written unattached. Use the
    /// attachment operations to move a node.
    pub fn save(&self, node: &Node) -> TreeResult<Node> {
        let stored = match node.id {
            Some(id) => self.find(id)?,
            None => None,
        };
        let mut node = node.clone();
        match stored {
            Some(stored) => {
                node.path = stored.path;
                node.parent_id = stored.parent_id;
                node.level = stored.level;
            }
            None => {
                node.path = None;
                node.parent_id = None;
                node.level = 0;
            }
        }
        self.write(&node)
    }

    /// Write `node` with its tree columns as given and drop any cached copy.
    fn write(&self, node: &Node) -> TreeResult<Node> {
        let record = self.store.persist(node.to_record(&self.config.fields))?;
        let saved = Node::from_record(record, &self.config.fields)?;
        if let Some(id) = saved.id {
            self.parents.invalidate(id);
        }
        Ok(saved)
    }

    /// Persist `node` if it has no id yet, returning it with its id.
    fn ensure_persisted(&self, node: Node) -> TreeResult<(Node, NodeId)> {
        let node = match node.id {
            Some(_) => node,
            None => self.save(&node)?,
        };
        let id = node.id.ok_or_else(|| TreeError::Decode {
            id: None,
            reason: "store returned a record without an id".into(),
        })?;
        Ok((node, id))
    }

    fn column(&self, field: TreeField) -> &str {
        self.config.fields.column(field)
    }

    // ---------------------------------------------------------------
    // Attachment
    // ---------------------------------------------------------------

    /// Make `node` a root: `path = "<id>/"`, no parent, level 0.
    ///
    /// The node is persisted first if it has no id. The final write always
    /// happens, even if nothing changed.
    pub fn attach_as_root(&self, node: Node) -> TreeResult<Node> {
        let (mut node, id) = self.ensure_persisted(node)?;

        node.path = Some(TreePath::root(id));
        node.parent_id = None;
        node.level = 0;

        let saved = self.write(&node)?;
        debug!(node = %id, path = %saved.path_string(), "attached node as root");
        Ok(saved)
    }

    /// Make `node` a child of `parent`: `path = parent.path + "<id>/"`,
    /// `parent_id = parent.id`, `level = parent.level + 1`.
    ///
    /// `parent`'s stored fields are trusted as-is; only a parent without an
    /// id or path is rejected.
    pub fn attach_as_child_of(&self, node: Node, parent: &Node) -> TreeResult<Node> {
        let (parent_id, parent_path) = reference_parts(parent, "parent")?;
        let (mut node, id) = self.ensure_persisted(node)?;

        if parent_path.ids().contains(&id) {
            return Err(TreeError::CyclicAttachment {
                node: id,
                reference: parent_id,
            });
        }

        node.path = Some(parent_path.child(id));
        node.parent_id = Some(parent_id);
        node.level = parent.level + 1;

        let saved = self.write(&node)?;
        debug!(
            node = %id,
            parent = %parent_id,
            path = %saved.path_string(),
            level = saved.level,
            "attached node as child"
        );
        Ok(saved)
    }

    /// Make `node` a sibling of `sibling`: same parent and level, and a path
    /// made of the sibling's ancestors plus `"<id>/"`.
    ///
    /// The sibling's parent is not loaded; its path and parent id are used
    /// directly.
    pub fn attach_as_sibling_of(&self, node: Node, sibling: &Node) -> TreeResult<Node> {
        let (sibling_id, sibling_path) = reference_parts(sibling, "sibling")?;
        let (mut node, id) = self.ensure_persisted(node)?;

        if sibling_path.ancestor_ids().contains(&id) {
            return Err(TreeError::CyclicAttachment {
                node: id,
                reference: sibling_id,
            });
        }

        node.path = Some(sibling_path.sibling(id));
        node.parent_id = sibling.parent_id;
        node.level = sibling.level;

        let saved = self.write(&node)?;
        debug!(
            node = %id,
            sibling = %sibling_id,
            path = %saved.path_string(),
            level = saved.level,
            "attached node as sibling"
        );
        Ok(saved)
    }

    // ---------------------------------------------------------------
    // Relationship queries
    // ---------------------------------------------------------------

    /// Returns `true` if the node has no parent.
    pub fn is_root(&self, node: &Node) -> bool {
        node.is_root()
    }

    /// The node's parent, or `None` for a root.
    ///
    /// Resolved parents are served from the tree's [`ParentCache`] when
    /// `cache_parents` is enabled. A parent id that no longer resolves
    /// yields `None`.
    pub fn parent(&self, node: &Node) -> TreeResult<Option<Node>> {
        let Some(parent_id) = node.parent_id else {
            return Ok(None);
        };

        if self.config.cache_parents {
            if let Some(cached) = self.parents.get(parent_id) {
                return Ok(Some(cached));
            }
        }

        let parent = self.find(parent_id)?;
        if self.config.cache_parents {
            if let Some(parent) = &parent {
                self.parents.insert(parent);
            }
        }
        Ok(parent)
    }

    /// Direct children of `node`, in id order.
    pub fn children(&self, node: &Node) -> TreeResult<NodeQuery<'_, S>> {
        let id = persisted_id(node)?;
        let scan = Scan::all().filter(Filter::eq(self.column(TreeField::Parent), id.get()));
        Ok(NodeQuery::new(self, scan))
    }

    /// Every node below `node`, shallowest first. `node` itself is excluded.
    pub fn descendants(&self, node: &Node) -> TreeResult<NodeQuery<'_, S>> {
        let path = checked_path(node)?;
        let id = persisted_id(node)?;
        let scan = Scan::all()
            .filter(Filter::prefix(self.column(TreeField::Path), path.to_string()))
            .filter(Filter::IdNotEq(id))
            .order(OrderBy::asc(self.column(TreeField::Level)));
        Ok(NodeQuery::new(self, scan))
    }

    /// Every node above `node`, root first. Empty for a root.
    pub fn ancestors(&self, node: &Node) -> TreeResult<NodeQuery<'_, S>> {
        let path = checked_path(node)?;
        let id = persisted_id(node)?;
        let scan = Scan::all()
            .filter(Filter::IdIn(path.ancestor_ids().to_vec()))
            .filter(Filter::IdNotEq(id))
            .order(OrderBy::asc(self.column(TreeField::Level)));
        Ok(NodeQuery::new(self, scan))
    }

    /// The root of `node`'s tree: `node` itself if it is a root, otherwise
    /// the node named by the first path segment.
    pub fn root(&self, node: &Node) -> TreeResult<Node> {
        if node.is_root() {
            return Ok(node.clone());
        }
        let root_id = checked_path(node)?.root_id();
        self.find(root_id)?.ok_or(TreeError::NodeNotFound(root_id))
    }

    /// Every node under the root `root_id`, shallowest first.
    ///
    /// The root itself is not included; see
    /// [`fetch_tree_with_root`](Self::fetch_tree_with_root).
    pub fn fetch_tree(&self, root_id: NodeId) -> NodeQuery<'_, S> {
        let prefix = TreePath::subtree_prefix(root_id);
        let scan = Scan::all()
            .filter(Filter::prefix(self.column(TreeField::Path), prefix.clone()))
            .filter(Filter::not_eq(self.column(TreeField::Path), prefix))
            .order(OrderBy::asc(self.column(TreeField::Level)));
        NodeQuery::new(self, scan)
    }

    /// Every node in the tree rooted at `root_id`, the root first.
    pub fn fetch_tree_with_root(&self, root_id: NodeId) -> NodeQuery<'_, S> {
        let scan = Scan::all()
            .filter(Filter::prefix(
                self.column(TreeField::Path),
                TreePath::subtree_prefix(root_id),
            ))
            .order(OrderBy::asc(self.column(TreeField::Level)));
        NodeQuery::new(self, scan)
    }

    /// Every node without a parent, in id order.
    ///
    /// Nodes that were persisted but never attached also have no parent and
    /// are included.
    pub fn roots(&self) -> NodeQuery<'_, S> {
        let scan = Scan::all().filter(Filter::is_null(self.column(TreeField::Parent)));
        NodeQuery::new(self, scan)
    }

    /// Nodes sharing `node`'s parent, excluding `node`. For a root, the
    /// other parentless nodes.
    pub fn siblings(&self, node: &Node) -> TreeResult<NodeQuery<'_, S>> {
        let id = persisted_id(node)?;
        let parent_column = self.column(TreeField::Parent);
        let same_parent = match node.parent_id {
            Some(parent_id) => Filter::eq(parent_column, parent_id.get()),
            None => Filter::is_null(parent_column),
        };
        let scan = Scan::all().filter(same_parent).filter(Filter::IdNotEq(id));
        Ok(NodeQuery::new(self, scan))
    }

    /// The identifiers in `node`'s path, root first, ending with its own.
    pub fn path_ids(&self, node: &Node) -> TreeResult<Vec<NodeId>> {
        Ok(checked_path(node)?.ids().to_vec())
    }
}

impl<S: RecordStore + std::fmt::Debug> std::fmt::Debug for PathTree<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathTree")
            .field("store", &self.store)
            .field("config", &self.config)
            .field("cached_parents", &self.parents.len())
            .finish()
    }
}

/// The id and path of a node used as an attachment reference.
fn reference_parts<'n>(node: &'n Node, role: &str) -> TreeResult<(NodeId, &'n TreePath)> {
    let id = node
        .id
        .ok_or_else(|| TreeError::MalformedReference(format!("{role} has not been persisted")))?;
    let path = node
        .path
        .as_ref()
        .ok_or_else(|| TreeError::MalformedReference(format!("{role} {id} has no path")))?;
    Ok((id, path))
}

fn persisted_id(node: &Node) -> TreeResult<NodeId> {
    node.id
        .ok_or_else(|| TreeError::MalformedReference("node has not been persisted".into()))
}

/// The node's path, checked to end in the node's own id.
fn checked_path(node: &Node) -> TreeResult<&TreePath> {
    let path = node.path.as_ref().ok_or_else(|| TreeError::InvalidPathFormat {
        path: String::new(),
        reason: "node has no path".into(),
    })?;
    if let Some(id) = node.id {
        if path.owner_id() != id {
            return Err(TreeError::InvalidPathFormat {
                path: path.to_string(),
                reason: format!("last segment is not the node's own id {id}"),
            });
        }
    }
    Ok(path)
}
