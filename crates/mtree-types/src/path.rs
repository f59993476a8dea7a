//! Structured materialized paths.
//!
//! A [`TreePath`] is the root-first chain of identifiers from a tree's root
//! down to (and including) the node that owns it. It is only turned into the
//! delimited string form at the storage boundary:
//!
//! ```text
//! root          [1]       -> "1/"
//! child         [1, 2]    -> "1/2/"
//! grandchild    [1, 2, 3] -> "1/2/3/"
//! ```
//!
//! Every segment is terminated by [`PATH_DELIMITER`], so a plain
//! `starts_with` on the string form is always anchored at a segment boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::NodeId;

/// Terminator appended after every path segment.
pub const PATH_DELIMITER: char = '/';

/// A non-empty, root-first sequence of node identifiers.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TreePath {
    segments: Vec<NodeId>,
}

impl TreePath {
    /// Path of a root node: just its own identifier.
    pub fn root(id: NodeId) -> Self {
        Self { segments: vec![id] }
    }

    /// Build a path from explicit segments. Fails on an empty sequence.
    pub fn from_segments(segments: Vec<NodeId>) -> Result<Self, TypeError> {
        if segments.is_empty() {
            return Err(TypeError::InvalidPath {
                path: String::new(),
                reason: "path has no segments".into(),
            });
        }
        Ok(Self { segments })
    }

    /// Parse the delimited wire form (`"1/2/3/"`).
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        if s.is_empty() {
            return Err(invalid("path is empty"));
        }
        let Some(body) = s.strip_suffix(PATH_DELIMITER) else {
            return Err(invalid("path does not end with the delimiter"));
        };

        let segments = body
            .split(PATH_DELIMITER)
            .map(|segment| {
                if segment.is_empty() {
                    return Err(invalid("path contains an empty segment"));
                }
                segment
                    .parse::<NodeId>()
                    .map_err(|_| invalid(&format!("segment {segment:?} is not a node id")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    /// Path of a child of this path's owner.
    pub fn child(&self, id: NodeId) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(id);
        Self { segments }
    }

    /// Path of a sibling of this path's owner: the owner's segment is
    /// replaced by `id`. The sibling of a root is another root.
    pub fn sibling(&self, id: NodeId) -> Self {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            *last = id;
        }
        Self { segments }
    }

    /// All segments, root first, owner last.
    pub fn ids(&self) -> &[NodeId] {
        &self.segments
    }

    /// Segments strictly above the owner, root first.
    pub fn ancestor_ids(&self) -> &[NodeId] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The first segment: the tree's root.
    pub fn root_id(&self) -> NodeId {
        self.segments[0]
    }

    /// The last segment: the owner of this path.
    pub fn owner_id(&self) -> NodeId {
        self.segments[self.segments.len() - 1]
    }

    /// The immediate parent's identifier, `None` for a root path.
    pub fn parent_id(&self) -> Option<NodeId> {
        self.ancestor_ids().last().copied()
    }

    /// Depth implied by the path (root = 0).
    pub fn level(&self) -> u32 {
        (self.segments.len() - 1) as u32
    }

    /// Number of segments (always at least one).
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; a path owns at least one segment.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if `other` lies in the subtree rooted at this path's
    /// owner (including the owner itself).
    pub fn is_prefix_of(&self, other: &TreePath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Returns `true` if `other` is a proper descendant of this path's owner.
    pub fn is_ancestor_of(&self, other: &TreePath) -> bool {
        other.segments.len() > self.segments.len() && self.is_prefix_of(other)
    }

    /// Wire-form prefix matching the subtree of `root` (`"<root>/"`).
    pub fn subtree_prefix(root: NodeId) -> String {
        format!("{root}{PATH_DELIMITER}")
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}{PATH_DELIMITER}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreePath({self})")
    }
}

impl FromStr for TreePath {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TreePath {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TreePath> for String {
    fn from(path: TreePath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw)
    }

    fn path(raw: &[u64]) -> TreePath {
        TreePath::from_segments(raw.iter().copied().map(NodeId::new).collect()).unwrap()
    }

    #[test]
    fn root_path_is_id_and_delimiter() {
        let p = TreePath::root(id(1));
        assert_eq!(p.to_string(), "1/");
        assert_eq!(p.level(), 0);
        assert_eq!(p.parent_id(), None);
        assert!(p.ancestor_ids().is_empty());
    }

    #[test]
    fn child_appends_segment() {
        let p = TreePath::root(id(1)).child(id(2)).child(id(3));
        assert_eq!(p.to_string(), "1/2/3/");
        assert_eq!(p.level(), 2);
        assert_eq!(p.parent_id(), Some(id(2)));
        assert_eq!(p.root_id(), id(1));
        assert_eq!(p.owner_id(), id(3));
        assert_eq!(p.ancestor_ids(), &[id(1), id(2)]);
    }

    #[test]
    fn sibling_replaces_owner_segment() {
        let c = path(&[1, 2]);
        assert_eq!(c.sibling(id(4)).to_string(), "1/4/");
    }

    #[test]
    fn sibling_handles_multi_digit_ids() {
        let c = path(&[10, 25]);
        assert_eq!(c.sibling(id(300)).to_string(), "10/300/");
    }

    #[test]
    fn sibling_of_root_is_root() {
        let r = TreePath::root(id(1));
        let s = r.sibling(id(9));
        assert_eq!(s.to_string(), "9/");
        assert_eq!(s.level(), 0);
    }

    #[test]
    fn parse_valid_paths() {
        assert_eq!(TreePath::parse("1/").unwrap(), path(&[1]));
        assert_eq!(TreePath::parse("1/22/333/").unwrap(), path(&[1, 22, 333]));
    }

    #[test]
    fn parse_rejects_missing_trailing_delimiter() {
        let err = TreePath::parse("1/2").unwrap_err();
        assert!(matches!(err, TypeError::InvalidPath { .. }));
    }

    #[test]
    fn parse_rejects_empty_and_blank_segments() {
        assert!(TreePath::parse("").is_err());
        assert!(TreePath::parse("/").is_err());
        assert!(TreePath::parse("1//2/").is_err());
    }

    #[test]
    fn parse_rejects_non_numeric_segment() {
        assert!(TreePath::parse("1/abc/").is_err());
    }

    #[test]
    fn from_segments_rejects_empty() {
        assert!(TreePath::from_segments(Vec::new()).is_err());
    }

    #[test]
    fn prefix_relations_are_segment_anchored() {
        let one = path(&[1]);
        let twelve = path(&[12]);
        let deep = path(&[1, 2, 3]);
        assert!(one.is_prefix_of(&deep));
        assert!(one.is_ancestor_of(&deep));
        assert!(one.is_prefix_of(&one));
        assert!(!one.is_ancestor_of(&one));
        assert!(!one.is_prefix_of(&twelve));
    }

    #[test]
    fn subtree_prefix_format() {
        assert_eq!(TreePath::subtree_prefix(id(7)), "7/");
    }

    #[test]
    fn serde_uses_wire_form() {
        let json = serde_json::to_string(&path(&[1, 2])).unwrap();
        assert_eq!(json, "\"1/2/\"");
        let back: TreePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path(&[1, 2]));
        assert!(serde_json::from_str::<TreePath>("\"1/2\"").is_err());
    }

    proptest! {
        #[test]
        fn level_is_segment_count_minus_one(raw in proptest::collection::vec(0u64..10_000, 1..12)) {
            let p = path(&raw);
            let wire = p.to_string();
            prop_assert!(wire.ends_with(PATH_DELIMITER));
            prop_assert_eq!(wire.matches(PATH_DELIMITER).count() - 1, p.level() as usize);
        }

        #[test]
        fn child_wire_form_extends_parent(raw in proptest::collection::vec(0u64..10_000, 1..12), next in 0u64..10_000) {
            let parent = path(&raw);
            let child = parent.child(NodeId::new(next));
            prop_assert_eq!(child.to_string(), format!("{parent}{next}/"));
            prop_assert_eq!(child.level(), parent.level() + 1);
            prop_assert!(child.to_string().starts_with(&parent.to_string()));
        }

        #[test]
        fn sibling_shares_ancestors(raw in proptest::collection::vec(0u64..10_000, 1..12), other in 0u64..10_000) {
            let p = path(&raw);
            let s = p.sibling(NodeId::new(other));
            prop_assert_eq!(s.ancestor_ids(), p.ancestor_ids());
            prop_assert_eq!(s.level(), p.level());
            prop_assert_eq!(s.owner_id(), NodeId::new(other));
        }
    }
}
