//! Tree nodes and their record encoding.
//!
//! A [`Node`] keeps the tree columns as typed fields. Everything else in the
//! backing record is carried in `attributes` untouched. Column names are
//! resolved through a [`FieldMapping`] only when crossing the store boundary.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use mtree_store::Record;
use mtree_types::{NodeId, TreePath};

use crate::config::{FieldMapping, TreeField};
use crate::error::{TreeError, TreeResult};

/// One hierarchical record.
///
/// A freshly built node has no id and no path. Both are filled in by the
/// attachment operations on [`PathTree`](crate::PathTree).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: Option<NodeId>,
    pub path: Option<TreePath>,
    pub parent_id: Option<NodeId>,
    pub level: u32,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Node {
    /// An unpersisted, unattached node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Attribute value, if present.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns `true` once the store has assigned an id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Returns `true` if the node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Wire form of the path, or an empty string when unattached.
    pub fn path_string(&self) -> String {
        self.path.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// Encode into a record using the given column mapping.
    ///
    /// Tree columns take precedence over attributes with the same name.
    pub fn to_record(&self, fields: &FieldMapping) -> Record {
        let mut record = Record {
            id: self.id,
            fields: self.attributes.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        record.set(
            fields.column(TreeField::Path),
            self.path
                .as_ref()
                .map_or(Value::Null, |p| Value::String(p.to_string())),
        );
        record.set(
            fields.column(TreeField::Parent),
            self.parent_id.map_or(Value::Null, |p| Value::from(p.get())),
        );
        record.set(fields.column(TreeField::Level), self.level);
        record
    }

    /// Decode a stored record using the given column mapping.
    ///
    /// A missing or null path decodes to an unattached node. A path that is
    /// present but malformed is [`TreeError::InvalidPathFormat`].
    pub fn from_record(mut record: Record, fields: &FieldMapping) -> TreeResult<Self> {
        let id = record.id.ok_or_else(|| TreeError::Decode {
            id: None,
            reason: "record has no id".into(),
        })?;
        let decode_err = |reason: String| TreeError::Decode {
            id: Some(id),
            reason,
        };

        let path = match record.fields.remove(fields.column(TreeField::Path)) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(TreePath::parse(&s)?),
            Some(other) => {
                return Err(TreeError::InvalidPathFormat {
                    path: other.to_string(),
                    reason: "path column is not a string".into(),
                })
            }
        };

        let parent_id = match record.fields.remove(fields.column(TreeField::Parent)) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_u64().map(NodeId::new).ok_or_else(|| {
                decode_err(format!("parent column holds {value}, expected an id"))
            })?),
        };

        let level = match record.fields.remove(fields.column(TreeField::Level)) {
            None | Some(Value::Null) => 0,
            Some(value) => value
                .as_u64()
                .and_then(|l| u32::try_from(l).ok())
                .ok_or_else(|| decode_err(format!("level column holds {value}")))?,
        };

        Ok(Self {
            id: Some(id),
            path,
            parent_id,
            level,
            attributes: record.fields,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> FieldMapping {
        FieldMapping::default()
    }

    #[test]
    fn new_node_is_unattached() {
        let n = Node::new();
        assert!(!n.is_persisted());
        assert!(n.is_root());
        assert_eq!(n.path_string(), "");
        assert_eq!(n.level, 0);
    }

    #[test]
    fn encode_uses_mapped_columns() {
        let m = FieldMapping {
            path: "node_path".into(),
            parent: "parent_node".into(),
            level: "depth".into(),
        };
        let node = Node {
            id: Some(NodeId::new(2)),
            path: Some(TreePath::parse("1/2/").unwrap()),
            parent_id: Some(NodeId::new(1)),
            level: 1,
            ..Node::new()
        }
        .with_attribute("title", "child");

        let record = node.to_record(&m);
        assert_eq!(record.get_str("node_path"), Some("1/2/"));
        assert_eq!(record.get_u64("parent_node"), Some(1));
        assert_eq!(record.get_u64("depth"), Some(1));
        assert_eq!(record.get_str("title"), Some("child"));
        assert!(record.get("path").is_none());
    }

    #[test]
    fn encode_root_writes_null_parent() {
        let node = Node {
            id: Some(NodeId::new(1)),
            path: Some(TreePath::root(NodeId::new(1))),
            ..Node::new()
        };
        let record = node.to_record(&mapping());
        assert!(record.is_null("parent_id"));
        assert_eq!(record.get_u64("level"), Some(0));
    }

    #[test]
    fn tree_columns_override_attributes() {
        let node = Node::new().with_attribute("level", "bogus");
        let record = node.to_record(&mapping());
        assert_eq!(record.get_u64("level"), Some(0));
    }

    #[test]
    fn decode_strips_tree_columns_from_attributes() {
        let mut record = Record::new()
            .with_field("path", "1/2/")
            .with_field("parent_id", 1)
            .with_field("level", 1)
            .with_field("title", "child");
        record.id = Some(NodeId::new(2));

        let node = Node::from_record(record, &mapping()).unwrap();
        assert_eq!(node.id, Some(NodeId::new(2)));
        assert_eq!(node.path_string(), "1/2/");
        assert_eq!(node.parent_id, Some(NodeId::new(1)));
        assert_eq!(node.level, 1);
        assert_eq!(node.attributes.len(), 1);
        assert_eq!(node.attribute("title"), Some(&Value::from("child")));
    }

    #[test]
    fn decode_unattached_record() {
        let mut record = Record::new().with_field("path", Value::Null);
        record.id = Some(NodeId::new(9));
        let node = Node::from_record(record, &mapping()).unwrap();
        assert!(node.path.is_none());
        assert!(node.is_root());
    }

    #[test]
    fn decode_rejects_malformed_path() {
        let mut record = Record::new().with_field("path", "1/2");
        record.id = Some(NodeId::new(2));
        let err = Node::from_record(record, &mapping()).unwrap_err();
        assert!(matches!(err, TreeError::InvalidPathFormat { .. }));
    }

    #[test]
    fn decode_rejects_non_numeric_parent() {
        let mut record = Record::new().with_field("parent_id", "one");
        record.id = Some(NodeId::new(2));
        let err = Node::from_record(record, &mapping()).unwrap_err();
        assert!(matches!(err, TreeError::Decode { id: Some(_), .. }));
    }

    #[test]
    fn decode_requires_id() {
        let err = Node::from_record(Record::new(), &mapping()).unwrap_err();
        assert!(matches!(err, TreeError::Decode { id: None, .. }));
    }
}
