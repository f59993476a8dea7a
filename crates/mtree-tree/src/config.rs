use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};

/// The three logical columns a tree maintains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeField {
    Path,
    Parent,
    Level,
}

/// Maps logical tree fields to physical record column names.
///
/// Consulted whenever a node is encoded into a record or a scan is built,
/// so the tree logic never hard-codes a schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub path: String,
    pub parent: String,
    pub level: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            path: "path".into(),
            parent: "parent_id".into(),
            level: "level".into(),
        }
    }
}

impl FieldMapping {
    /// Physical column name for a logical field.
    pub fn column(&self, field: TreeField) -> &str {
        match field {
            TreeField::Path => &self.path,
            TreeField::Parent => &self.parent,
            TreeField::Level => &self.level,
        }
    }

    /// Column names must be non-empty and pairwise distinct.
    pub fn validate(&self) -> TreeResult<()> {
        let mut seen = HashSet::new();
        for (field, name) in [
            ("path", &self.path),
            ("parent", &self.parent),
            ("level", &self.level),
        ] {
            if name.trim().is_empty() {
                return Err(TreeError::Config(format!(
                    "column name for `{field}` is empty"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(TreeError::Config(format!(
                    "column name {name:?} is mapped more than once"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for a [`PathTree`](crate::PathTree).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Logical-to-physical column mapping.
    pub fields: FieldMapping,
    /// Whether resolved parents are kept in the tree's id-keyed cache.
    pub cache_parents: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            fields: FieldMapping::default(),
            cache_parents: true,
        }
    }
}

impl TreeConfig {
    /// Parse and validate a TOML document.
    ///
    /// ```toml
    /// cache_parents = false
    ///
    /// [fields]
    /// path = "node_path"
    /// parent = "parent_node"
    /// level = "depth"
    /// ```
    ///
    /// Keys that are left out keep their defaults.
    pub fn from_toml_str(s: &str) -> TreeResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| TreeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load(path: &Path) -> TreeResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TreeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> TreeResult<()> {
        self.fields.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mapping() {
        let c = TreeConfig::default();
        assert_eq!(c.fields.column(TreeField::Path), "path");
        assert_eq!(c.fields.column(TreeField::Parent), "parent_id");
        assert_eq!(c.fields.column(TreeField::Level), "level");
        assert!(c.cache_parents);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parse_full_toml() {
        let c = TreeConfig::from_toml_str(
            r#"
            cache_parents = false

            [fields]
            path = "node_path"
            parent = "parent_node"
            level = "depth"
            "#,
        )
        .unwrap();
        assert!(!c.cache_parents);
        assert_eq!(c.fields.path, "node_path");
        assert_eq!(c.fields.parent, "parent_node");
        assert_eq!(c.fields.level, "depth");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = TreeConfig::from_toml_str("[fields]\nlevel = \"depth\"\n").unwrap();
        assert_eq!(c.fields.level, "depth");
        assert_eq!(c.fields.path, "path");
        assert!(c.cache_parents);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(TreeConfig::from_toml_str("").unwrap(), TreeConfig::default());
    }

    #[test]
    fn duplicate_columns_rejected() {
        let err = TreeConfig::from_toml_str("[fields]\npath = \"level\"\n").unwrap_err();
        assert!(matches!(err, TreeError::Config(_)));
    }

    #[test]
    fn empty_column_rejected() {
        let mapping = FieldMapping {
            parent: "  ".into(),
            ..FieldMapping::default()
        };
        assert!(mapping.validate().is_err());
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(matches!(
            TreeConfig::from_toml_str("cache_parents = "),
            Err(TreeError::Config(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.toml");
        std::fs::write(&path, "[fields]\nparent = \"parent_node\"\n").unwrap();
        let c = TreeConfig::load(&path).unwrap();
        assert_eq!(c.fields.parent, "parent_node");

        let missing = TreeConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(TreeError::Config(_))));
    }
}
