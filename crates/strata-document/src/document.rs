//! Resource documents
//!
//! A [`ResourceDocument`] pairs a parsed tree with an annotation side-table.
//! The side-table carries pipeline metadata (origin path, index, grouping keys)
//! without touching the semantic tree; it is merged into `metadata.annotations`
//! only when the document is serialized.

use crate::annotations::validate_key;
use crate::error::DocumentResult;
use crate::node::{Node, NodeValue};
use indexmap::IndexMap;

/// One parsed resource plus pipeline annotations
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDocument {
    /// Semantic content
    pub root: Node,
    annotations: IndexMap<String, String>,
}

impl Default for ResourceDocument {
    fn default() -> Self {
        Self::new(Node::mapping())
    }
}

impl ResourceDocument {
    /// Wrap a tree with an empty annotation table
    #[inline]
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self {
            root,
            annotations: IndexMap::new(),
        }
    }

    /// All annotations in insertion order
    #[inline]
    #[must_use]
    pub fn annotations(&self) -> &IndexMap<String, String> {
        &self.annotations
    }

    /// Single annotation value
    #[inline]
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Set an annotation, replacing any previous value
    pub fn set_annotation(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.annotations.insert(key.into(), value.into());
    }

    /// Builder form of [`ResourceDocument::set_annotation`]
    #[inline]
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_annotation(key, value);
        self
    }

    /// Remove an annotation
    ///
    /// Clearing a key that is not present is a no-op.
    ///
    /// # Errors
    /// `DocumentError::InvalidAnnotationKey` if `key` is not a qualified name
    pub fn clear_annotation(&mut self, key: &str) -> DocumentResult<Option<String>> {
        validate_key(key)?;
        Ok(self.annotations.shift_remove(key))
    }

    /// Remove every annotation
    pub fn clear_all_annotations(&mut self) {
        self.annotations.clear();
    }

    /// `apiVersion` field
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.root.get("apiVersion").and_then(Node::as_str)
    }

    /// `kind` field
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.root.get("kind").and_then(Node::as_str)
    }

    /// `metadata.name` field
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.root.get_path(&["metadata", "name"]).and_then(Node::as_str)
    }

    /// `metadata.namespace` field
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.root
            .get_path(&["metadata", "namespace"])
            .and_then(Node::as_str)
    }

    /// `metadata.labels` as ordered string pairs
    #[must_use]
    pub fn labels(&self) -> IndexMap<String, String> {
        self.string_map(&["metadata", "labels"])
    }

    /// `data` section as ordered string pairs
    #[must_use]
    pub fn data_map(&self) -> IndexMap<String, String> {
        self.string_map(&["data"])
    }

    fn string_map(&self, path: &[&str]) -> IndexMap<String, String> {
        self.root
            .get_path(path)
            .map(|node| {
                node.entries()
                    .iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tree with the annotation table merged into `metadata.annotations`
    ///
    /// Non-mapping roots are returned unchanged.
    #[must_use]
    pub fn to_node(&self) -> Node {
        let mut node = self.root.clone();
        if self.annotations.is_empty() || !node.is_mapping() {
            return node;
        }
        if let Some(target) = node
            .ensure_mapping("metadata")
            .and_then(|metadata| metadata.ensure_mapping("annotations"))
        {
            for (key, value) in &self.annotations {
                target.set(key, Node::string(value.clone()));
            }
        }
        node
    }

    /// Move annotations matching `predicate` out of `metadata.annotations`
    ///
    /// Empty `annotations` and `metadata` mappings left behind are removed.
    pub fn lift_annotations(&mut self, predicate: impl Fn(&str) -> bool) {
        let Some(metadata) = self.root.get_mut("metadata") else {
            return;
        };
        let Some(annotations) = metadata.get_mut("annotations") else {
            return;
        };
        let NodeValue::Mapping(pairs) = &mut annotations.value else {
            return;
        };

        let mut lifted = Vec::new();
        pairs.retain(|(k, v)| match (k.as_str(), v.as_str()) {
            (Some(key), Some(value)) if predicate(key) => {
                lifted.push((key.to_string(), value.to_string()));
                false
            }
            _ => true,
        });
        if lifted.is_empty() {
            return;
        }

        if pairs.is_empty() {
            metadata.remove("annotations");
            if metadata.is_empty() {
                self.root.remove("metadata");
            }
        }
        self.annotations.extend(lifted);
    }
}

impl From<Node> for ResourceDocument {
    fn from(root: Node) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{is_reader_annotation, INDEX_ANNOTATION, PATH_ANNOTATION};

    fn config_map() -> ResourceDocument {
        let mut metadata = Node::mapping();
        metadata.set("name", Node::string("settings"));
        let mut labels = Node::mapping();
        labels.set("app", Node::string("web"));
        metadata.set("labels", labels);
        let mut data = Node::mapping();
        data.set("LOG_LEVEL", Node::string("debug"));
        let mut root = Node::mapping();
        root.set("apiVersion", Node::string("v1"));
        root.set("kind", Node::string("ConfigMap"));
        root.set("metadata", metadata);
        root.set("data", data);
        ResourceDocument::new(root)
    }

    #[test]
    fn accessors() {
        let document = config_map();
        assert_eq!(document.api_version(), Some("v1"));
        assert_eq!(document.kind(), Some("ConfigMap"));
        assert_eq!(document.name(), Some("settings"));
        assert_eq!(document.namespace(), None);
        assert_eq!(document.labels().get("app").map(String::as_str), Some("web"));
        assert_eq!(document.data_map().len(), 1);
    }

    #[test]
    fn clear_absent_annotation_is_noop() {
        let mut document = config_map();
        assert_eq!(document.clear_annotation(INDEX_ANNOTATION).unwrap(), None);
        assert_eq!(document.clear_annotation(INDEX_ANNOTATION).unwrap(), None);
    }

    #[test]
    fn clear_malformed_key_fails() {
        let mut document = config_map();
        assert!(document.clear_annotation("not a key").is_err());
    }

    #[test]
    fn annotations_stay_out_of_tree() {
        let document = config_map().with_annotation(PATH_ANNOTATION, "cm.yaml");
        assert!(document.root.get_path(&["metadata", "annotations"]).is_none());

        let merged = document.to_node();
        assert_eq!(
            merged
                .get_path(&["metadata", "annotations", PATH_ANNOTATION])
                .and_then(Node::as_str),
            Some("cm.yaml")
        );
    }

    #[test]
    fn lift_removes_emptied_mappings() {
        let mut annotations = Node::mapping();
        annotations.set(INDEX_ANNOTATION, Node::string("3"));
        let mut metadata = Node::mapping();
        metadata.set("annotations", annotations);
        let mut root = Node::mapping();
        root.set("kind", Node::string("Secret"));
        root.set("metadata", metadata);

        let mut document = ResourceDocument::new(root);
        document.lift_annotations(is_reader_annotation);

        assert_eq!(document.annotation(INDEX_ANNOTATION), Some("3"));
        assert!(document.root.get("metadata").is_none());
    }

    #[test]
    fn lift_keeps_foreign_annotations() {
        let mut document = config_map();
        let metadata = document.root.get_mut("metadata").unwrap();
        let annotations = metadata.ensure_mapping("annotations").unwrap();
        annotations.set("example.com/owner", Node::string("team-a"));
        annotations.set(PATH_ANNOTATION, Node::string("cm.yaml"));

        document.lift_annotations(is_reader_annotation);

        assert_eq!(document.annotation(PATH_ANNOTATION), Some("cm.yaml"));
        assert_eq!(
            document
                .root
                .get_path(&["metadata", "annotations", "example.com/owner"])
                .and_then(Node::as_str),
            Some("team-a")
        );
    }
}
