//! Document tree nodes
//!
//! A [`Node`] is one element of a parsed document: a mapping, a sequence or a
//! scalar, plus the formatting metadata the parser could recover (head,
//! line and foot comments, source line).

/// Line number used for nodes that did not come from a source file
pub const SYNTHETIC_LINE: i64 = -1;

/// Resolved tag for null scalars
pub const NULL_TAG: &str = "!!null";
/// Resolved tag for boolean scalars
pub const BOOL_TAG: &str = "!!bool";
/// Resolved tag for integer scalars
pub const INT_TAG: &str = "!!int";
/// Resolved tag for floating point scalars
pub const FLOAT_TAG: &str = "!!float";
/// Resolved tag for string scalars
pub const STR_TAG: &str = "!!str";

/// Presentation style of a scalar in its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    /// Unquoted
    #[default]
    Plain,
    /// `'single quoted'`
    SingleQuoted,
    /// `"double quoted"`
    DoubleQuoted,
    /// `|` block
    Literal,
    /// `>` block
    Folded,
}

/// Scalar payload: the raw text plus its resolved tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    /// Raw scalar text (after unescaping)
    pub value: String,
    /// Resolved short tag, e.g. `!!str`
    pub tag: String,
    /// Source presentation style
    pub style: ScalarStyle,
}

impl Scalar {
    /// Create a plain string scalar
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            tag: STR_TAG.to_string(),
            style: ScalarStyle::Plain,
        }
    }

    /// Create a scalar with an explicit tag
    #[inline]
    #[must_use]
    pub fn tagged(value: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            tag: tag.into(),
            style: ScalarStyle::Plain,
        }
    }

    /// Check if this scalar resolves to null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.tag == NULL_TAG
    }
}

/// Structural content of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// Ordered key/value pairs
    Mapping(Vec<(Node, Node)>),
    /// Ordered items
    Sequence(Vec<Node>),
    /// Leaf value
    Scalar(Scalar),
}

/// One node of a document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node content
    pub value: NodeValue,
    /// Comment lines (and synthetic blank lines) rendered before the node
    pub head_comment: String,
    /// Comment lines rendered after the node
    pub foot_comment: String,
    /// Comment on the same line, rendered after the node
    pub line_comment: String,
    /// 1-based source line, [`SYNTHETIC_LINE`] when constructed in memory
    pub line: i64,
}

impl Node {
    /// Create node without source position
    #[inline]
    #[must_use]
    pub fn new(value: NodeValue) -> Self {
        Self {
            value,
            head_comment: String::new(),
            foot_comment: String::new(),
            line_comment: String::new(),
            line: SYNTHETIC_LINE,
        }
    }

    /// Empty mapping
    #[inline]
    #[must_use]
    pub fn mapping() -> Self {
        Self::new(NodeValue::Mapping(Vec::new()))
    }

    /// Sequence of the supplied items
    #[inline]
    #[must_use]
    pub fn sequence(items: Vec<Node>) -> Self {
        Self::new(NodeValue::Sequence(items))
    }

    /// Plain string scalar
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(NodeValue::Scalar(Scalar::string(value)))
    }

    /// Scalar with an explicit tag
    #[inline]
    #[must_use]
    pub fn tagged(value: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(NodeValue::Scalar(Scalar::tagged(value, tag)))
    }

    /// Null scalar
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::tagged("", NULL_TAG)
    }

    /// Set source line
    #[inline]
    #[must_use]
    pub fn with_line(mut self, line: i64) -> Self {
        self.line = line;
        self
    }

    /// Set head comment
    #[inline]
    #[must_use]
    pub fn with_head_comment(mut self, comment: impl Into<String>) -> Self {
        self.head_comment = comment.into();
        self
    }

    /// Check if node is a mapping
    #[inline]
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        matches!(self.value, NodeValue::Mapping(_))
    }

    /// Check if node is a sequence
    #[inline]
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self.value, NodeValue::Sequence(_))
    }

    /// Scalar payload, if this is a scalar
    #[inline]
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.value {
            NodeValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Raw text of a scalar node
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().map(|s| s.value.as_str())
    }

    /// Mapping pairs (empty for other kinds)
    #[must_use]
    pub fn entries(&self) -> &[(Node, Node)] {
        match &self.value {
            NodeValue::Mapping(pairs) => pairs,
            _ => &[],
        }
    }

    /// Sequence items (empty for other kinds)
    #[must_use]
    pub fn items(&self) -> &[Node] {
        match &self.value {
            NodeValue::Sequence(items) => items,
            _ => &[],
        }
    }

    /// Look up a mapping value by scalar key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries()
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Mutable lookup of a mapping value by scalar key
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        match &mut self.value {
            NodeValue::Mapping(pairs) => pairs
                .iter_mut()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Follow a path of mapping keys
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&Node> {
        path.iter().try_fold(self, |node, segment| node.get(segment))
    }

    /// Insert or replace a mapping value
    ///
    /// Replacing keeps the position and comments of the existing key. Does
    /// nothing on non-mapping nodes.
    pub fn set(&mut self, key: &str, value: Node) {
        if let NodeValue::Mapping(pairs) = &mut self.value {
            match pairs.iter_mut().find(|(k, _)| k.as_str() == Some(key)) {
                Some((_, existing)) => *existing = value,
                None => pairs.push((Node::string(key), value)),
            }
        }
    }

    /// Get the mapping stored under `key`, inserting an empty one if missing
    pub fn ensure_mapping(&mut self, key: &str) -> Option<&mut Node> {
        if !self.is_mapping() {
            return None;
        }
        if !self.get(key).is_some_and(Node::is_mapping) {
            self.set(key, Node::mapping());
        }
        self.get_mut(key)
    }

    /// Remove a mapping entry, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        match &mut self.value {
            NodeValue::Mapping(pairs) => {
                let idx = pairs.iter().position(|(k, _)| k.as_str() == Some(key))?;
                Some(pairs.remove(idx).1)
            }
            _ => None,
        }
    }

    /// Number of direct entries (pairs or items); zero for scalars
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.value {
            NodeValue::Mapping(pairs) => pairs.len(),
            NodeValue::Sequence(items) => items.len(),
            NodeValue::Scalar(_) => 0,
        }
    }

    /// Check if a collection has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattened direct children
    ///
    /// Mappings yield `[k0, v0, k1, v1, ...]`, sequences yield their items.
    #[must_use]
    pub fn children(&self) -> Vec<&Node> {
        match &self.value {
            NodeValue::Mapping(pairs) => pairs.iter().flat_map(|(k, v)| [k, v]).collect(),
            NodeValue::Sequence(items) => items.iter().collect(),
            NodeValue::Scalar(_) => Vec::new(),
        }
    }

    /// Mutable flattened direct children, same order as [`Node::children`]
    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        match &mut self.value {
            NodeValue::Mapping(pairs) => pairs.iter_mut().flat_map(|(k, v)| [k, v]).collect(),
            NodeValue::Sequence(items) => items.iter_mut().collect(),
            NodeValue::Scalar(_) => Vec::new(),
        }
    }

    /// Single child by flattened index
    pub fn child_mut(&mut self, index: usize) -> Option<&mut Node> {
        match &mut self.value {
            NodeValue::Mapping(pairs) => {
                let (key, value) = pairs.get_mut(index / 2)?;
                Some(if index % 2 == 0 { key } else { value })
            }
            NodeValue::Sequence(items) => items.get_mut(index),
            NodeValue::Scalar(_) => None,
        }
    }

    /// Largest source line found in this subtree
    #[must_use]
    pub fn last_line(&self) -> i64 {
        self.children()
            .into_iter()
            .map(Node::last_line)
            .fold(self.line, i64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        let mut metadata = Node::mapping();
        metadata.set("name", Node::string("web"));
        let mut root = Node::mapping();
        root.set("kind", Node::string("Service"));
        root.set("metadata", metadata);
        root
    }

    #[test]
    fn get_path_walks_mappings() {
        let root = sample();
        assert_eq!(
            root.get_path(&["metadata", "name"]).and_then(Node::as_str),
            Some("web")
        );
        assert!(root.get_path(&["metadata", "labels"]).is_none());
        assert!(root.get_path(&["kind", "name"]).is_none());
    }

    #[test]
    fn set_replaces_in_place() {
        let mut root = sample();
        root.set("kind", Node::string("Deployment"));
        assert_eq!(root.entries()[0].1.as_str(), Some("Deployment"));
        assert_eq!(root.len(), 2);
    }

    #[test]
    fn ensure_mapping_creates_once() {
        let mut root = sample();
        root.ensure_mapping("spec")
            .unwrap()
            .set("replicas", Node::tagged("3", INT_TAG));
        root.ensure_mapping("spec");
        assert_eq!(
            root.get_path(&["spec", "replicas"]).and_then(Node::as_str),
            Some("3")
        );
        assert_eq!(root.len(), 3);
    }

    #[test]
    fn children_flatten_mapping_pairs() {
        let root = sample();
        let children = root.children();
        assert_eq!(children.len(), 4);
        assert_eq!(children[0].as_str(), Some("kind"));
        assert_eq!(children[1].as_str(), Some("Service"));
    }

    #[test]
    fn last_line_is_deepest() {
        let mut inner = Node::mapping().with_line(2);
        inner.set("a", Node::string("1").with_line(7));
        let mut root = Node::mapping().with_line(1);
        root.set("spec", inner);
        assert_eq!(root.last_line(), 7);
    }

    #[test]
    fn remove_returns_value() {
        let mut root = sample();
        let removed = root.remove("kind").unwrap();
        assert_eq!(removed.as_str(), Some("Service"));
        assert!(root.remove("kind").is_none());
    }
}
