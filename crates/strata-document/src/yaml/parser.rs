//! YAML stream → documents
//!
//! Uses the `yaml-rust2` event parser so every node keeps the source line it
//! started on; comments are recovered afterwards by [`super::comments`].

use super::comments::{attach_comments, SourceLines};
use super::resolve::{resolve_plain, short_tag};
use crate::annotations::is_reader_annotation;
use crate::document::ResourceDocument;
use crate::error::{DocumentError, DocumentResult};
use crate::node::{Node, NodeValue, Scalar, ScalarStyle, STR_TAG, SYNTHETIC_LINE};
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

#[derive(Debug)]
struct Frame {
    node: Node,
    anchor: usize,
    pending_key: Option<Node>,
}

#[derive(Debug)]
struct ParsedDocument {
    root: Node,
    start_line: i64,
}

/// Builds node trees from parser events
#[derive(Debug, Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    anchors: HashMap<usize, Node>,
    documents: Vec<ParsedDocument>,
    document_start: i64,
    event_lines: Vec<i64>,
    multiline_scalars: Vec<i64>,
    error: Option<DocumentError>,
}

impl TreeBuilder {
    fn push_value(&mut self, node: Node) {
        let Some(frame) = self.stack.last_mut() else {
            let empty = node.as_scalar().is_some_and(Scalar::is_null);
            if !empty {
                self.documents.push(ParsedDocument {
                    root: node,
                    start_line: self.document_start,
                });
            }
            return;
        };

        match &mut frame.node.value {
            NodeValue::Sequence(items) => items.push(node),
            NodeValue::Mapping(pairs) => match frame.pending_key.take() {
                Some(key) => pairs.push((key, node)),
                None => frame.pending_key = Some(node),
            },
            NodeValue::Scalar(_) => {}
        }
    }

    fn open(&mut self, node: Node, anchor: usize) {
        self.stack.push(Frame {
            node,
            anchor,
            pending_key: None,
        });
    }

    fn close(&mut self) {
        if let Some(frame) = self.stack.pop() {
            if frame.anchor > 0 {
                self.anchors.insert(frame.anchor, frame.node.clone());
            }
            self.push_value(frame.node);
        }
    }

    fn scalar(&mut self, value: String, style: TScalarStyle, anchor: usize, tag: Option<String>, line: i64) {
        let style = match style {
            TScalarStyle::Plain => ScalarStyle::Plain,
            TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
            TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
            TScalarStyle::Literal => ScalarStyle::Literal,
            _ => ScalarStyle::Folded,
        };
        let tag = match tag {
            Some(tag) if tag != "!" => tag,
            Some(_) => STR_TAG.to_string(),
            None if style == ScalarStyle::Plain => resolve_plain(&value).to_string(),
            None => STR_TAG.to_string(),
        };
        if value.contains('\n') || matches!(style, ScalarStyle::Literal | ScalarStyle::Folded) {
            self.multiline_scalars.push(line);
        }

        let node = Node::new(NodeValue::Scalar(Scalar { value, tag, style })).with_line(line);
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        self.push_value(node);
    }

    /// Line ranges occupied by multi-line scalars (start line exclusive)
    fn covered_ranges(&self, last_line: i64) -> Vec<(i64, i64)> {
        self.multiline_scalars
            .iter()
            .map(|&start| {
                let next = self
                    .event_lines
                    .iter()
                    .copied()
                    .filter(|&l| l > start)
                    .min()
                    .unwrap_or(last_line + 1);
                (start + 1, next - 1)
            })
            .collect()
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, event: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        let line = i64::try_from(mark.line()).unwrap_or(SYNTHETIC_LINE);
        self.event_lines.push(line);

        match event {
            Event::DocumentStart { .. } => self.document_start = line,
            Event::Scalar(value, style, anchor, tag) => {
                let tag = tag.map(|t| short_tag(&t.handle, &t.suffix));
                self.scalar(value, style, anchor, tag, line);
            }
            Event::Alias(id) => match self.anchors.get(&id) {
                Some(node) => {
                    let node = node.clone().with_line(line);
                    self.push_value(node);
                }
                None => self.error = Some(DocumentError::UnknownAnchor { line }),
            },
            Event::SequenceStart(anchor, _) => {
                self.open(Node::sequence(Vec::new()).with_line(line), anchor);
            }
            Event::MappingStart(anchor, _) => self.open(Node::mapping().with_line(line), anchor),
            Event::SequenceEnd | Event::MappingEnd => self.close(),
            _ => {}
        }
    }
}

/// Parse a multi-document YAML stream
///
/// Empty documents are skipped. Reader annotations found in
/// `metadata.annotations` are moved to the annotation side-table.
///
/// # Errors
/// - `DocumentError::Parse` for malformed YAML
/// - `DocumentError::UnknownAnchor` for dangling aliases
pub fn parse_documents(input: &str) -> DocumentResult<Vec<ResourceDocument>> {
    let mut builder = TreeBuilder {
        document_start: 1,
        ..TreeBuilder::default()
    };
    let mut parser = Parser::new_from_str(input);
    parser
        .load(&mut builder, true)
        .map_err(|e| DocumentError::parse(e.to_string()))?;
    if let Some(err) = builder.error.take() {
        return Err(err);
    }

    let total = i64::try_from(input.lines().count()).unwrap_or(i64::MAX);
    let lines = SourceLines::scan(input, &builder.covered_ranges(total));

    let starts: Vec<i64> = builder.documents.iter().map(|d| d.start_line).collect();
    let documents = builder
        .documents
        .into_iter()
        .enumerate()
        .map(|(i, parsed)| {
            let start = if i == 0 { 1 } else { parsed.start_line };
            let end = starts.get(i + 1).copied().unwrap_or(lines.len() + 1);
            let mut root = parsed.root;
            attach_comments(&mut root, &lines, start, end);

            let mut document = ResourceDocument::new(root);
            document.lift_annotations(is_reader_annotation);
            document
        })
        .collect();
    Ok(documents)
}

/// Parse a byte buffer as a YAML stream
///
/// # Errors
/// `DocumentError::Utf8` for non UTF-8 input, otherwise as [`parse_documents`]
pub fn parse_bytes(input: &[u8]) -> DocumentResult<Vec<ResourceDocument>> {
    parse_documents(std::str::from_utf8(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{INDEX_ANNOTATION, PATH_ANNOTATION};
    use crate::node::{BOOL_TAG, INT_TAG, NULL_TAG};

    #[test]
    fn records_lines() {
        let docs = parse_documents("kind: Service\n\nmetadata:\n  name: web\n").unwrap();
        assert_eq!(docs.len(), 1);
        let children = docs[0].root.children();
        assert_eq!(children[0].line, 1);
        assert_eq!(children[2].line, 3);
        assert_eq!(docs[0].root.last_line(), 4);
    }

    #[test]
    fn resolves_scalar_tags() {
        let docs = parse_documents("a: 1\nb: '1'\nc: true\nd:\ne: text\n").unwrap();
        let root = &docs[0].root;
        let tag = |k: &str| root.get(k).and_then(Node::as_scalar).map(|s| s.tag.clone());
        assert_eq!(tag("a").as_deref(), Some(INT_TAG));
        assert_eq!(tag("b").as_deref(), Some(STR_TAG));
        assert_eq!(tag("c").as_deref(), Some(BOOL_TAG));
        assert_eq!(tag("d").as_deref(), Some(NULL_TAG));
        assert_eq!(tag("e").as_deref(), Some(STR_TAG));
    }

    #[test]
    fn multiple_documents_skip_empty() {
        let docs = parse_documents("a: 1\n---\n---\nb: 2\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(parse_documents("").unwrap().len(), 0);
    }

    #[test]
    fn aliases_are_resolved() {
        let docs = parse_documents("base: &b\n  x: 1\ncopy: *b\n").unwrap();
        assert_eq!(
            docs[0].root.get_path(&["copy", "x"]).and_then(Node::as_str),
            Some("1")
        );
    }

    #[test]
    fn head_and_foot_comments() {
        let input = "# top\na: 1\n# foot of a\n\nb: 2\n";
        let docs = parse_documents(input).unwrap();
        let children = docs[0].root.children();
        assert_eq!(children[0].head_comment, "# top");
        assert_eq!(children[0].foot_comment, "# foot of a");
        assert_eq!(children[2].head_comment, "");
    }

    #[test]
    fn comments_inside_block_scalars_are_content() {
        let input = "script: |\n  # not a comment\n  echo hi\nnext: 1\n";
        let docs = parse_documents(input).unwrap();
        let root = &docs[0].root;
        assert_eq!(
            root.get("script").and_then(Node::as_str),
            Some("# not a comment\necho hi\n")
        );
        assert_eq!(root.children()[2].head_comment, "");
    }

    #[test]
    fn reader_annotations_are_lifted() {
        let input = "kind: ConfigMap\nmetadata:\n  name: a\n  annotations:\n    config.kubernetes.io/path: a.yaml\n    config.kubernetes.io/index: '0'\n";
        let docs = parse_documents(input).unwrap();
        assert_eq!(docs[0].annotation(PATH_ANNOTATION), Some("a.yaml"));
        assert_eq!(docs[0].annotation(INDEX_ANNOTATION), Some("0"));
        assert!(docs[0].root.get_path(&["metadata", "annotations"]).is_none());
        assert_eq!(docs[0].name(), Some("a"));
    }

    #[test]
    fn malformed_input_fails() {
        let err = parse_documents("a: [1, 2\n").unwrap_err();
        assert!(matches!(err, DocumentError::Parse { .. }));
    }
}
