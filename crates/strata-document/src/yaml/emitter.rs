//! Documents → YAML stream
//!
//! Block style with two-space indentation and compact sequences. Head
//! comments render before their node (leading newlines become blank lines),
//! line comments at the end of its line, foot comments after it.

use super::resolve::is_core_tag;
use crate::document::ResourceDocument;
use crate::error::DocumentResult;
use crate::node::{Node, NodeValue, Scalar, ScalarStyle, STR_TAG};
use std::io::{self, Write};

/// Write documents as a YAML stream, `---` between documents
///
/// # Errors
/// `DocumentError::Io` if the sink fails
pub fn write_documents<W: Write>(writer: &mut W, documents: &[ResourceDocument]) -> DocumentResult<()> {
    let mut emitter = Emitter { out: writer };
    for (i, document) in documents.iter().enumerate() {
        if i > 0 {
            emitter.out.write_all(b"---\n")?;
        }
        emitter.document(&document.to_node())?;
    }
    Ok(())
}

/// Render documents to a YAML string
///
/// # Errors
/// Same as [`write_documents`]
pub fn to_string(documents: &[ResourceDocument]) -> DocumentResult<String> {
    let mut buffer = Vec::new();
    write_documents(&mut buffer, documents)?;
    Ok(String::from_utf8(buffer).map_err(|e| e.utf8_error())?)
}

struct Emitter<'w, W: Write> {
    out: &'w mut W,
}

impl<W: Write> Emitter<'_, W> {
    fn document(&mut self, root: &Node) -> io::Result<()> {
        self.head(&root.head_comment, 0)?;
        match &root.value {
            NodeValue::Mapping(pairs) if !pairs.is_empty() => self.mapping(pairs, 0, false)?,
            NodeValue::Sequence(items) if !items.is_empty() => self.sequence(items, 0)?,
            NodeValue::Mapping(_) => self.out.write_all(b"{}\n")?,
            NodeValue::Sequence(_) => self.out.write_all(b"[]\n")?,
            NodeValue::Scalar(scalar) => {
                let text = inline_scalar(scalar);
                if scalar.value.contains('\n') && text.starts_with('|') {
                    self.block_scalar(&text, &scalar.value, 0, &root.line_comment)?;
                } else {
                    writeln!(self.out, "{text}{}", trailing(&root.line_comment))?;
                }
            }
        }
        self.comment_lines(&root.foot_comment, 0)
    }

    fn mapping(&mut self, pairs: &[(Node, Node)], indent: usize, first_inline: bool) -> io::Result<()> {
        let pad = " ".repeat(indent);
        for (i, (key, value)) in pairs.iter().enumerate() {
            if !(i == 0 && first_inline) {
                self.head(&key.head_comment, indent)?;
                self.out.write_all(pad.as_bytes())?;
            }
            match simple_key(key) {
                Some(text) => {
                    write!(self.out, "{text}:")?;
                    self.value(value, indent, &key.line_comment)?;
                }
                None => {
                    self.out.write_all(b"?")?;
                    self.item_body(key, indent)?;
                    write!(self.out, "{pad}:")?;
                    self.item_body(value, indent)?;
                }
            }

            if !key.foot_comment.is_empty() {
                self.comment_lines(&key.foot_comment, indent)?;
                if i + 1 < pairs.len() {
                    writeln!(self.out)?;
                }
            }
        }
        Ok(())
    }

    fn sequence(&mut self, items: &[Node], indent: usize) -> io::Result<()> {
        let pad = " ".repeat(indent);
        for (i, item) in items.iter().enumerate() {
            self.head(&item.head_comment, indent)?;
            write!(self.out, "{pad}-")?;
            self.item_body(item, indent)?;

            if !item.foot_comment.is_empty() {
                self.comment_lines(&item.foot_comment, indent)?;
                if i + 1 < items.len() {
                    writeln!(self.out)?;
                }
            }
        }
        Ok(())
    }

    /// Everything after a `-`, `?` or `:` indicator, nested content indented
    /// past `indent`
    fn item_body(&mut self, node: &Node, indent: usize) -> io::Result<()> {
        match &node.value {
            NodeValue::Mapping(pairs) if !pairs.is_empty() => {
                let (first, _) = &pairs[0];
                if simple_key(first).is_some() && first.head_comment.is_empty() {
                    self.out.write_all(b" ")?;
                    self.mapping(pairs, indent + 2, true)
                } else {
                    writeln!(self.out)?;
                    self.mapping(pairs, indent + 2, false)
                }
            }
            NodeValue::Sequence(nested) if !nested.is_empty() => {
                writeln!(self.out)?;
                self.sequence(nested, indent + 2)
            }
            NodeValue::Mapping(_) => writeln!(self.out, " {{}}{}", trailing(&node.line_comment)),
            NodeValue::Sequence(_) => writeln!(self.out, " []{}", trailing(&node.line_comment)),
            NodeValue::Scalar(scalar) => self.scalar_value(scalar, indent + 2, &node.line_comment),
        }
    }

    /// Everything after `key:`; a comment on the key moves behind the value
    fn value(&mut self, value: &Node, indent: usize, key_comment: &str) -> io::Result<()> {
        let suffix = trailing(key_comment);
        match &value.value {
            NodeValue::Mapping(pairs) if !pairs.is_empty() => {
                writeln!(self.out, "{suffix}")?;
                self.head(&value.head_comment, indent + 2)?;
                self.mapping(pairs, indent + 2, false)
            }
            NodeValue::Sequence(items) if !items.is_empty() => {
                writeln!(self.out, "{suffix}")?;
                self.head(&value.head_comment, indent)?;
                self.sequence(items, indent)
            }
            NodeValue::Mapping(_) => writeln!(self.out, " {{}}{suffix}"),
            NodeValue::Sequence(_) => writeln!(self.out, " []{suffix}"),
            NodeValue::Scalar(scalar) => {
                let comment = if value.line_comment.is_empty() {
                    key_comment
                } else {
                    &value.line_comment
                };
                self.scalar_value(scalar, indent + 2, comment)
            }
        }
    }

    /// Scalar after `key:` or `-`, block content indented by `indent`
    fn scalar_value(&mut self, scalar: &Scalar, indent: usize, comment: &str) -> io::Result<()> {
        let text = inline_scalar(scalar);
        if text.is_empty() {
            return writeln!(self.out, "{}", trailing(comment));
        }
        if text.starts_with('|') {
            write!(self.out, " ")?;
            return self.block_scalar(&text, &scalar.value, indent, comment);
        }
        writeln!(self.out, " {text}{}", trailing(comment))
    }

    fn block_scalar(&mut self, header: &str, value: &str, indent: usize, comment: &str) -> io::Result<()> {
        writeln!(self.out, "{header}{}", trailing(comment))?;
        let pad = " ".repeat(indent);
        let body = match header {
            "|" | "|+" => &value[..value.len() - 1],
            _ => value,
        };
        for line in body.split('\n') {
            if line.is_empty() {
                writeln!(self.out)?;
            } else {
                writeln!(self.out, "{pad}{line}")?;
            }
        }
        Ok(())
    }

    fn head(&mut self, comment: &str, indent: usize) -> io::Result<()> {
        let text = comment.trim_start_matches('\n');
        for _ in 0..comment.len() - text.len() {
            writeln!(self.out)?;
        }
        self.comment_lines(text, indent)
    }

    fn comment_lines(&mut self, text: &str, indent: usize) -> io::Result<()> {
        let pad = " ".repeat(indent);
        for line in text.lines() {
            if line.is_empty() {
                writeln!(self.out)?;
            } else {
                writeln!(self.out, "{pad}{line}")?;
            }
        }
        Ok(())
    }
}

/// Inline text of a key that fits before `:`, `None` for keys needing the
/// explicit `?` form
fn simple_key(key: &Node) -> Option<String> {
    match &key.value {
        NodeValue::Scalar(scalar) => Some(inline_scalar(scalar)).filter(|text| !text.starts_with('|')),
        _ => None,
    }
}

fn trailing(comment: &str) -> String {
    if comment.is_empty() {
        String::new()
    } else {
        format!(" {comment}")
    }
}

/// Single-line rendering of a scalar, or a block header (`|`, `|-`, `|+`)
/// for multi-line strings
fn inline_scalar(scalar: &Scalar) -> String {
    let value = &scalar.value;
    if scalar.tag != STR_TAG && is_core_tag(&scalar.tag) {
        return value.clone();
    }

    let text = if value.contains('\n') {
        block_header(value).map_or_else(|| json_quoted(value), str::to_string)
    } else {
        match scalar.style {
            ScalarStyle::DoubleQuoted => json_quoted(value),
            ScalarStyle::SingleQuoted => format!("'{}'", value.replace('\'', "''")),
            _ => plain_or_quoted(value),
        }
    };

    if is_core_tag(&scalar.tag) {
        text
    } else if text.starts_with('|') {
        format!("{} {}", scalar.tag, json_quoted(value))
    } else {
        format!("{} {text}", scalar.tag)
    }
}

fn block_header(value: &str) -> Option<&'static str> {
    if value.starts_with(' ') || value.contains('\r') {
        return None;
    }
    Some(if value.ends_with("\n\n") {
        "|+"
    } else if value.ends_with('\n') {
        "|"
    } else {
        "|-"
    })
}

fn json_quoted(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

/// Plain text unless it would re-resolve to another type or needs escaping
fn plain_or_quoted(value: &str) -> String {
    match serde_yaml::to_string(&serde_yaml::Value::String(value.to_string())) {
        Ok(text) => {
            let text = text.trim_end_matches('\n');
            if text.contains('\n') {
                json_quoted(value)
            } else {
                text.to_string()
            }
        }
        Err(_) => json_quoted(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::parser::parse_documents;
    use pretty_assertions::assert_eq;

    fn round_trip(input: &str) -> String {
        to_string(&parse_documents(input).unwrap()).unwrap()
    }

    #[test]
    fn block_mapping_and_sequence() {
        let input = "kind: Deployment\nspec:\n  replicas: 3\n  ports:\n  - name: http\n    port: 80\n  - 443\n";
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn documents_are_separated() {
        assert_eq!(round_trip("a: 1\n---\nb: 2\n"), "a: 1\n---\nb: 2\n");
    }

    #[test]
    fn quoting_is_preserved() {
        let input = "a: 'single'\nb: \"double\"\nc: '42'\nd: plain\ne:\n";
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn ambiguous_strings_are_quoted() {
        let mut root = Node::mapping();
        root.set("version", Node::string("1.0"));
        root.set("enabled", Node::string("true"));
        let text = to_string(&[ResourceDocument::new(root)]).unwrap();
        assert_eq!(text, "version: '1.0'\nenabled: 'true'\n");
    }

    #[test]
    fn literal_blocks_keep_chomping() {
        let input = "clip: |\n  a\n  b\nstrip: |-\n  a\nkeep: |+\n  a\n\nnext: 1\n";
        let docs = parse_documents(input).unwrap();
        let root = &docs[0].root;
        assert_eq!(root.get("clip").and_then(Node::as_str), Some("a\nb\n"));
        assert_eq!(root.get("strip").and_then(Node::as_str), Some("a"));
        assert_eq!(root.get("keep").and_then(Node::as_str), Some("a\n\n"));
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn comments_render_around_nodes() {
        let input = "# head\na: 1\n# foot\n\nb: 2\n";
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn blank_line_head_comments() {
        let mut root = Node::mapping();
        root.set("a", Node::string("x"));
        root.set("b", Node::string("y"));
        if let NodeValue::Mapping(pairs) = &mut root.value {
            pairs[1].0.head_comment = "\n\n# note".to_string();
        }
        let text = to_string(&[ResourceDocument::new(root)]).unwrap();
        assert_eq!(text, "a: x\n\n\n# note\nb: y\n");
    }

    #[test]
    fn empty_collections_use_flow_style() {
        let mut root = Node::mapping();
        root.set("labels", Node::mapping());
        root.set("items", Node::sequence(Vec::new()));
        let text = to_string(&[ResourceDocument::new(root)]).unwrap();
        assert_eq!(text, "labels: {}\nitems: []\n");
    }

    #[test]
    fn line_comments_follow_values() {
        let input = "a: 1 # one\nb: # map\n  c: | # block\n    x\n    y\nd:\n- e # item\n";
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn collection_keys_use_explicit_form() {
        let mut key = Node::mapping();
        key.set("x", Node::string("y"));
        let root = Node::new(NodeValue::Mapping(vec![(key, Node::string("v"))]));
        let text = to_string(&[ResourceDocument::new(root)]).unwrap();
        assert_eq!(text, "? x: y\n: v\n");
    }

    #[test]
    fn custom_tags_are_kept() {
        assert_eq!(round_trip("secret: !vault abc\n"), "secret: !vault abc\n");
    }
}
