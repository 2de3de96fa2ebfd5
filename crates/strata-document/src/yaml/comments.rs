//! Comment recovery
//!
//! The event parser drops comments, so they are recovered from the source
//! text and attached by line number: a comment block directly above a mapping
//! key or sequence item becomes its head comment; a block followed by a blank
//! line becomes the foot comment of the previous sibling. A comment trailing
//! content becomes the line comment of the last scalar starting on that line.

use crate::node::{Node, NodeValue};

/// Classification of one source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineKind {
    Blank,
    Comment(String),
    Content,
    /// Content followed by a comment
    Trailing(String),
}

/// Classified source lines, addressed by 1-based line number
#[derive(Debug, Clone, Default)]
pub(crate) struct SourceLines {
    lines: Vec<LineKind>,
}

impl SourceLines {
    /// Classify every line; `covered` lines belong to multi-line scalars
    pub(crate) fn scan(input: &str, covered: &[(i64, i64)]) -> Self {
        let lines = input
            .lines()
            .enumerate()
            .map(|(i, raw)| {
                let number = i64::try_from(i).map_or(i64::MAX, |n| n + 1);
                let trimmed = raw.trim();
                if covered.iter().any(|&(s, e)| number >= s && number <= e) {
                    LineKind::Content
                } else if trimmed.is_empty() {
                    LineKind::Blank
                } else if trimmed.starts_with('#') {
                    LineKind::Comment(trimmed.to_string())
                } else {
                    trailing_comment(raw).map_or(LineKind::Content, LineKind::Trailing)
                }
            })
            .collect();
        Self { lines }
    }

    /// Number of lines
    pub(crate) fn len(&self) -> i64 {
        i64::try_from(self.lines.len()).unwrap_or(i64::MAX)
    }

    fn get(&self, line: i64) -> Option<&LineKind> {
        usize::try_from(line - 1).ok().and_then(|i| self.lines.get(i))
    }

    /// Maximal runs of comment lines within `[start, end)`
    fn blocks(&self, start: i64, end: i64) -> Vec<CommentBlock> {
        let mut blocks = Vec::new();
        let mut current: Option<CommentBlock> = None;
        for line in start..end {
            match self.get(line) {
                Some(LineKind::Comment(text)) => match current.as_mut() {
                    Some(block) => {
                        block.last = line;
                        block.text.push('\n');
                        block.text.push_str(text);
                    }
                    None => {
                        current = Some(CommentBlock {
                            first: line,
                            last: line,
                            text: text.clone(),
                        });
                    }
                },
                _ => blocks.extend(current.take()),
            }
        }
        blocks.extend(current);
        blocks
    }
}

/// Comment text after the content of a line, ignoring `#` inside quotes
/// and `#` not preceded by whitespace
fn trailing_comment(raw: &str) -> Option<String> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut previous = ' ';
    for (i, c) in raw.char_indices() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None if c == '#' && previous.is_whitespace() => {
                return Some(raw[i..].trim_end().to_string());
            }
            None if matches!(c, '"' | '\'')
                && (previous.is_whitespace() || matches!(previous, ':' | '-' | '?' | ',' | '[' | '{')) =>
            {
                quote = Some(c);
            }
            None => {}
        }
        previous = c;
    }
    None
}

#[derive(Debug)]
struct CommentBlock {
    first: i64,
    last: i64,
    text: String,
}

/// A node comments can attach to: a mapping key or a sequence item
#[derive(Debug, Clone)]
struct Anchor {
    line: i64,
    depth: usize,
    path: Vec<usize>,
    previous: Option<Vec<usize>>,
}

fn collect_anchors(node: &Node, path: &mut Vec<usize>, depth: usize, out: &mut Vec<Anchor>) {
    match &node.value {
        NodeValue::Mapping(pairs) => {
            for (i, (key, value)) in pairs.iter().enumerate() {
                let key_index = i * 2;
                out.push(anchor(path, key_index, key.line, depth, 2));
                path.push(key_index + 1);
                collect_anchors(value, path, depth + 1, out);
                path.pop();
            }
        }
        NodeValue::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                out.push(anchor(path, i, item.line, depth, 1));
                path.push(i);
                collect_anchors(item, path, depth + 1, out);
                path.pop();
            }
        }
        NodeValue::Scalar(_) => {}
    }
}

fn anchor(parent: &[usize], index: usize, line: i64, depth: usize, step: usize) -> Anchor {
    let mut path = parent.to_vec();
    path.push(index);
    let previous = index.checked_sub(step).map(|prev| {
        let mut p = parent.to_vec();
        p.push(prev);
        p
    });
    Anchor {
        line,
        depth,
        path,
        previous,
    }
}

/// Scalars in document order (keys before their values), with their paths
fn collect_scalars(node: &Node, path: &mut Vec<usize>, out: &mut Vec<(i64, Vec<usize>)>) {
    if node.as_scalar().is_some() {
        out.push((node.line, path.clone()));
        return;
    }
    for (i, child) in node.children().into_iter().enumerate() {
        path.push(i);
        collect_scalars(child, path, out);
        path.pop();
    }
}

fn node_at_mut<'a>(root: &'a mut Node, path: &[usize]) -> Option<&'a mut Node> {
    let mut node = root;
    for &index in path {
        node = node.child_mut(index)?;
    }
    Some(node)
}

fn append(target: &mut String, text: &str) {
    if !target.is_empty() {
        target.push('\n');
    }
    target.push_str(text);
}

/// Attach the comment blocks found in `[start, end)` to `root`
pub(crate) fn attach_comments(root: &mut Node, lines: &SourceLines, start: i64, end: i64) {
    let mut anchors = Vec::new();
    collect_anchors(root, &mut Vec::new(), 0, &mut anchors);
    anchors.retain(|a| a.line >= start);

    for block in lines.blocks(start, end) {
        let next = anchors
            .iter()
            .filter(|a| a.line > block.last)
            .min_by_key(|a| (a.line, a.depth));

        let (path, head) = match next {
            Some(next) if next.line == block.last + 1 => (next.path.clone(), true),
            Some(next) => match &next.previous {
                Some(previous) => (previous.clone(), false),
                None => (next.path.clone(), true),
            },
            None => match anchors
                .iter()
                .filter(|a| a.depth == 0 && a.line < block.first)
                .max_by_key(|a| a.line)
            {
                Some(last) => (last.path.clone(), false),
                None => (Vec::new(), false),
            },
        };

        if let Some(node) = node_at_mut(root, &path) {
            if head {
                append(&mut node.head_comment, &block.text);
            } else {
                append(&mut node.foot_comment, &block.text);
            }
        }
    }

    let mut scalars = Vec::new();
    collect_scalars(root, &mut Vec::new(), &mut scalars);
    for line in start..end {
        let Some(LineKind::Trailing(text)) = lines.get(line) else {
            continue;
        };
        let target = scalars.iter().rev().find(|(l, _)| *l == line);
        if let Some(node) = target.and_then(|(_, path)| node_at_mut(root, path)) {
            append(&mut node.line_comment, text);
        }
    }
}
