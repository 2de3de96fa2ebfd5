//! Vertical whitespace restoration
//!
//! The parser keeps comments but drops blank lines. Using the recorded source
//! lines, the blank lines above each top-level child are estimated and put
//! back as leading newlines of its head comment. Only one structural depth is
//! restored.

use strata_document::{Node, NodeValue, ResourceDocument};
use strata_pipeline::{Filter, PipelineResult};

/// Count of comment lines in a head or foot comment
fn comment_lines(comment: &str) -> i64 {
    i64::try_from(comment.matches('\n').count()).unwrap_or(i64::MAX)
}

/// Blank lines to insert before each direct child, as `(child, count)`
fn missing_blank_lines(root: &Node) -> Vec<(usize, usize)> {
    let children = root.children();
    let is_mapping = matches!(root.value, NodeValue::Mapping(_));
    let mut min_line = root.line;
    let mut result = Vec::new();

    for i in 1..children.len() {
        let (child, previous) = (children[i], children[i - 1]);
        if child.line == previous.line {
            continue;
        }

        let mut gap = child.line - 1;
        if !child.head_comment.is_empty() {
            gap -= comment_lines(&child.head_comment) + 1;
        }

        min_line = min_line.max(previous.last_line());
        gap -= min_line;

        // For mappings the foot comment sits on the key, two children back
        let mut foot = previous.foot_comment.as_str();
        if foot.is_empty() && is_mapping && i >= 2 {
            foot = children[i - 2].foot_comment.as_str();
        }
        if !foot.is_empty() {
            gap -= comment_lines(foot) + 2;
        }

        if let Ok(count) = usize::try_from(gap) {
            if count > 0 {
                result.push((i, count));
            }
        }
    }
    result
}

/// Restore blank lines between the top-level children of each document
pub fn restore_vertical_whitespace(documents: &mut [ResourceDocument]) {
    for document in documents {
        let gaps = missing_blank_lines(&document.root);
        if gaps.is_empty() {
            continue;
        }
        let mut children = document.root.children_mut();
        for (index, count) in gaps {
            let child = &mut children[index];
            child.head_comment = format!("{}{}", "\n".repeat(count), child.head_comment);
        }
    }
}

/// Filter form of [`restore_vertical_whitespace`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreWhitespace;

impl Filter for RestoreWhitespace {
    fn apply(&mut self, mut documents: Vec<ResourceDocument>) -> PipelineResult<Vec<ResourceDocument>> {
        restore_vertical_whitespace(&mut documents);
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strata_document::yaml;

    fn restore(input: &str) -> String {
        let mut documents = yaml::parse_documents(input).unwrap();
        restore_vertical_whitespace(&mut documents);
        yaml::to_string(&documents).unwrap()
    }

    #[test]
    fn restores_top_level_blank_lines() {
        let input = "apiVersion: v1\n\nkind: ConfigMap\n\n\ndata:\n  a: b\n";
        assert_eq!(restore(input), input);
    }

    #[test]
    fn accounts_for_head_comments() {
        let input = "a: 1\n\n# about b\nb: 2\n";
        assert_eq!(restore(input), input);
    }

    #[test]
    fn accounts_for_foot_comments() {
        let input = "a: 1\n# end of a\n\nb: 2\n";
        assert_eq!(restore(input), input);
    }

    #[test]
    fn accounts_for_nested_content() {
        let input = "metadata:\n  name: x\n  labels:\n    app: y\n\nspec: {}\n";
        assert_eq!(restore(input), input);
    }

    #[test]
    fn same_line_children_are_skipped() {
        let documents = yaml::parse_documents("a: 1\nb: 2\n").unwrap();
        assert!(missing_blank_lines(&documents[0].root).is_empty());
    }

    #[test]
    fn nested_blank_lines_are_not_restored() {
        let input = "spec:\n  a: 1\n\n  b: 2\n";
        assert_eq!(restore(input), "spec:\n  a: 1\n  b: 2\n");
    }

    #[test]
    fn filter_form() {
        let documents = yaml::parse_documents("a: 1\n\nb: 2\n").unwrap();
        let restored = RestoreWhitespace.apply(documents).unwrap();
        assert_eq!(restored[0].root.children()[2].head_comment, "\n");
    }
}
