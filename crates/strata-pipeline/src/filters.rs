//! Built-in filters

use crate::error::PipelineResult;
use crate::traits::Filter;
use strata_document::ResourceDocument;

/// Removes annotations from every document
///
/// Keys that are absent are ignored; a malformed key fails the filter.
#[derive(Debug, Clone, Default)]
pub struct ClearAnnotations {
    keys: Vec<String>,
}

impl ClearAnnotations {
    /// Create filter removing the supplied keys
    #[must_use]
    pub fn new<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Filter for ClearAnnotations {
    fn apply(&mut self, mut documents: Vec<ResourceDocument>) -> PipelineResult<Vec<ResourceDocument>> {
        for document in &mut documents {
            for key in &self.keys {
                document.clear_annotation(key)?;
            }
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_document::{Node, INDEX_ANNOTATION, PATH_ANNOTATION};

    #[test]
    fn clears_listed_keys_only() {
        let document = ResourceDocument::new(Node::mapping())
            .with_annotation(PATH_ANNOTATION, "a.yaml")
            .with_annotation(INDEX_ANNOTATION, "0");
        let documents = ClearAnnotations::new([INDEX_ANNOTATION, "example.com/absent"])
            .apply(vec![document])
            .unwrap();
        assert_eq!(documents[0].annotation(INDEX_ANNOTATION), None);
        assert_eq!(documents[0].annotation(PATH_ANNOTATION), Some("a.yaml"));
    }

    #[test]
    fn malformed_key_fails() {
        let result = ClearAnnotations::new(["bad key"]).apply(vec![ResourceDocument::default()]);
        assert!(result.is_err());
    }
}
