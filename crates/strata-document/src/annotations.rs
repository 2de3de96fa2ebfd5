//! Reader annotations and positional ordering
//!
//! Readers record where each document came from in the annotation side-table.
//! Writers use the same keys to restore the original order (see
//! [`sort_documents`]) and to regroup documents by origin.

use crate::document::ResourceDocument;
use crate::error::{DocumentError, DocumentResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// Origin file path of a document
pub const PATH_ANNOTATION: &str = "config.kubernetes.io/path";

/// Position of a document within its origin file
pub const INDEX_ANNOTATION: &str = "config.kubernetes.io/index";

/// Identity of a document assigned by a reader
pub const ID_ANNOTATION: &str = "config.kubernetes.io/id";

/// Reader-managed keys lifted out of `metadata.annotations` while parsing
pub const READER_ANNOTATIONS: [&str; 3] = [PATH_ANNOTATION, INDEX_ANNOTATION, ID_ANNOTATION];

/// Prefix of internal reader keys, all of which are lifted
pub const INTERNAL_ANNOTATION_PREFIX: &str = "internal.config.kubernetes.io/";

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("valid regex"));

static PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid regex")
});

/// Validate an annotation key as a qualified name (`[prefix/]name`)
///
/// # Errors
/// `DocumentError::InvalidAnnotationKey` describing the first violation
pub fn validate_key(key: &str) -> DocumentResult<()> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        if prefix.is_empty() || prefix.len() > 253 || !PREFIX_RE.is_match(prefix) {
            return Err(DocumentError::invalid_key(
                key,
                "prefix must be a DNS subdomain",
            ));
        }
    }

    if name.is_empty() || name.len() > 63 {
        return Err(DocumentError::invalid_key(
            key,
            "name part must be 1-63 characters",
        ));
    }
    if !NAME_RE.is_match(name) {
        return Err(DocumentError::invalid_key(
            key,
            "name part must be alphanumeric with '-', '_' or '.' inside",
        ));
    }
    Ok(())
}

/// Check if a key is one of the reader-managed annotations
#[inline]
#[must_use]
pub fn is_reader_annotation(key: &str) -> bool {
    READER_ANNOTATIONS.contains(&key) || key.starts_with(INTERNAL_ANNOTATION_PREFIX)
}

/// Origin path and index of a document (empty strings when absent)
#[must_use]
pub fn file_annotations(document: &ResourceDocument) -> (String, String) {
    let path = document.annotation(PATH_ANNOTATION).unwrap_or_default();
    let index = document.annotation(INDEX_ANNOTATION).unwrap_or_default();
    (path.to_string(), index.to_string())
}

/// Sort documents by their reader annotations
///
/// Stable sort on (path, numeric index). Documents without annotations sort
/// as an empty path with index 0. Only the order changes.
///
/// # Errors
/// `DocumentError::InvalidIndex` if an index annotation is not an integer
pub fn sort_documents(documents: &mut [ResourceDocument]) -> DocumentResult<()> {
    let mut keys = Vec::with_capacity(documents.len());
    for (position, document) in documents.iter().enumerate() {
        let (path, index) = file_annotations(document);
        let index = if index.is_empty() {
            0
        } else {
            index
                .trim()
                .parse::<i64>()
                .map_err(|_| DocumentError::InvalidIndex {
                    value: index.clone(),
                    position,
                })?
        };
        keys.push((path, index, position));
    }

    // Reorder through a permutation so documents are moved, not cloned
    keys.sort();
    let mut slots: Vec<Option<ResourceDocument>> = documents
        .iter_mut()
        .map(|d| Some(std::mem::take(d)))
        .collect();
    for (target, (_, _, source)) in keys.into_iter().enumerate() {
        if let Some(document) = slots[source].take() {
            documents[target] = document;
        }
    }
    Ok(())
}
