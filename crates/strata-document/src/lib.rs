//! Strata Document Model
//!
//! Parsed resource documents with the formatting metadata needed to write
//! them back faithfully.
//!
//! # Core Concepts
//!
//! - [`Node`]: one tree element with source line and head/foot comments
//! - [`ResourceDocument`]: a tree plus an annotation side-table
//! - [`yaml`]: multi-document YAML parsing and emission
//! - [`json`]: tag-aware conversion to `serde_json` values
//! - [`sort_documents`]: the positional order shared by every sorting writer
//!
//! # Example
//!
//! ```rust
//! use strata_document::{yaml, PATH_ANNOTATION};
//!
//! let mut docs = yaml::parse_documents("kind: ConfigMap\nmetadata:\n  name: app\n").unwrap();
//! docs[0].set_annotation(PATH_ANNOTATION, "app.yaml");
//! assert_eq!(docs[0].name(), Some("app"));
//! ```

mod annotations;
mod document;
mod error;
mod node;

pub mod json;
pub mod yaml;

pub use annotations::{
    file_annotations, is_reader_annotation, sort_documents, validate_key, ID_ANNOTATION,
    INDEX_ANNOTATION, INTERNAL_ANNOTATION_PREFIX, PATH_ANNOTATION, READER_ANNOTATIONS,
};
pub use document::ResourceDocument;
pub use error::{DocumentError, DocumentResult};
pub use node::{
    Node, NodeValue, Scalar, ScalarStyle, BOOL_TAG, FLOAT_TAG, INT_TAG, NULL_TAG, STR_TAG,
    SYNTHETIC_LINE,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
