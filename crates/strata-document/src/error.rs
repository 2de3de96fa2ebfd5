//! Error types for the document model
//!
//! Covers:
//! - YAML stream parsing (bytes → documents)
//! - Annotation side-table operations
//! - Serialization (documents → bytes)

/// Errors produced while parsing, annotating or emitting documents
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Input could not be parsed as a YAML stream
    #[error("yaml parse error: {message}")]
    Parse { message: String },

    /// Input is not valid UTF-8
    #[error("input is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// An alias refers to an anchor that was never defined
    #[error("unknown anchor referenced at line {line}")]
    UnknownAnchor { line: i64 },

    /// Annotation key is not a qualified name
    #[error("invalid annotation key '{key}': {reason}")]
    InvalidAnnotationKey { key: String, reason: String },

    /// Index annotation does not hold an integer
    #[error("invalid index annotation '{value}' on document {position}")]
    InvalidIndex { value: String, position: usize },

    /// Writing the serialized output failed
    #[error("io error while emitting: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    /// Create parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create invalid annotation key error
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAnnotationKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = DocumentError::parse("mapping values are not allowed");
        assert_eq!(
            err.to_string(),
            "yaml parse error: mapping values are not allowed"
        );
    }

    #[test]
    fn invalid_key_display() {
        let err = DocumentError::invalid_key("bad key", "name part must be alphanumeric");
        assert!(err.to_string().contains("'bad key'"));
    }
}
