//! Error types for output writers
//!
//! Configuration errors (format specifier, columns, options, templates) are
//! reported before anything is written; per-document errors abort the write.

use strata_document::DocumentError;
use strata_pipeline::PipelineError;

/// Errors produced while configuring or running an output writer
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Format specifier names no known format
    #[error("unknown output format: '{0}'")]
    UnknownFormat(String),

    /// Column specifier could not be turned into a template
    #[error("invalid column '{column}' in '{spec}'")]
    InvalidColumn { spec: String, column: String },

    /// Template source failed to compile
    #[error("failed to compile template '{template}': {source}")]
    TemplateCompile {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    /// Template evaluation failed
    #[error("failed to render template: {0}")]
    TemplateRender(#[source] minijinja::Error),

    /// Secret value is not valid base64
    #[error("failed to decode value of '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: base64::DecodeError,
    },

    /// Document could not be assigned to a group
    #[error("failed to classify document {position}: {message}")]
    Classify { position: usize, message: String },

    /// Sink for a group could not be opened
    #[error("failed to open output for group '{group}': {source}")]
    Sink {
        group: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing to the sink failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failed
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Output options could not be parsed
    #[error("invalid output options: {0}")]
    Options(#[from] serde_yaml::Error),

    /// Annotation or serialization failure in the document layer
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl OutputError {
    /// Create classification error
    pub fn classify(position: usize, message: impl Into<String>) -> Self {
        Self::Classify {
            position,
            message: message.into(),
        }
    }

    /// Create sink error for a group
    pub fn sink(group: impl Into<String>, source: std::io::Error) -> Self {
        Self::Sink {
            group: group.into(),
            source,
        }
    }
}

impl From<OutputError> for PipelineError {
    fn from(err: OutputError) -> Self {
        PipelineError::output(err)
    }
}

/// Result alias for output operations
pub type OutputResult<T> = Result<T, OutputError>;
