//! Pipeline error types
//!
//! Command failures carry the cleaned stderr of the failing program; output
//! stage errors from other crates are boxed into [`PipelineError::Output`].

use std::path::PathBuf;
use std::process::ExitStatus;
use strata_document::DocumentError;

/// Errors produced while running a pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// External program exited unsuccessfully
    #[error("{program} {status}: {message}")]
    Command {
        program: String,
        status: ExitStatus,
        message: String,
    },

    /// External program could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Local file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document parsing or annotation failure
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Filter rejected the sequence
    #[error("filter failed: {0}")]
    Filter(String),

    /// Writer stage failure
    #[error(transparent)]
    Output(Box<dyn std::error::Error + Send + Sync>),
}

impl PipelineError {
    /// Create command failure from captured stderr
    ///
    /// The message is trimmed and a leading `Error: ` is removed.
    pub fn command(program: impl Into<String>, status: ExitStatus, stderr: &[u8]) -> Self {
        let message = String::from_utf8_lossy(stderr);
        let message = message.trim();
        let message = message.strip_prefix("Error: ").unwrap_or(message);
        Self::Command {
            program: program.into(),
            status,
            message: message.to_string(),
        }
    }

    /// Create filter error
    pub fn filter(message: impl Into<String>) -> Self {
        Self::Filter(message.into())
    }

    /// Box a writer error
    pub fn output(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Output(Box::new(err))
    }
}

/// Result alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn command_message_is_cleaned() {
        let status = ExitStatus::from_raw(1 << 8);
        let err = PipelineError::command("helm", status, b"  Error: chart not found\n");
        let PipelineError::Command { message, .. } = &err else {
            panic!("expected command error");
        };
        assert_eq!(message, "chart not found");
        assert_eq!(err.to_string(), "helm exit status: 1: chart not found");
    }

    #[test]
    fn only_leading_prefix_is_removed() {
        let status = ExitStatus::from_raw(2 << 8);
        let err = PipelineError::command("kustomize", status, b"fatal: Error: nested");
        assert!(err.to_string().ends_with(": fatal: Error: nested"));
    }
}
