//! Output options
//!
//! Serializable configuration for [`crate::FormatWriter`], loadable from YAML.

use crate::env_writer::Shell;
use crate::error::OutputResult;
use serde::{Deserialize, Serialize};

/// Configuration of a format-dispatching writer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputOptions {
    /// Format specifier, `<name>[=<argument>]`
    pub format: String,
    /// Keep reader annotations in the output
    pub keep_reader_annotations: bool,
    /// Additional annotations to strip
    pub clear_annotations: Vec<String>,
    /// Sort by origin before writing
    pub sort: bool,
    /// Restore blank lines before writing YAML
    pub restore_vertical_whitespace: bool,
    /// Dialect for the `env` format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<Shell>,
    /// Emit unset commands for the `env` format
    pub unset: bool,
    /// Label selector for the `env` format
    pub selector: String,
}

impl OutputOptions {
    /// Create options for a format specifier
    #[inline]
    #[must_use]
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            ..Self::default()
        }
    }

    /// Load options from a YAML document
    ///
    /// # Errors
    /// `OutputError::Options` for malformed input
    pub fn from_yaml(input: &str) -> OutputResult<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Keep reader annotations
    #[inline]
    #[must_use]
    pub fn with_keep_reader_annotations(mut self, keep: bool) -> Self {
        self.keep_reader_annotations = keep;
        self
    }

    /// Strip additional annotations
    #[inline]
    #[must_use]
    pub fn with_clear_annotations(mut self, keys: Vec<String>) -> Self {
        self.clear_annotations = keys;
        self
    }

    /// Sort before writing
    #[inline]
    #[must_use]
    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    /// Restore blank lines before writing YAML
    #[inline]
    #[must_use]
    pub fn with_restore_vertical_whitespace(mut self, restore: bool) -> Self {
        self.restore_vertical_whitespace = restore;
        self
    }

    /// Set the `env` dialect
    #[inline]
    #[must_use]
    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = Some(shell);
        self
    }

    /// Emit unset commands
    #[inline]
    #[must_use]
    pub fn with_unset(mut self, unset: bool) -> Self {
        self.unset = unset;
        self
    }

    /// Filter `env` output by labels
    #[inline]
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OutputError;
    use pretty_assertions::assert_eq;

    #[test]
    fn loads_from_yaml() {
        let options = OutputOptions::from_yaml(
            "format: env\nshell: fish\nunset: true\nselector: app=web\nclearAnnotations:\n- example.com/owner\n",
        )
        .unwrap();
        assert_eq!(
            options,
            OutputOptions::new("env")
                .with_shell(Shell::Fish)
                .with_unset(true)
                .with_selector("app=web")
                .with_clear_annotations(vec!["example.com/owner".into()])
        );
    }

    #[test]
    fn missing_fields_default() {
        let options = OutputOptions::from_yaml("sort: true\n").unwrap();
        assert_eq!(options, OutputOptions::default().with_sort(true));
        assert!(options.format.is_empty());
    }

    #[test]
    fn malformed_options_fail() {
        let err = OutputOptions::from_yaml("sort: [1\n").unwrap_err();
        assert!(matches!(err, OutputError::Options(_)));
    }

    #[test]
    fn serializes_shell_by_name() {
        let text = serde_yaml::to_string(&OutputOptions::new("env").with_shell(Shell::Posix("zsh".into()))).unwrap();
        assert!(text.contains("shell: zsh"));
    }
}
