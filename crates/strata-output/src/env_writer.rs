//! Name/value (env) writer
//!
//! Emits the `data` pairs of each document as shell variable assignments.
//! Secret values are base64-decoded; keys containing `.` and multi-line
//! values are treated as file content and skipped.

use crate::error::{OutputError, OutputResult};
use crate::quote::quote;
use crate::selector::LabelSelector;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use strata_document::ResourceDocument;
use strata_pipeline::{PipelineResult, Writer};

/// Output dialect for variable assignments
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Shell {
    /// `KEY=value`
    #[default]
    None,
    /// `set -gx KEY "value";`
    Fish,
    /// `export KEY="value"` (sh, bash, zsh, ...)
    Posix(String),
}

impl Shell {
    /// Shell named by the `SHELL` environment variable
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var("SHELL")
            .ok()
            .and_then(|shell| {
                Path::new(&shell)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .map_or(Self::None, Self::from)
    }

    fn assignment(&self, key: &str, value: &str, unset: bool) -> String {
        match (self, unset) {
            (Self::None, false) => format!("{key}={value}"),
            (Self::None, true) => format!("{key}="),
            (Self::Fish, false) => format!("set -gx {key} {};", quote(value)),
            (Self::Fish, true) => format!("set -e {key};"),
            (Self::Posix(_), false) => format!("export {key}={}", quote(value)),
            (Self::Posix(_), true) => format!("unset {key}"),
        }
    }
}

impl From<String> for Shell {
    fn from(name: String) -> Self {
        let name = name.to_lowercase();
        match name.as_str() {
            "" | "none" => Self::None,
            "fish" => Self::Fish,
            _ => Self::Posix(name),
        }
    }
}

impl From<Shell> for String {
    fn from(shell: Shell) -> Self {
        shell.to_string()
    }
}

impl FromStr for Shell {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Fish => f.write_str("fish"),
            Self::Posix(name) => f.write_str(name),
        }
    }
}

/// Writes configuration data as environment variable assignments
#[derive(Debug)]
pub struct EnvWriter<W: Write> {
    out: W,
    shell: Shell,
    unset: bool,
    selector: Option<String>,
}

impl<W: Write> EnvWriter<W> {
    /// Create writer using `KEY=value` lines
    #[inline]
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            shell: Shell::None,
            unset: false,
            selector: None,
        }
    }

    /// Set the output dialect
    #[inline]
    #[must_use]
    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    /// Emit unset commands instead of assignments
    #[inline]
    #[must_use]
    pub fn with_unset(mut self, unset: bool) -> Self {
        self.unset = unset;
        self
    }

    /// Only emit documents whose labels match
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        let selector = selector.into();
        self.selector = (!selector.is_empty()).then_some(selector);
        self
    }

    /// Release the sink
    #[inline]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Selector for this write; a malformed selector matches nothing
    fn selector(&self) -> Option<Result<LabelSelector, ()>> {
        let selector = self.selector.as_deref()?;
        Some(LabelSelector::parse(selector).map_err(|err| {
            tracing::warn!("ignoring documents for selector '{}': {}", selector, err);
        }))
    }

    /// Write documents, returning output errors unconverted
    ///
    /// # Errors
    /// `OutputError::Decode` for invalid Secret data, `OutputError::Io` for
    /// sink failures
    pub fn write_documents(&mut self, documents: &[ResourceDocument]) -> OutputResult<()> {
        let selector = self.selector();
        for document in documents {
            let selected = match &selector {
                None => true,
                Some(Ok(selector)) => selector.matches(&document.labels()),
                Some(Err(())) => false,
            };
            if !selected {
                continue;
            }

            let secret = document.kind() == Some("Secret");
            for (key, value) in document.data_map() {
                let value = if secret {
                    let bytes = STANDARD
                        .decode(value.as_bytes())
                        .map_err(|source| OutputError::Decode {
                            key: key.clone(),
                            source,
                        })?;
                    String::from_utf8_lossy(&bytes).into_owned()
                } else {
                    value
                };

                if key.contains('.') || value.contains(['\n', '\r']) {
                    continue;
                }
                writeln!(self.out, "{}", self.shell.assignment(&key, &value, self.unset))?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Writer for EnvWriter<W> {
    fn write(&mut self, documents: &mut [ResourceDocument]) -> PipelineResult<()> {
        Ok(self.write_documents(documents)?)
    }
}
