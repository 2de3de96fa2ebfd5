//! External program stages
//!
//! [`CommandReader`] decodes the standard output of a program as a YAML
//! stream; [`CommandWriter`] feeds the sequence to a program's standard
//! input. Both report a failing exit status with the program's cleaned
//! standard error.

use crate::error::{PipelineError, PipelineResult};
use crate::traits::{Reader, Writer};
use std::ffi::OsStr;
use std::fmt;
use std::io::{self, Write as _};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::sync::Arc;
use strata_document::{yaml, ResourceDocument};

/// Runs a prepared command and returns its captured output
pub type Executor = Arc<dyn Fn(&mut Command) -> io::Result<Output> + Send + Sync>;

/// Base configuration for program stages
#[derive(Clone, Default)]
pub struct Runtime {
    /// Program overriding the stage's default
    pub bin: Option<String>,
    /// Replaces [`Command::output`] when set
    pub executor: Option<Executor>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("bin", &self.bin)
            .field("executor", &self.executor.is_some())
            .finish()
    }
}

impl Runtime {
    /// Create default runtime
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the program
    #[inline]
    #[must_use]
    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = Some(bin.into());
        self
    }

    /// Use a custom executor
    #[must_use]
    pub fn with_executor<F>(mut self, executor: F) -> Self
    where
        F: Fn(&mut Command) -> io::Result<Output> + Send + Sync + 'static,
    {
        self.executor = Some(Arc::new(executor));
        self
    }

    fn program<'a>(&'a self, default_bin: &'a str) -> &'a str {
        self.bin.as_deref().filter(|bin| !bin.is_empty()).unwrap_or(default_bin)
    }

    /// Reader running `bin` (or `default_bin`)
    #[must_use]
    pub fn command(&self, default_bin: &str) -> CommandReader {
        CommandReader {
            command: Command::new(self.program(default_bin)),
            executor: self.executor.clone(),
        }
    }

    /// Writer piping documents into `bin` (or `default_bin`)
    #[must_use]
    pub fn writer(&self, default_bin: &str) -> CommandWriter {
        CommandWriter {
            command: Command::new(self.program(default_bin)),
        }
    }
}

/// Base file name of the program, used in error messages
fn program_name(command: &Command) -> String {
    let program = command.get_program();
    Path::new(program)
        .file_name()
        .unwrap_or(program)
        .to_string_lossy()
        .into_owned()
}

/// Reader decoding a program's standard output
pub struct CommandReader {
    command: Command,
    executor: Option<Executor>,
}

impl fmt::Debug for CommandReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandReader")
            .field("command", &self.command)
            .field("executor", &self.executor.is_some())
            .finish()
    }
}

impl CommandReader {
    /// Append an argument
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.command.arg(arg);
        self
    }

    /// Append arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    /// Set an environment variable for the program
    #[must_use]
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.command.env(key, value);
        self
    }

    /// Underlying command
    #[inline]
    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Mutable access for settings not covered by the builder methods
    #[inline]
    pub fn command_mut(&mut self) -> &mut Command {
        &mut self.command
    }

    /// Run the program and capture its output
    ///
    /// # Errors
    /// `PipelineError::Spawn` when the program cannot be run,
    /// `PipelineError::Command` when it exits unsuccessfully
    pub fn output(&mut self) -> PipelineResult<Output> {
        let program = program_name(&self.command);
        tracing::debug!("running {}", program);

        let output = match &self.executor {
            Some(executor) => executor(&mut self.command),
            None => self.command.output(),
        }
        .map_err(|source| PipelineError::Spawn {
            program: program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(PipelineError::command(program, output.status, &output.stderr));
        }
        Ok(output)
    }
}

impl Reader for CommandReader {
    fn read(&mut self) -> PipelineResult<Vec<ResourceDocument>> {
        let output = self.output()?;
        Ok(yaml::parse_bytes(&output.stdout)?)
    }
}

/// Writer feeding documents to a program's standard input
#[derive(Debug)]
pub struct CommandWriter {
    command: Command,
}

impl CommandWriter {
    /// Create writer for the supplied command
    #[inline]
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self { command }
    }

    /// Append arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }
}

impl Writer for CommandWriter {
    fn write(&mut self, documents: &mut [ResourceDocument]) -> PipelineResult<()> {
        let program = program_name(&self.command);
        let mut input = Vec::new();
        yaml::write_documents(&mut input, documents)?;

        let spawn_error = |source| PipelineError::Spawn {
            program: program.clone(),
            source,
        };
        let mut child = self
            .command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Stdin is fed from its own thread while stdout and stderr drain
        // A program may exit before reading everything; its status decides
        let stdin = child.stdin.take();
        let input = &input;
        let (written, output) = std::thread::scope(|scope| {
            let feeder = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(input),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = feeder
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (written, output)
        });
        let output = output.map_err(spawn_error)?;
        if !output.status.success() {
            return Err(PipelineError::command(program, output.status, &output.stderr));
        }
        written.map_err(spawn_error)?;

        tracing::debug!("piped {} documents to {}", documents.len(), program);
        Ok(())
    }
}
