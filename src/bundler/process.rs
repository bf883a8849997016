//! External tool invocation.
//!
//! Every pipeline step shells out to a macOS or Python tool. Steps describe
//! the invocation as a [`ToolCommand`] and hand it to a [`CommandRunner`],
//! which lets the whole pipeline run against a recording runner in tests.

use crate::bundler::error::{Error, Result};
use std::{
    fmt,
    future::Future,
    path::{Path, PathBuf},
    process::Stdio,
};

/// A single external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    capture: bool,
}

impl ToolCommand {
    /// Create a new invocation of `program`.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
            capture: false,
        }
    }

    /// Create an invocation of an executable given by path.
    pub fn from_path(program: &Path) -> Self {
        Self::new(program.to_string_lossy())
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Capture stdout/stderr instead of streaming them to the terminal.
    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn is_captured(&self) -> bool {
        self.capture
    }

    /// File name of the program, e.g. `python` for `venv/bin/python`.
    pub fn program_name(&self) -> &str {
        Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.program)
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of a tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Whether the tool exited successfully.
    pub success: bool,
    /// Captured stdout (empty unless the command was captured).
    pub stdout: String,
    /// Captured stderr (empty unless the command was captured).
    pub stderr: String,
}

impl CommandOutput {
    /// A successful exit with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed exit with the given code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Executes [`ToolCommand`]s.
///
/// A runner reports how the tool exited. Deciding whether a non-zero exit is
/// fatal is left to the caller (see [`run_checked`]).
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion.
    ///
    /// Returns `Err` only when the tool could not be spawned.
    fn run(&self, command: &ToolCommand) -> impl Future<Output = Result<CommandOutput>> + Send;
}

/// Runs tools as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, command: &ToolCommand) -> Result<CommandOutput> {
        log::debug!("Running: {}", command);

        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args).stdin(Stdio::null());

        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }

        if command.capture {
            let output = cmd.output().await.map_err(|error| Error::CommandFailed {
                command: command.to_string(),
                error,
            })?;

            Ok(CommandOutput {
                code: output.status.code(),
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = cmd
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .map_err(|error| Error::CommandFailed {
                    command: command.to_string(),
                    error,
                })?;

            Ok(CommandOutput {
                code: status.code(),
                success: status.success(),
                ..Default::default()
            })
        }
    }
}

/// Run a command and turn an unsuccessful exit into [`Error::ToolFailed`].
pub async fn run_checked<R: CommandRunner>(
    runner: &R,
    command: ToolCommand,
) -> Result<CommandOutput> {
    let output = runner.run(&command).await?;

    if !output.success {
        return Err(Error::ToolFailed {
            command: command.to_string(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }

    Ok(output)
}
