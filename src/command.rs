// src/command.rs

//! External command execution
//!
//! Every external tool (git, nix-prefetch-git, rosdep, nixfmt) is invoked
//! through a [`CommandRunner`], which turns a [`CommandSpec`] into either
//! captured output or [`Error::CommandFailed`]. Output parsing stays with
//! the caller; quoting never happens because no shell is involved.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// A command line to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    pub stdin: Option<String>,
}

impl CommandSpec {
    /// Create a command for the given program with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command in `dir`
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Feed `input` to the command's standard input
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Human readable command line, used in logs and errors
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn working_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Captured output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Standard output with surrounding whitespace removed
    pub fn trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Executes external commands
pub trait CommandRunner {
    /// Run `spec` to completion; a non-zero exit is [`Error::CommandFailed`]
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands as child processes of this one
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("Running: {}", spec.display());

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &spec.dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = cmd.spawn().map_err(|e| Error::CommandFailed {
            command: spec.display(),
            dir: spec.working_dir(),
            status: "not started".to_string(),
            stderr: e.to_string(),
        })?;

        // The child is reaped even when it stops reading its input early
        let written = match (&spec.stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => pipe.write_all(input.as_bytes()),
            _ => Ok(()),
        };

        let output = child.wait_with_output()?;
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: spec.display(),
                dir: spec.working_dir(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        written?;

        let stdout = String::from_utf8(output.stdout).map_err(|e| Error::InvalidCommandOutput {
            command: spec.display(),
            reason: e.to_string(),
        })?;

        Ok(CommandOutput { stdout, stderr })
    }
}
