//! Command execution seam.
//!
//! The [`CommandRunner`] trait decouples the installer from process spawning.
//! [`SystemRunner`] runs real subprocesses; tests use the scripted runner in
//! `test_support`, which records every command without spawning anything.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Result, anyhow};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::core::args::printable_command;
use crate::core::error_finder::ErrorFinder;
use crate::io::process::{spawn_piped, wait_with_tee};
use crate::io::step_log::StepLog;

/// A program, its arguments and the directory to run it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
}

impl CommandSpec {
    /// Split an argument vector into program and arguments.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| anyhow!("empty command"))?;
        Ok(Self {
            program: program.clone(),
            args: rest.to_vec(),
            workdir: None,
        })
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    pub fn printable(&self) -> String {
        printable_command(&self.argv())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.printable())
    }
}

/// Failure of a single command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The process could not be started (missing binary, permissions).
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    /// The process ran and exited unsuccessfully.
    #[error("`{command}` {}{}", exit_description(.code), error_lines(.errors))]
    Exit {
        command: String,
        code: Option<i32>,
        /// Diagnostic lines pulled out of the output by the attached finder.
        errors: Vec<String>,
    },
    /// Waiting for the process or reading its output failed.
    #[error("failed to collect output of `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl CommandError {
    /// Classified output lines, empty unless the command exited unsuccessfully.
    pub fn errors(&self) -> &[String] {
        match self {
            CommandError::Exit { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

fn error_lines(errors: &[String]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(":\n{}", errors.join("\n"))
    }
}

/// Abstraction over subprocess execution.
pub trait CommandRunner {
    /// Run a command, mirroring its output to this process's stdout/stderr.
    ///
    /// When a finder is attached it sees the complete combined output once the
    /// command exits; on failure its lines are attached to
    /// [`CommandError::Exit`].
    fn run(
        &self,
        spec: &CommandSpec,
        finder: Option<&mut dyn ErrorFinder>,
    ) -> Result<(), CommandError>;

    /// Run a command silently and return its combined output.
    ///
    /// A non-zero exit is an error.
    fn output(&self, spec: &CommandSpec) -> Result<String, CommandError>;
}

/// Echo `$ <command>` to the step log, then run it.
pub fn run_echoed<R, L>(
    runner: &R,
    log: &L,
    spec: &CommandSpec,
    finder: Option<&mut dyn ErrorFinder>,
) -> Result<(), CommandError>
where
    R: CommandRunner + ?Sized,
    L: StepLog + ?Sized,
{
    log.done(&format!("$ {spec}"));
    runner.run(spec, finder)
}

/// Runner that spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn execute(&self, spec: &CommandSpec, mirror: bool) -> Result<(String, Option<i32>, bool), CommandError> {
        let command = spec.printable();
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = non_empty_dir(spec.workdir.as_deref()) {
            cmd.current_dir(dir);
        }

        let child = spawn_piped(&mut cmd).map_err(|source| {
            warn!(err = %source, command = %command, "failed to spawn command");
            CommandError::Spawn {
                command: command.clone(),
                source,
            }
        })?;
        let output = wait_with_tee(child, mirror).map_err(|source| CommandError::Wait {
            command: command.clone(),
            source,
        })?;
        Ok((output.combined, output.status.code(), output.status.success()))
    }
}

fn non_empty_dir(dir: Option<&Path>) -> Option<&Path> {
    dir.filter(|dir| !dir.as_os_str().is_empty())
}

impl CommandRunner for SystemRunner {
    #[instrument(skip_all, fields(command = %spec))]
    fn run(
        &self,
        spec: &CommandSpec,
        finder: Option<&mut dyn ErrorFinder>,
    ) -> Result<(), CommandError> {
        let (combined, code, success) = self.execute(spec, true)?;
        let errors = finder
            .map(|finder| finder.find_errors(&combined))
            .unwrap_or_default();
        if success {
            debug!("command succeeded");
            return Ok(());
        }
        warn!(exit_code = ?code, error_lines = errors.len(), "command failed");
        Err(CommandError::Exit {
            command: spec.printable(),
            code,
            errors,
        })
    }

    #[instrument(skip_all, fields(command = %spec))]
    fn output(&self, spec: &CommandSpec) -> Result<String, CommandError> {
        let (combined, code, success) = self.execute(spec, false)?;
        if success {
            Ok(combined)
        } else {
            Err(CommandError::Exit {
                command: spec.printable(),
                code,
                errors: Vec::new(),
            })
        }
    }
}
