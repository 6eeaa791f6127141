//! Test-only runner and logger doubles.

use std::cell::RefCell;
use std::io;

use crate::core::error_finder::ErrorFinder;
use crate::io::runner::{CommandError, CommandRunner, CommandSpec};
use crate::io::step_log::StepLog;

/// How a scripted command ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedOutcome {
    Success,
    Exit(i32),
    /// The program could not be started.
    SpawnFailure,
}

/// Canned result for one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedRun {
    pub output: String,
    pub outcome: ScriptedOutcome,
}

impl ScriptedRun {
    pub fn success() -> Self {
        Self::success_with_output("")
    }

    pub fn success_with_output(output: &str) -> Self {
        Self {
            output: output.to_string(),
            outcome: ScriptedOutcome::Success,
        }
    }

    pub fn exit(code: i32, output: &str) -> Self {
        Self {
            output: output.to_string(),
            outcome: ScriptedOutcome::Exit(code),
        }
    }

    pub fn spawn_failure() -> Self {
        Self {
            output: String::new(),
            outcome: ScriptedOutcome::SpawnFailure,
        }
    }
}

/// Runner that records every command and replays scripted results.
///
/// Each scripted response is consumed by the first call whose argv matches
/// exactly. Calls without a matching response succeed with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: RefCell<Vec<(Vec<String>, ScriptedRun)>>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next call with exactly this argv.
    pub fn respond(self, argv: &[&str], run: ScriptedRun) -> Self {
        self.responses
            .borrow_mut()
            .push((argv.iter().map(|s| s.to_string()).collect(), run));
        self
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// Argv of every command run so far, in order.
    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.calls.borrow().iter().map(CommandSpec::argv).collect()
    }

    fn next_run(&self, spec: &CommandSpec) -> ScriptedRun {
        self.calls.borrow_mut().push(spec.clone());
        let argv = spec.argv();
        let mut responses = self.responses.borrow_mut();
        match responses.iter().position(|(expected, _)| *expected == argv) {
            Some(idx) => responses.remove(idx).1,
            None => ScriptedRun::success(),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(
        &self,
        spec: &CommandSpec,
        finder: Option<&mut dyn ErrorFinder>,
    ) -> Result<(), CommandError> {
        let run = self.next_run(spec);
        if run.outcome == ScriptedOutcome::SpawnFailure {
            return Err(spawn_error(spec));
        }
        let errors = finder
            .map(|finder| finder.find_errors(&run.output))
            .unwrap_or_default();
        match run.outcome {
            ScriptedOutcome::Exit(code) => Err(CommandError::Exit {
                command: spec.printable(),
                code: Some(code),
                errors,
            }),
            _ => Ok(()),
        }
    }

    fn output(&self, spec: &CommandSpec) -> Result<String, CommandError> {
        let run = self.next_run(spec);
        match run.outcome {
            ScriptedOutcome::Success => Ok(run.output),
            ScriptedOutcome::Exit(code) => Err(CommandError::Exit {
                command: spec.printable(),
                code: Some(code),
                errors: Vec::new(),
            }),
            ScriptedOutcome::SpawnFailure => Err(spawn_error(spec)),
        }
    }
}

fn spawn_error(spec: &CommandSpec) -> CommandError {
    CommandError::Spawn {
        command: spec.printable(),
        source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
    }
}

/// Style of a recorded log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Print,
    Done,
    Warn,
    Error,
}

/// Logger that keeps every line in memory.
#[derive(Debug, Default)]
pub struct RecordingLog {
    lines: RefCell<Vec<(LogLevel, String)>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.borrow().clone()
    }

    /// Messages logged at `level`, in order.
    pub fn at(&self, level: LogLevel) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    fn push(&self, level: LogLevel, msg: &str) {
        self.lines.borrow_mut().push((level, msg.to_string()));
    }
}

impl StepLog for RecordingLog {
    fn info(&self, msg: &str) {
        self.push(LogLevel::Info, msg);
    }

    fn print(&self, msg: &str) {
        self.push(LogLevel::Print, msg);
    }

    fn done(&self, msg: &str) {
        self.push(LogLevel::Done, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(LogLevel::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(LogLevel::Error, msg);
    }
}

/// Owned argv from string literals.
pub fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
