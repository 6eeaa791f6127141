//! Human-readable build step output.
//!
//! This is the product output of the step (what a CI user reads in the build
//! log). Developer diagnostics go through `tracing` instead; see
//! [`crate::logging`].

use std::io::{self, Write};

use colored::Colorize;

/// Styled line sink for step progress.
pub trait StepLog {
    /// Section header, preceded by an empty line.
    fn info(&self, msg: &str);
    fn print(&self, msg: &str);
    fn done(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Writes coloured lines to stdout.
///
/// Colouring follows `colored`'s terminal and `NO_COLOR`/`CLICOLOR` detection.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLog;

#[derive(Debug, Clone, Copy)]
enum Style {
    Plain,
    Info,
    Done,
    Warn,
    Error,
}

fn render(style: Style, msg: &str) -> String {
    match style {
        Style::Plain => msg.to_string(),
        Style::Info => msg.blue().bold().to_string(),
        Style::Done => msg.green().bold().to_string(),
        Style::Warn => msg.yellow().bold().to_string(),
        Style::Error => msg.red().bold().to_string(),
    }
}

impl ConsoleLog {
    fn line(&self, style: Style, msg: &str) {
        let mut out = io::stdout().lock();
        // Broken stdout is not worth failing the step for.
        let _ = writeln!(out, "{}", render(style, msg)).and_then(|()| out.flush());
    }
}

impl StepLog for ConsoleLog {
    fn info(&self, msg: &str) {
        self.line(Style::Plain, "");
        self.line(Style::Info, msg);
    }

    fn print(&self, msg: &str) {
        self.line(Style::Plain, msg);
    }

    fn done(&self, msg: &str) {
        self.line(Style::Done, msg);
    }

    fn warn(&self, msg: &str) {
        self.line(Style::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.line(Style::Error, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_use_distinct_colours() {
        colored::control::set_override(true);
        let rendered: Vec<String> = [Style::Info, Style::Done, Style::Warn, Style::Error]
            .into_iter()
            .map(|style| render(style, "Installing Pods"))
            .collect();
        colored::control::unset_override();

        for line in &rendered {
            assert!(line.contains("Installing Pods"));
            assert!(line.starts_with("\x1b["));
        }
        for (idx, line) in rendered.iter().enumerate() {
            assert!(!rendered[idx + 1..].contains(line));
        }
        assert_eq!(render(Style::Plain, "- Verbose: false"), "- Verbose: false");
    }
}
