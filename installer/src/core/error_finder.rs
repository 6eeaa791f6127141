//! Line classification of CocoaPods output.
//!
//! Pulls out the lines worth surfacing when a pod command fails and notices
//! curl's retryable network warnings. Matching is literal and anchored at the
//! start of the line; leading whitespace is not trimmed.

use std::io::BufRead;

use tracing::debug;

/// Structural CocoaPods error marker.
pub const POD_ERROR_PREFIX: &str = "[!] ";
/// Error line printed by curl when a download fails.
pub const CURL_ERROR_PREFIX: &str = "curl: ";
/// Warning printed by curl before it retries a download (HTTP 502/504 and friends).
pub const TRANSIENT_PROBLEM_PREFIX: &str = "Warning: Transient problem: ";
/// Entry recorded in place of the first transient warning.
pub const TRANSIENT_PROBLEM: &str = "Transient problem";

/// Extracts diagnostic lines from the combined output of one command.
pub trait ErrorFinder {
    fn find_errors(&mut self, output: &str) -> Vec<String>;
}

/// Classifier for a single pod invocation.
///
/// Create a new value for every command run; the transient flag accumulates
/// and would otherwise hide a warning from a later, unrelated run.
#[derive(Debug, Default)]
pub struct CocoapodsErrorFinder {
    transient_problem_seen: bool,
}

impl CocoapodsErrorFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a `Warning: Transient problem: ` line has been seen.
    pub fn transient_problem_seen(&self) -> bool {
        self.transient_problem_seen
    }

    /// Classify lines read from `reader`.
    ///
    /// A read error yields an empty result: no diagnostics are available, which
    /// is not a failure by itself.
    pub fn find_errors_in<R: BufRead>(&mut self, reader: R) -> Vec<String> {
        let mut errors = Vec::new();
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    debug!(err = %err, "failed to read command output, dropping diagnostics");
                    return Vec::new();
                }
            };

            if line.starts_with(POD_ERROR_PREFIX) || line.starts_with(CURL_ERROR_PREFIX) {
                errors.push(line);
            } else if line.starts_with(TRANSIENT_PROBLEM_PREFIX) && !self.transient_problem_seen {
                self.transient_problem_seen = true;
                errors.push(TRANSIENT_PROBLEM.to_string());
            }
        }
        errors
    }
}

impl ErrorFinder for CocoapodsErrorFinder {
    fn find_errors(&mut self, output: &str) -> Vec<String> {
        self.find_errors_in(output.as_bytes())
    }
}
