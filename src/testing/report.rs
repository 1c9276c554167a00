//! Console narration of a test run
//!
//! Every line is written (and flushed) as soon as the event happens, so
//! the output order is the invocation order.

use std::io::{self, Write};

use colored::Colorize;

use super::discovery::TestCase;
use super::outcome::InvocationResult;

/// Width of the separator line
const SEPARATOR_WIDTH: usize = 50;

/// Pass/fail/error counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn record(&mut self, result: &InvocationResult) {
        match result {
            InvocationResult::Success => self.passed += 1,
            InvocationResult::NonZeroExit(_) => self.failed += 1,
            InvocationResult::LaunchError(_) | InvocationResult::Error(_) => self.errored += 1,
            InvocationResult::Interrupted => {}
        }
    }
}

/// Writes progress lines to any `io::Write`, normally stdout
pub struct Reporter<W: Write> {
    out: W,
}

impl Reporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.out, "{}", text)?;
        self.out.flush()
    }

    pub fn discovered(&mut self, count: usize) -> io::Result<()> {
        self.line(format!("Found {} test files", count))?;
        self.separator()
    }

    pub fn none_found(&mut self, searched: &str) -> io::Result<()> {
        self.line(format!("No test files found matching {}", searched).yellow())
    }

    pub fn separator(&mut self) -> io::Result<()> {
        self.line("-".repeat(SEPARATOR_WIDTH))
    }

    /// `index` is 1-based
    pub fn started(&mut self, index: usize, total: usize, case: &TestCase) -> io::Result<()> {
        self.line(format!("[{}/{}] Running: {}", index, total, case))
    }

    /// Report how a test ended, followed by a separator
    ///
    /// `Interrupted` is not reported here; see [`Reporter::interrupted`].
    pub fn finished(&mut self, case: &TestCase, result: &InvocationResult) -> io::Result<()> {
        let name = case.file_name();
        match result {
            InvocationResult::Success => {
                self.line(format!("✓ Completed: {}", name).green())?;
            }
            InvocationResult::NonZeroExit(code) => {
                self.line(format!("✗ Failed: {} (exit code: {})", name, code).red())?;
            }
            InvocationResult::LaunchError(cause) | InvocationResult::Error(cause) => {
                self.line(format!("✗ Error running {}: {}", name, cause).red())?;
            }
            InvocationResult::Interrupted => return Ok(()),
        }
        self.separator()
    }

    pub fn interrupted(&mut self, case: &TestCase) -> io::Result<()> {
        self.line("")?;
        self.line(format!("Interrupted at test: {}", case).yellow().bold())
    }

    pub fn completed(&mut self, summary: &RunSummary) -> io::Result<()> {
        self.line("All tests completed!".bold())?;
        self.line(format!(
            "{} passed, {} failed, {} errors",
            summary.passed, summary.failed, summary.errored
        ))
    }
}
