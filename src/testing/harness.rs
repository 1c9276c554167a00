//! Sequential test run
//!
//! Tests run one at a time in discovery order. Per-test faults are
//! reported inline and never stop the queue; only an operator interrupt
//! ends the loop early.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::common::Result;

use super::discovery::{discover, TestCase};
use super::interrupt::Interrupt;
use super::outcome::{classify, InvocationResult};
use super::pattern::Pattern;
use super::process::{EmulatorCommand, ProcessRunner};
use super::report::{Reporter, RunSummary};

/// Everything a run needs, fixed before the first test starts
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    /// Boot image passed to every invocation. Never checked here.
    pub firmware: PathBuf,
    pub emulator: EmulatorCommand,
    /// Tests in the order they will run
    pub tests: Vec<TestCase>,
    /// Human-readable description of where tests were looked for
    pub searched: String,
}

impl RunConfiguration {
    /// Build a configuration by discovering tests under `root`
    pub fn discover(
        firmware: PathBuf,
        emulator: EmulatorCommand,
        root: &Path,
        patterns: &[Pattern],
    ) -> Self {
        let searched = patterns
            .iter()
            .map(|p| root.join(p.as_str().trim_start_matches("./")).display().to_string())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            firmware,
            emulator,
            tests: discover(root, patterns),
            searched,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Discovery found nothing; no emulator was started
    NoTests,
    /// Every test ran
    Completed(RunSummary),
    /// The operator stopped the run at `at` (1-based)
    Interrupted {
        at: usize,
        test: TestCase,
        summary: RunSummary,
    },
}

/// Run every configured test and narrate the results
///
/// Only failures to write the report are returned as errors.
pub async fn run_all<R, W>(
    config: &RunConfiguration,
    runner: &R,
    interrupt: &Interrupt,
    reporter: &mut Reporter<W>,
) -> Result<RunStatus>
where
    R: ProcessRunner + ?Sized,
    W: Write,
{
    if config.tests.is_empty() {
        reporter.none_found(&config.searched)?;
        return Ok(RunStatus::NoTests);
    }

    let total = config.tests.len();
    tracing::info!(total, firmware = %config.firmware.display(), "Starting test run");
    reporter.discovered(total)?;

    let mut summary = RunSummary::default();

    for (i, case) in config.tests.iter().enumerate() {
        let index = i + 1;

        let result = if interrupt.is_triggered() {
            InvocationResult::Interrupted
        } else {
            reporter.started(index, total, case)?;
            tokio::select! {
                biased;
                _ = interrupt.triggered() => InvocationResult::Interrupted,
                outcome = config.emulator.invoke(runner, &config.firmware, case.path()) => {
                    classify(outcome)
                }
            }
        };

        if result == InvocationResult::Interrupted {
            tracing::warn!(index, test = %case, "Run interrupted");
            reporter.interrupted(case)?;
            return Ok(RunStatus::Interrupted {
                at: index,
                test: case.clone(),
                summary,
            });
        }

        tracing::debug!(index, test = %case, ?result, "Test finished");
        summary.record(&result);
        reporter.finished(case, &result)?;
    }

    reporter.completed(&summary)?;
    Ok(RunStatus::Completed(summary))
}
