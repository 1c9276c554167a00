//! Classification of a finished invocation

use super::process::ExitOutcome;

/// Reportable result of running one test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationResult {
    /// Emulator exited with code 0
    Success,
    /// Emulator ran but exited with a nonzero code.
    /// Signal deaths use the negated signal number.
    NonZeroExit(i32),
    /// Emulator could not be started
    LaunchError(String),
    /// Anything else that went wrong while waiting on the emulator
    Error(String),
    /// The operator stopped the run while this test was in flight
    Interrupted,
}

/// Map a process exit to a pass/fail/error result
pub fn classify(outcome: ExitOutcome) -> InvocationResult {
    match outcome {
        ExitOutcome::Exited(0) => InvocationResult::Success,
        ExitOutcome::Exited(code) => InvocationResult::NonZeroExit(code),
        ExitOutcome::Signaled(signal) => InvocationResult::NonZeroExit(-signal),
        ExitOutcome::LaunchFailed(cause) => InvocationResult::LaunchError(cause),
        ExitOutcome::WaitFailed(cause) => InvocationResult::Error(cause),
        ExitOutcome::TimedOut(limit) => {
            InvocationResult::Error(format!("timed out after {}s", limit.as_secs_f64()))
        }
    }
}
