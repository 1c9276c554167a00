//! Test discovery, emulator invocation and reporting
//!
//! Discovery produces an ordered list of test executables; the harness
//! runs the emulator once per test, strictly one at a time, classifies
//! each exit and narrates it through the reporter.

mod discovery;
mod harness;
mod interrupt;
mod outcome;
mod pattern;
mod process;
mod report;

pub use discovery::{discover, TestCase};
pub use harness::{run_all, RunConfiguration, RunStatus};
pub use interrupt::{Interrupt, InterruptHandle};
pub use outcome::{classify, InvocationResult};
pub use pattern::{Pattern, Segment};
pub use process::{EmulatorCommand, ExitOutcome, ProcessRunner, SystemRunner};
pub use report::{Reporter, RunSummary};
