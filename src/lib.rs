//! PSX test runner - runs a directory of test executables through the emulator
//!
//! Every discovered test executable is passed to the emulator together
//! with a BIOS image, one at a time, and the emulator's exit code decides
//! pass or fail.

pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{InvocationResult, ProcessRunner, RunStatus, TestCase};
