//! CLI argument definitions
//!
//! Defines the clap arguments for the test runner.

use clap::Parser;
use std::path::PathBuf;

/// Usage line shown when the firmware argument is missing or repeated
pub const USAGE: &str = "Usage: run-tests <path/to/bios>";

#[derive(Parser, Debug)]
#[command(
    name = "run-tests",
    about = "Run every test executable through the emulator and report pass/fail"
)]
#[command(version, long_about = None)]
pub struct RunArgs {
    /// BIOS image passed to the emulator for every test
    pub firmware: PathBuf,

    /// Emulator program to run instead of the configured one
    #[arg(long, value_name = "PROGRAM")]
    pub emulator: Option<PathBuf>,

    /// Argument placed before the BIOS and test paths (repeatable)
    #[arg(long = "emulator-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub emulator_args: Vec<String>,

    /// Directory the test patterns are relative to
    #[arg(long, value_name = "DIR")]
    pub tests_root: Option<PathBuf>,

    /// Test file pattern, e.g. '*_tests/*.exe' (repeatable, replaces the defaults)
    #[arg(long = "pattern", value_name = "GLOB")]
    pub patterns: Vec<String>,

    /// Kill any test running longer than this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Configuration file (default: platform config dir)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log debug diagnostics to stderr
    #[arg(long, short)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_single_positional() {
        let args = RunArgs::try_parse_from(["run-tests", "/fw.bin"]).unwrap();
        assert_eq!(args.firmware, PathBuf::from("/fw.bin"));
        assert!(args.emulator.is_none());
        assert!(args.patterns.is_empty());
        assert!(args.timeout.is_none());
    }

    #[test]
    fn test_missing_firmware_is_rejected() {
        let err = RunArgs::try_parse_from(["run-tests"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_extra_positional_is_rejected() {
        assert!(RunArgs::try_parse_from(["run-tests", "a.bin", "b.bin"]).is_err());
    }

    #[test]
    fn test_emulator_args_accept_hyphens() {
        let args = RunArgs::try_parse_from([
            "run-tests",
            "--emulator",
            "cargo",
            "--emulator-arg",
            "run",
            "--emulator-arg",
            "--release",
            "bios.bin",
        ])
        .unwrap();
        assert_eq!(args.emulator_args, vec!["run", "--release"]);
        assert_eq!(args.firmware, PathBuf::from("bios.bin"));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        assert!(RunArgs::try_parse_from(["run-tests", "--timeout", "0", "bios.bin"]).is_err());
    }
}
