//! CLI run handling
//!
//! Merges command-line flags with the config file, discovers the tests,
//! and hands them to the harness.

use std::time::Duration;

use crate::commands::{RunArgs, USAGE};
use crate::common::config::{Config, EmulatorConfig};
use crate::common::{Error, Result};
use crate::testing::{
    run_all, EmulatorCommand, Interrupt, Pattern, Reporter, RunConfiguration, RunStatus,
    SystemRunner,
};

/// Parse process arguments
///
/// `--help` and `--version` print and exit 0 here. Every other parse
/// failure becomes `Error::Usage`, which the binary turns into exit code 1.
pub fn parse_args() -> Result<RunArgs> {
    use clap::error::ErrorKind;
    use clap::Parser;

    RunArgs::try_parse().map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        _ => Error::Usage(format!("{}\n\n{}", USAGE, e.render())),
    })
}

/// Run the whole suite as described by `args`
///
/// Test failures are reported, not returned: the result is `Ok` however
/// many tests fail.
pub async fn run(args: RunArgs) -> Result<RunStatus> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let emulator = emulator_command(&args, &config.emulator);
    let root = args.tests_root.clone().unwrap_or(config.discovery.root);
    let patterns = parse_patterns(if args.patterns.is_empty() {
        &config.discovery.patterns
    } else {
        &args.patterns
    })?;
    let timeout = match args.timeout.or(config.run.timeout_secs) {
        Some(0) => {
            return Err(Error::Config("timeout_secs must be at least 1".to_string()));
        }
        secs => secs.map(Duration::from_secs),
    };

    tracing::debug!(
        emulator = %emulator.program.display(),
        root = %root.display(),
        ?timeout,
        "Resolved run settings"
    );

    let run_config = RunConfiguration::discover(args.firmware, emulator, &root, &patterns);
    let runner = SystemRunner::with_timeout(timeout);
    let interrupt = Interrupt::on_ctrl_c();
    let mut reporter = Reporter::stdout();

    run_all(&run_config, &runner, &interrupt, &mut reporter).await
}

/// Pick the emulator program and its leading arguments
///
/// An explicit `--emulator` never inherits the configured leading args,
/// which are specific to the configured program.
fn emulator_command(args: &RunArgs, config: &EmulatorConfig) -> EmulatorCommand {
    let (program, leading) = match &args.emulator {
        Some(program) => (program.clone(), args.emulator_args.clone()),
        None if args.emulator_args.is_empty() => (config.program.clone(), config.args.clone()),
        None => (config.program.clone(), args.emulator_args.clone()),
    };
    EmulatorCommand::new(Config::resolve_program(&program)).with_leading_args(leading)
}

fn parse_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    if patterns.is_empty() {
        return Err(Error::Config("At least one test pattern is required".to_string()));
    }
    patterns.iter().map(|p| Pattern::parse(p)).collect()
}
