//! PSX test runner
//!
//! Runs every test executable under `./stuff/*_tests/` through the
//! emulator and prints a pass/fail line for each.

use psx_test_runner::cli;
use psx_test_runner::common::logging;

#[tokio::main]
async fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    logging::init_cli(args.verbose);

    // Individual test failures still exit 0; only setup problems are fatal
    match cli::run(args).await {
        Ok(status) => tracing::debug!(?status, "Run finished"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
