//! End-to-end tests for the `run-tests` binary
//!
//! These tests verify the complete run by:
//! 1. Laying out a fake `stuff/*_tests/` tree in a temp directory
//! 2. Using a shell script as the emulator, which logs its arguments
//! 3. Checking the console narration, the exit code and the invocation log

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Test context with paths and cleanup
struct TestContext {
    /// Temporary directory used as the working directory
    temp_dir: tempfile::TempDir,
    /// Empty config file so the user's own config is never picked up
    config_file: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config_file = temp_dir.path().join("config.toml");
        fs::write(&config_file, "").expect("Failed to write config");
        Self {
            temp_dir,
            config_file,
        }
    }

    fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a test executable at `stuff/<rel>`
    fn add_test(&self, rel: &str) {
        let path = self.root().join("stuff").join(rel);
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create test dir");
        fs::write(path, b"PS-X EXE").expect("Failed to write test");
    }

    fn log_path(&self) -> PathBuf {
        self.root().join("invocations.log")
    }

    /// Write a fake emulator that logs `<firmware>|<test>` and fails tests
    /// whose name contains "fail" with exit code 3
    #[cfg(unix)]
    fn fake_emulator(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = self.root().join("fake-emu.sh");
        let content = format!(
            r#"#!/bin/sh
echo "$1|$2" >> "{log}"
echo "emulator stdout noise"
echo "emulator stderr noise" >&2
case "$2" in
  *fail*) exit 3 ;;
esac
exit 0
"#,
            log = self.log_path().display()
        );
        fs::write(&script, content).expect("Failed to write fake emulator");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod fake emulator");
        script
    }

    /// Run the harness with the given arguments
    fn run(&self, args: &[&str]) -> RunOutput {
        let output = Command::new(env!("CARGO_BIN_EXE_run-tests"))
            .args(args)
            .current_dir(self.root())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run run-tests");

        RunOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
        }
    }

    /// Run with the isolated config and an explicit emulator
    fn run_with_emulator(&self, emulator: &Path, firmware: &str) -> RunOutput {
        self.run(&[
            "--config",
            self.config_file.to_str().unwrap(),
            "--emulator",
            emulator.to_str().unwrap(),
            firmware,
        ])
    }

    fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Output from a run-tests invocation
#[derive(Debug)]
struct RunOutput {
    stdout: String,
    stderr: String,
    code: Option<i32>,
}

#[test]
fn test_missing_firmware_argument_is_usage_error() {
    let ctx = TestContext::new();
    let output = ctx.run(&[]);

    assert_eq!(output.code, Some(1), "{:?}", output);
    assert!(output.stderr.contains("Usage: run-tests <path/to/bios>"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_extra_argument_is_usage_error() {
    let ctx = TestContext::new();
    ctx.add_test("cpu_tests/a.exe");
    let output = ctx.run(&["bios.bin", "other.bin"]);

    assert_eq!(output.code, Some(1), "{:?}", output);
    assert!(output.stderr.contains("Usage: run-tests <path/to/bios>"));
    assert!(!output.stdout.contains("Running:"));
}

#[test]
fn test_help_exits_zero() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert_eq!(output.code, Some(0));
    assert!(output.stdout.contains("run-tests"));
}

#[test]
fn test_no_tests_found_exits_zero() {
    let ctx = TestContext::new();
    let output = ctx.run_with_emulator(Path::new("/nonexistent/emulator"), "/fw.bin");

    assert_eq!(output.code, Some(0), "{:?}", output);
    assert!(output.stdout.contains("No test files found matching"));
    assert!(output.stdout.contains("*_tests/*.exe"));
    assert!(!output.stdout.contains("All tests completed!"));
}

#[test]
fn test_missing_emulator_reports_errors_and_continues() {
    let ctx = TestContext::new();
    ctx.add_test("cpu_tests/a.exe");
    ctx.add_test("cpu_tests/b.exe");

    let output = ctx.run_with_emulator(Path::new("/nonexistent/emulator"), "/fw.bin");

    assert_eq!(output.code, Some(0), "{:?}", output);
    assert!(output.stdout.contains("✗ Error running a.exe:"));
    assert!(output.stdout.contains("✗ Error running b.exe:"));
    assert!(output.stdout.contains("All tests completed!"));
    assert!(output.stdout.contains("0 passed, 0 failed, 2 errors"));
}

#[cfg(unix)]
#[test]
fn test_full_run_with_fake_emulator() {
    let ctx = TestContext::new();
    ctx.add_test("gte_tests/c.exe");
    ctx.add_test("cpu_tests/b_fail.EXE");
    ctx.add_test("cpu_tests/a.exe");
    ctx.add_test("cpu_tests/notes.txt");
    ctx.add_test("cpu_tests/nested/deep.exe");
    let emulator = ctx.fake_emulator();

    let output = ctx.run_with_emulator(&emulator, "/fw.bin");

    // Failing tests never change the exit code
    assert_eq!(output.code, Some(0), "{:?}", output);

    assert_eq!(
        ctx.invocations(),
        vec![
            "/fw.bin|./stuff/cpu_tests/a.exe",
            "/fw.bin|./stuff/cpu_tests/b_fail.EXE",
            "/fw.bin|./stuff/gte_tests/c.exe",
        ]
    );

    let separator = "-".repeat(50);
    let lines: Vec<&str> = output.stdout.lines().collect();
    assert_eq!(lines[0], "Found 3 test files");
    assert_eq!(lines[1], separator);
    assert_eq!(lines[2], "[1/3] Running: ./stuff/cpu_tests/a.exe");
    assert!(lines[3].contains("✓ Completed: a.exe"));
    assert_eq!(lines[4], separator);
    assert_eq!(lines[5], "[2/3] Running: ./stuff/cpu_tests/b_fail.EXE");
    assert!(lines[6].contains("✗ Failed: b_fail.EXE (exit code: 3)"));
    assert_eq!(lines[7], separator);
    assert_eq!(lines[8], "[3/3] Running: ./stuff/gte_tests/c.exe");
    assert!(lines[9].contains("✓ Completed: c.exe"));
    assert_eq!(lines[10], separator);
    assert!(lines[11].contains("All tests completed!"));
    assert!(lines[12].contains("2 passed, 1 failed, 0 errors"));

    // Emulator output is discarded, not forwarded
    assert!(!output.stdout.contains("noise"));
    assert!(!output.stderr.contains("noise"));
}

#[cfg(unix)]
#[test]
fn test_custom_pattern_and_root() {
    let ctx = TestContext::new();
    ctx.add_test("suite/only.psx");
    ctx.add_test("cpu_tests/skipped.exe");
    let emulator = ctx.fake_emulator();

    let output = ctx.run(&[
        "--config",
        ctx.config_file.to_str().unwrap(),
        "--emulator",
        emulator.to_str().unwrap(),
        "--tests-root",
        "./stuff",
        "--pattern",
        "suite/*.psx",
        "bios.bin",
    ]);

    assert_eq!(output.code, Some(0), "{:?}", output);
    assert_eq!(ctx.invocations(), vec!["bios.bin|./stuff/suite/only.psx"]);
    assert!(output.stdout.contains("Found 1 test files"));
}

#[cfg(unix)]
#[test]
fn test_timeout_reports_error_and_continues() {
    use std::os::unix::fs::PermissionsExt;

    let ctx = TestContext::new();
    ctx.add_test("cpu_tests/hang.exe");
    ctx.add_test("cpu_tests/quick.exe");

    let script = ctx.root().join("slow-emu.sh");
    fs::write(
        &script,
        "#!/bin/sh\ncase \"$2\" in\n  *hang*) exec sleep 30 ;;\nesac\nexit 0\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let output = ctx.run(&[
        "--config",
        ctx.config_file.to_str().unwrap(),
        "--emulator",
        script.to_str().unwrap(),
        "--timeout",
        "1",
        "/fw.bin",
    ]);

    assert_eq!(output.code, Some(0), "{:?}", output);
    assert!(output.stdout.contains("✗ Error running hang.exe: timed out after 1s"));
    assert!(output.stdout.contains("✓ Completed: quick.exe"));
}

#[cfg(unix)]
#[test]
fn test_sigint_stops_run_and_kills_emulator() {
    use std::os::unix::fs::PermissionsExt;
    use std::process::Stdio;
    use std::thread::sleep;
    use std::time::{Duration, Instant};

    let ctx = TestContext::new();
    ctx.add_test("cpu_tests/a_hang.exe");
    ctx.add_test("cpu_tests/b_next.exe");

    // Wrapper that keeps the real work in a grandchild, like `cargo run`
    let pid_file = ctx.root().join("emulator.pid");
    let script = ctx.root().join("hang-emu.sh");
    fs::write(
        &script,
        format!(
            "#!/bin/sh\necho \"$2\" >> \"{log}\"\nsleep 30 &\necho $! > \"{pid}\"\nwait\n",
            log = ctx.log_path().display(),
            pid = pid_file.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let child = Command::new(env!("CARGO_BIN_EXE_run-tests"))
        .args([
            "--config",
            ctx.config_file.to_str().unwrap(),
            "--emulator",
            script.to_str().unwrap(),
            "/fw.bin",
        ])
        .current_dir(ctx.root())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run run-tests");

    let deadline = Instant::now() + Duration::from_secs(10);
    let emulator_pid = loop {
        let pid = fs::read_to_string(&pid_file).unwrap_or_default();
        if !pid.trim().is_empty() {
            break pid.trim().to_string();
        }
        assert!(Instant::now() < deadline, "emulator never started");
        sleep(Duration::from_millis(20));
    };

    let sent = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("Failed to run kill");
    assert!(sent.success());

    let output = child.wait_with_output().expect("Failed to wait for run-tests");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(0), "{}", stdout);
    assert!(stdout.contains("Interrupted at test: ./stuff/cpu_tests/a_hang.exe"));
    assert!(!stdout.contains("All tests completed!"));
    assert!(!stdout.contains("Running: ./stuff/cpu_tests/b_next.exe"));
    assert_eq!(ctx.invocations(), vec!["./stuff/cpu_tests/a_hang.exe"]);

    // The grandchild is gone once it no longer answers signal 0
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let alive = Command::new("kill")
            .args(["-0", &emulator_pid])
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        let zombie = fs::read_to_string(format!("/proc/{}/stat", emulator_pid))
            .map(|stat| stat.rsplit(')').next().unwrap_or("").trim_start().starts_with('Z'))
            .unwrap_or(false);
        if !alive || zombie {
            break;
        }
        assert!(
            Instant::now() < deadline,
            "emulator {} survived the interrupt",
            emulator_pid
        );
        sleep(Duration::from_millis(50));
    }
}

#[test]
fn test_invalid_config_file_is_fatal() {
    let ctx = TestContext::new();
    fs::write(&ctx.config_file, "[run]\ntimeout_secs = \"never\"\n").unwrap();

    let output = ctx.run(&["--config", ctx.config_file.to_str().unwrap(), "/fw.bin"]);

    assert_eq!(output.code, Some(1), "{:?}", output);
    assert!(output.stderr.contains("Invalid configuration file"));
}
