//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// How to launch the emulator
    #[serde(default)]
    pub emulator: EmulatorConfig,

    /// Where to look for test executables
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Per-run settings
    #[serde(default)]
    pub run: RunSettings,
}

/// Emulator launch configuration
///
/// The emulator is invoked as `<program> <args...> <firmware> <test>`.
#[derive(Debug, Deserialize, Clone)]
pub struct EmulatorConfig {
    /// Program to execute (bare names are looked up on PATH)
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Arguments placed before the firmware and test paths
    #[serde(default = "default_emulator_args")]
    pub args: Vec<String>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_emulator_args(),
        }
    }
}

fn default_program() -> PathBuf {
    PathBuf::from("cargo")
}

fn default_emulator_args() -> Vec<String> {
    vec!["run".to_string(), "--release".to_string(), "--".to_string()]
}

/// Test discovery configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    /// Directory the patterns are relative to
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns, one directory level plus a file name
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            patterns: default_patterns(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("./stuff")
}

fn default_patterns() -> Vec<String> {
    vec!["*_tests/*.exe".to_string(), "*_tests/*.EXE".to_string()]
}

/// Per-run settings
#[derive(Debug, Deserialize, Default)]
pub struct RunSettings {
    /// Kill and report any test running longer than this. Unset means wait forever.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| super::Error::file_read(path, &e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Resolve the emulator program to an executable path
    ///
    /// Bare names are searched on PATH. Anything unresolved is returned as-is
    /// so that the launch itself reports the problem for each test.
    pub fn resolve_program(program: &Path) -> PathBuf {
        if program.components().count() > 1 {
            return program.to_path_buf();
        }
        which::which(program).unwrap_or_else(|_| program.to_path_buf())
    }
}
