//! Test executable discovery
//!
//! Expands each pattern against the filesystem under a root directory,
//! merges the matches, and returns them deduplicated and sorted by their
//! full path string.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::pattern::{Pattern, Segment};

/// A test executable found on disk
///
/// Identity is the path string; two patterns matching the same file yield
/// a single `TestCase`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestCase {
    display: String,
    path: PathBuf,
}

impl TestCase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            display: path.to_string_lossy().into_owned(),
            path,
        }
    }

    /// Full path of the test executable
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base file name, used in pass/fail lines
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display.clone())
    }
}

impl std::fmt::Display for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display)
    }
}

/// Find every file under `root` matching any of `patterns`
///
/// The result is sorted lexicographically on the full path string and
/// contains each path once. Missing or unreadable directories contribute
/// nothing; an empty result is not an error.
pub fn discover(root: &Path, patterns: &[Pattern]) -> Vec<TestCase> {
    let mut found: BTreeMap<String, TestCase> = BTreeMap::new();

    for pattern in patterns {
        let matches = expand(root, pattern.segments());
        tracing::debug!(pattern = %pattern, count = matches.len(), "Expanded test pattern");
        for path in matches {
            let case = TestCase::new(path);
            found.entry(case.display.clone()).or_insert(case);
        }
    }

    found.into_values().collect()
}

/// Walk one pattern, segment by segment
fn expand(root: &Path, segments: &[Segment]) -> Vec<PathBuf> {
    let mut frontier = vec![root.to_path_buf()];

    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();
        let mut next = Vec::new();

        for dir in &frontier {
            match segment {
                Segment::Literal(name) => {
                    let candidate = dir.join(name);
                    if kind_matches(&candidate, last) {
                        next.push(candidate);
                    }
                }
                Segment::Wildcard(_) => {
                    let entries = match fs::read_dir(dir) {
                        Ok(entries) => entries,
                        Err(e) => {
                            let dir = dir.display();
                            tracing::debug!(%dir, error = %e, "Skipping unreadable directory");
                            continue;
                        }
                    };
                    for entry in entries.flatten() {
                        let file_name = entry.file_name();
                        let Some(name) = file_name.to_str() else {
                            tracing::debug!(entry = ?file_name, "Skipping non-UTF-8 file name");
                            continue;
                        };
                        if !segment.matches(name) {
                            continue;
                        }
                        let candidate = entry.path();
                        if kind_matches(&candidate, last) {
                            next.push(candidate);
                        }
                    }
                }
            }
        }

        frontier = next;
        if frontier.is_empty() {
            break;
        }
    }

    frontier
}

/// Intermediate segments must be directories, the last one a file.
/// Symlinks are followed.
fn kind_matches(path: &Path, last: bool) -> bool {
    match fs::metadata(path) {
        Ok(meta) if last => meta.is_file(),
        Ok(meta) => meta.is_dir(),
        Err(_) => false,
    }
}
