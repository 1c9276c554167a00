//! Glob patterns for test discovery
//!
//! A pattern is a `/`-separated relative path. Each segment may use `*`
//! (any run of characters) and `?` (exactly one character). There is no
//! `**`: a pattern only ever reaches as deep as it has segments.

use crate::common::{Error, Result};

/// One path component of a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches exactly this name
    Literal(String),
    /// Contains `*` or `?`
    Wildcard(String),
}

impl Segment {
    fn parse(s: &str) -> Self {
        if s.contains(['*', '?']) {
            Segment::Wildcard(s.to_string())
        } else {
            Segment::Literal(s.to_string())
        }
    }

    /// Check whether a single file or directory name matches this segment
    ///
    /// Matching is case-sensitive. Wildcards never match a leading `.`
    /// unless the segment itself starts with one.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Segment::Literal(lit) => lit == name,
            Segment::Wildcard(pat) => {
                if name.starts_with('.') && !pat.starts_with('.') {
                    return false;
                }
                wildcard_match(pat.as_bytes(), name.as_bytes())
            }
        }
    }
}

/// A parsed discovery pattern such as `*_tests/*.exe`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parse a pattern, rejecting absolute paths, `..` and `**`
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.strip_prefix("./").unwrap_or(source);
        if trimmed.is_empty() {
            return Err(Error::Config("Empty test pattern".to_string()));
        }
        if trimmed.starts_with('/') {
            return Err(Error::Config(format!(
                "Test pattern '{}' must be relative to the tests root",
                source
            )));
        }

        let mut segments = Vec::new();
        for part in trimmed.split('/').filter(|p| !p.is_empty() && *p != ".") {
            if part == ".." || part.contains("**") {
                return Err(Error::Config(format!(
                    "Test pattern '{}' may not use '..' or '**'",
                    source
                )));
            }
            segments.push(Segment::parse(part));
        }

        if segments.is_empty() {
            return Err(Error::Config(format!("Test pattern '{}' is empty", source)));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Pattern text as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Path components, outermost first
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Iterative `*`/`?` matcher with single-star backtracking
fn wildcard_match(pat: &[u8], name: &[u8]) -> bool {
    let (mut p, mut n) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        match pat.get(p) {
            Some(b'*') => {
                star = Some((p, n));
                p += 1;
            }
            Some(b'?') => {
                // `?` consumes one whole UTF-8 character, not one byte
                n += utf8_len(name[n]);
                p += 1;
            }
            Some(&c) if c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match star {
                Some((sp, sn)) => {
                    p = sp + 1;
                    n = sn + utf8_len(name[sn]);
                    star = Some((sp, n));
                }
                None => return false,
            },
        }
    }

    pat[p..].iter().all(|&c| c == b'*')
}

fn utf8_len(first: u8) -> usize {
    match first {
        0xF0..=0xFF => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}
