//! Dotted state-name globs.
//!
//! A pattern is split on `.`; each segment is a literal, `*` (exactly one
//! segment) or `**` (zero or more segments).

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    One,
    Many,
}

/// Compiled state-name glob.
///
/// # Example
///
/// ```rust
/// use waypoint::hooks::Glob;
///
/// let glob = Glob::new("app.*.detail");
/// assert!(glob.matches("app.users.detail"));
/// assert!(!glob.matches("app.detail"));
///
/// assert!(Glob::new("app.**").matches("app"));
/// assert!(Glob::new("app.**").matches("app.a.b.c"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Glob {
    pattern: String,
    segments: Vec<Segment>,
}

impl Glob {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let segments = pattern
            .split('.')
            .map(|seg| match seg {
                "*" => Segment::One,
                "**" => Segment::Many,
                literal => Segment::Literal(literal.to_string()),
            })
            .collect();
        Self { pattern, segments }
    }

    /// True if `text` contains wildcard segments.
    pub fn is_glob(text: &str) -> bool {
        text.contains('*')
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, name: &str) -> bool {
        if !Self::is_glob(&self.pattern) {
            return self.pattern == name;
        }
        let parts: Vec<&str> = name.split('.').collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(segments: &[Segment], parts: &[&str]) -> bool {
    match segments.split_first() {
        None => parts.is_empty(),
        Some((Segment::Many, rest)) => {
            (0..=parts.len()).any(|skip| match_segments(rest, &parts[skip..]))
        }
        Some((Segment::One, rest)) => {
            !parts.is_empty() && match_segments(rest, &parts[1..])
        }
        Some((Segment::Literal(lit), rest)) => {
            parts.first().is_some_and(|p| *p == lit.as_str()) && match_segments(rest, &parts[1..])
        }
    }
}

impl fmt::Debug for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Glob").field(&self.pattern).finish()
    }
}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}
