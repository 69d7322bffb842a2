//! Hierarchical syllabus-number matching
//!
//! Syllabus numbers are dotted paths (`2`, `2.1`, `2.1.3`). A prefix matches
//! itself and every descendant, never a sibling that merely shares leading
//! characters: `2.1` matches `2.1.3` but not `2.10` or `21`.

use regex::Regex;
use serde::Serialize;

/// Returns true iff `candidate` is `prefix` or one of its descendants.
pub fn matches(candidate: &str, prefix: &str) -> bool {
    match candidate.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// A normalized OR-set of syllabus prefixes.
///
/// Prefixes are trimmed, empty entries dropped, duplicates removed, and the
/// remaining set kept in sorted order so plans built from it are
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct PrefixSet {
    prefixes: Vec<String>,
}

impl PrefixSet {
    /// Builds a prefix set from raw filter strings
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut prefixes: Vec<String> = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        prefixes.sort();
        prefixes.dedup();
        Self { prefixes }
    }

    /// True when no prefix survived normalization (no topic restriction)
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }

    /// Logical OR of `matches(candidate, p)` over the set.
    ///
    /// An empty set matches nothing; callers treat an empty set as "no
    /// clause" before reaching this point.
    pub fn matches_any(&self, candidate: &str) -> bool {
        self.prefixes.iter().any(|p| matches(candidate, p))
    }

    /// Renders the set as one anchored pattern, `^(?:p1|p2)(?:\.|$)`.
    ///
    /// Returns `None` for the empty set.
    pub fn to_pattern(&self) -> Option<String> {
        if self.prefixes.is_empty() {
            return None;
        }
        let alternatives: Vec<String> = self.prefixes.iter().map(|p| regex::escape(p)).collect();
        Some(format!(r"^(?:{})(?:\.|$)", alternatives.join("|")))
    }

    /// Compiles [`PrefixSet::to_pattern`] for stores that evaluate regex predicates.
    pub fn to_regex(&self) -> Option<Regex> {
        // Every alternative is escaped, so the pattern always compiles.
        self.to_pattern().and_then(|pattern| Regex::new(&pattern).ok())
    }
}
