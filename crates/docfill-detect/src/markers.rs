//! Blank markers: runs of dots, underscores or ellipsis characters that
//! stand in for an unfilled value.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

/// ≥3 dots, ≥3 underscores, or ≥2 ellipsis characters.
static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{3,}|_{3,}|…{2,}").unwrap());

/// Byte ranges of every blank marker on a line, left to right.
pub fn find_markers(line: &str) -> Vec<Range<usize>> {
    MARKER_RE.find_iter(line).map(|m| m.range()).collect()
}

pub fn has_marker(line: &str) -> bool {
    MARKER_RE.is_match(line)
}
