//! Blank/label detection on un-annotated document text.
//!
//! Every blank marker on an eligible line is paired with the label phrase
//! written in front of it. Only the marker is reported as `original`, so the
//! injector can replace it without touching the label.

use std::collections::HashSet;

use tracing::{debug, info};

use docfill_core::ZoneConfig;

use crate::labels::LabelResolver;
use crate::markers::find_markers;
use crate::types::FillFieldReplacement;
use crate::zones::ZoneMap;

/// Separators that may sit between a label and its blank.
const LABEL_SEPARATORS: &[char] = &[':', '–', '—', '-'];

/// Clause boundaries inside the text preceding a blank.
const CLAUSE_BREAKS: &[char] = &[',', ';', '(', ')', '\t'];

/// Detect unfilled blanks and bind each to a placeholder key.
///
/// A key is bound at most once per document; the first blank wins.
pub fn detect_blanks(
    text: &str,
    resolver: &LabelResolver,
    zones: ZoneConfig,
) -> Vec<FillFieldReplacement> {
    let lines: Vec<&str> = text.lines().collect();
    let zone_map = ZoneMap::new(&lines, zones);

    let mut used: HashSet<String> = HashSet::new();
    let mut replacements = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if !zone_map.blank_eligible(index) {
            continue;
        }

        let mut segment_start = 0;
        for marker in find_markers(line) {
            let segment = &line[segment_start..marker.start];
            segment_start = marker.end;

            let Some(label) = trailing_label(segment) else {
                continue;
            };
            let Some(placeholder) = resolver.resolve(label) else {
                debug!("No placeholder for label '{}' on line {}", label, index);
                continue;
            };
            if !used.insert(placeholder.to_string()) {
                debug!("Placeholder {} already bound, skipping line {}", placeholder, index);
                continue;
            }

            replacements.push(FillFieldReplacement {
                original: line[marker].to_string(),
                placeholder: placeholder.to_string(),
                label: Some(label.to_string()),
                line_index: index,
            });
        }
    }

    info!(
        "Blank detection: {} replacements from {} lines",
        replacements.len(),
        lines.len()
    );
    replacements
}

/// The label phrase at the end of `segment`, without its separator.
fn trailing_label(segment: &str) -> Option<&str> {
    let trimmed = segment
        .trim()
        .trim_end_matches(|c: char| LABEL_SEPARATORS.contains(&c) || c.is_whitespace());

    let clause = trimmed
        .rsplit(CLAUSE_BREAKS)
        .map(str::trim)
        .find(|piece| !piece.is_empty())?;

    (clause.chars().count() >= 2).then_some(clause)
}
