//! Pattern-based detection of fields whose value is already written out
//! (e.g. "rodné číslo: 900315/1234").
//!
//! The library is data: each entry names one canonical placeholder and a list
//! of alternative regexes whose first capture group is the value.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use docfill_core::{Error, Result, ZoneConfig};

use crate::markers::find_markers;
use crate::types::DetectedField;
use crate::zones::ZoneMap;

/// Confidence attached to every field this detector emits. Detector level,
/// not value level.
pub const DETECTOR_CONFIDENCE: f64 = 0.9;

const MIN_VALUE_CHARS: usize = 2;
const MAX_VALUE_CHARS: usize = 200;
/// Values shorter than this made only of digits and punctuation are noise.
const NOISE_VALUE_CHARS: usize = 5;
const CONTEXT_CHARS: usize = 200;

const SLOVAK_LIBRARY: &str = include_str!("../data/patterns.sk.json");

static SLOVAK: Lazy<PatternLibrary> = Lazy::new(|| {
    PatternLibrary::from_json(SLOVAK_LIBRARY).expect("embedded pattern library is valid")
});

/// Start of another "label:" on the same line, which ends the current value.
static NEXT_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[,;]|\s{2,})\s*\p{L}[\p{L} .]{0,40}:").unwrap());

#[derive(Deserialize)]
struct LibraryFile {
    fields: Vec<FieldSpec>,
}

#[derive(Deserialize)]
struct FieldSpec {
    placeholder: String,
    label: String,
    patterns: Vec<String>,
}

#[derive(Debug, Clone)]
struct FieldPattern {
    placeholder: String,
    label: String,
    patterns: Vec<Regex>,
}

/// Compiled, ordered field pattern library.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    fields: Vec<FieldPattern>,
}

impl PatternLibrary {
    /// The built-in Slovak library.
    pub fn slovak() -> Self {
        SLOVAK.clone()
    }

    /// Parse and compile a library. Patterns are matched case-insensitively.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: LibraryFile = serde_json::from_str(json)?;
        let mut fields = Vec::with_capacity(file.fields.len());
        for spec in file.fields {
            let mut patterns = Vec::with_capacity(spec.patterns.len());
            for p in &spec.patterns {
                let re = Regex::new(&format!("(?i){}", p)).map_err(|e| {
                    Error::Config(format!("pattern for {}: {}", spec.placeholder, e))
                })?;
                patterns.push(re);
            }
            fields.push(FieldPattern {
                placeholder: spec.placeholder,
                label: spec.label,
                patterns,
            });
        }
        Ok(Self { fields })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Detect already filled-in fields in eligible lines of `text`.
    pub fn detect(&self, text: &str, zones: ZoneConfig) -> Vec<DetectedField> {
        let lines: Vec<&str> = text.lines().collect();
        let zone_map = ZoneMap::new(&lines, zones);

        let mut seen: HashSet<String> = HashSet::new();
        let mut detected = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            if !zone_map.pattern_eligible(index) {
                continue;
            }

            for field in &self.fields {
                let Some(raw) = field.patterns.iter().find_map(|re| capture_value(re, line)) else {
                    continue;
                };
                let Some(value) = clean_value(raw) else {
                    debug!("Rejected value for {} on line {}", field.placeholder, index);
                    continue;
                };
                if !seen.insert(value.to_lowercase()) {
                    continue;
                }

                detected.push(DetectedField {
                    original: value.to_string(),
                    placeholder: field.placeholder.clone(),
                    label: field.label.clone(),
                    context: context_window(&lines, index),
                    confidence: DETECTOR_CONFIDENCE,
                    line_index: index,
                });
            }
        }

        info!(
            "Pattern detection: {} fields from {} lines",
            detected.len(),
            lines.len()
        );
        detected
    }
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::slovak()
    }
}

fn capture_value<'t>(re: &Regex, line: &'t str) -> Option<&'t str> {
    let caps = re.captures(line)?;
    caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str())
}

/// Cut the raw capture at the next label, blank marker or placeholder, trim
/// it, and apply the length and noise filters.
fn clean_value(raw: &str) -> Option<&str> {
    let mut end = raw.len();
    if let Some(m) = NEXT_LABEL_RE.find(raw) {
        end = end.min(m.start());
    }
    if let Some(marker) = find_markers(raw).first() {
        end = end.min(marker.start);
    }
    if let Some(open) = raw.find("{{") {
        end = end.min(open);
    }
    let value = raw[..end].trim().trim_end_matches([',', ';']).trim_end();

    let chars = value.chars().count();
    if !(MIN_VALUE_CHARS..=MAX_VALUE_CHARS).contains(&chars) {
        return None;
    }
    let noise = value
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_punctuation() || c.is_whitespace() || c == '…');
    if noise && chars < NOISE_VALUE_CHARS {
        return None;
    }
    Some(value)
}

fn context_window(lines: &[&str], index: usize) -> String {
    let start = index.saturating_sub(1);
    let end = (index + 1).min(lines.len().saturating_sub(1));
    let joined = lines[start..=end]
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    joined.chars().take(CONTEXT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Vec<DetectedField> {
        PatternLibrary::slovak().detect(text, ZoneConfig::default())
    }

    #[test]
    fn test_personal_id() {
        let found = detect("rodné číslo: 900315/1234");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].placeholder, "customer.personalId");
        assert_eq!(found[0].original, "900315/1234");
        assert_eq!(found[0].confidence, 0.9);
    }

    #[test]
    fn test_mother_name_alternatives() {
        let found = detect("Klientka: Mária Nováková\nOtec: Ján Novák");
        let pairs: Vec<(&str, &str)> = found
            .iter()
            .map(|f| (f.placeholder.as_str(), f.original.as_str()))
            .collect();
        assert!(pairs.contains(&("customer.fullName", "Mária Nováková")));
        assert!(pairs.contains(&("father.fullName", "Ján Novák")));
    }

    #[test]
    fn test_value_cut_at_next_label() {
        let found = detect("Otec: Ján Novák, rodné číslo otca: 800101/1234");
        let father = found.iter().find(|f| f.placeholder == "father.fullName").unwrap();
        assert_eq!(father.original, "Ján Novák");
        let id = found.iter().find(|f| f.placeholder == "father.personalId").unwrap();
        assert_eq!(id.original, "800101/1234");
    }

    #[test]
    fn test_rejects_blanks_noise_and_repeats() {
        assert!(detect("Otec: ..........").is_empty());
        assert!(detect("Rodné číslo: 1/2").is_empty());

        let found = detect("Klientka: Mária Nováková\nMatka: mária nováková");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_declared_placeholder_is_not_a_value() {
        assert!(detect("Klientka: {{customer.fullName}}").is_empty());
        let found = detect("Otec: Ján Novák {{father.personalId}}");
        assert_eq!(found[0].original, "Ján Novák");
    }

    #[test]
    fn test_rejects_overlong_values() {
        let long = "x".repeat(201);
        assert!(detect(&format!("Klientka: {long}")).is_empty());
    }

    #[test]
    fn test_zone_widened_by_neighbour_blank() {
        let mut lines: Vec<String> = (0..300)
            .map(|i| format!("Článok {i}: zmluvné strany sa dohodli na podmienkach."))
            .collect();
        lines[150] = "Rodné číslo: 900315/1234".to_string();
        assert!(detect(&lines.join("\n")).is_empty());

        lines[151] = "Podpis: ..............".to_string();
        let found = detect(&lines.join("\n"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line_index, 150);
        assert!(found[0].context.contains("Podpis"));
    }

    #[test]
    fn test_body_line_with_own_marker() {
        let mut lines: Vec<String> = (0..300)
            .map(|i| format!("Článok {i}: zmluvné strany sa dohodli na podmienkach."))
            .collect();
        lines[150] = "Rodné číslo: 900315/1234; Podpis: ..........".to_string();

        let found = detect(&lines.join("\n"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].placeholder, "customer.personalId");
        assert_eq!(found[0].original, "900315/1234");
        assert_eq!(found[0].line_index, 150);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let json = r#"{"fields":[{"placeholder":"a.b","label":"A","patterns":["(unclosed"]}]}"#;
        assert!(matches!(PatternLibrary::from_json(json), Err(Error::Config(_))));
    }
}
