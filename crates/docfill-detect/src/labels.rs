//! Label → placeholder resolution.
//!
//! A label table is an ordered list of (label, placeholder) pairs loaded from
//! JSON. Resolution tries an exact normalized match first, then a substring
//! match in either direction in table order, so more specific labels must be
//! listed before generic ones ("zákonný zástupca - otec" before "otec").

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::debug;

use docfill_core::{Error, Result};

const SLOVAK_TABLE: &str = include_str!("../data/labels.sk.json");

static SLOVAK: Lazy<LabelResolver> =
    Lazy::new(|| LabelResolver::from_json(SLOVAK_TABLE).expect("embedded label table is valid"));

#[derive(Deserialize)]
struct LabelFile {
    #[serde(default)]
    locale: Option<String>,
    entries: Vec<LabelEntry>,
}

#[derive(Deserialize)]
struct LabelEntry {
    label: String,
    placeholder: String,
}

/// Ordered, normalized label table.
#[derive(Debug, Clone)]
pub struct LabelResolver {
    entries: Vec<(String, String)>,
    locales: Vec<String>,
}

/// Lower-case, drop `:`, treat dashes and underscores as spaces, collapse
/// whitespace, and trim trailing abbreviation dots and commas.
pub fn normalize_label(label: &str) -> String {
    let lowered: String = label
        .to_lowercase()
        .chars()
        .filter(|c| *c != ':')
        .map(|c| match c {
            '-' | '–' | '—' | '_' => ' ',
            other => other,
        })
        .collect();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches(['.', ',']).trim().to_string()
}

impl LabelResolver {
    /// The built-in Slovak table.
    pub fn slovak() -> Self {
        SLOVAK.clone()
    }

    /// Parse a table from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: LabelFile = serde_json::from_str(json)?;
        let mut resolver = Self {
            entries: Vec::with_capacity(file.entries.len()),
            locales: Vec::new(),
        };
        resolver.push_entries(file.locale, file.entries)?;
        Ok(resolver)
    }

    /// Load a table from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
            .map_err(|e| Error::Config(format!("label table {}: {}", path.display(), e)))
    }

    /// Append another table (e.g. a second locale) after the current entries.
    pub fn extend_from_json(&mut self, json: &str) -> Result<()> {
        let file: LabelFile = serde_json::from_str(json)?;
        self.push_entries(file.locale, file.entries)
    }

    fn push_entries(&mut self, locale: Option<String>, entries: Vec<LabelEntry>) -> Result<()> {
        let mut seen: HashSet<String> = self.entries.iter().map(|(l, _)| l.clone()).collect();
        for entry in entries {
            if entry.placeholder.trim().is_empty() {
                return Err(Error::Config(format!(
                    "label '{}' has an empty placeholder",
                    entry.label
                )));
            }
            let normalized = normalize_label(&entry.label);
            if normalized.is_empty() || !seen.insert(normalized.clone()) {
                continue;
            }
            self.entries.push((normalized, entry.placeholder));
        }
        if let Some(locale) = locale {
            if !self.locales.contains(&locale) {
                self.locales.push(locale);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    /// Resolve a label to a placeholder key. `None` means "no binding".
    pub fn resolve(&self, label: &str) -> Option<&str> {
        let normalized = normalize_label(label);
        if normalized.chars().count() < 2 {
            return None;
        }

        if let Some((_, key)) = self.entries.iter().find(|(l, _)| *l == normalized) {
            return Some(key.as_str());
        }

        let hit = self
            .entries
            .iter()
            .find(|(l, _)| normalized.contains(l.as_str()) || l.contains(normalized.as_str()));
        if let Some((l, key)) = hit {
            debug!("Label '{}' resolved to {} via '{}'", label, key, l);
            return Some(key.as_str());
        }
        None
    }
}

impl Default for LabelResolver {
    fn default() -> Self {
        Self::slovak()
    }
}
