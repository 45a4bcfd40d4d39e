//! Variable registry: text analysis and placeholder → variable mapping over
//! the cached catalog.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use docfill_core::{DataPaths, EngineConfig, Result};

use crate::cache::{CacheStats, CatalogCache};
use crate::snapshot::CatalogSnapshot;
use crate::source::{CatalogSource, StaticCatalog};
use crate::sqlite::SqliteCatalog;
use crate::types::*;

pub const EXACT_MATCH_CONFIDENCE: f64 = 1.0;
pub const BLOCK_FIELD_CONFIDENCE: f64 = 0.9;
pub const LABEL_MATCH_CONFIDENCE: f64 = 0.7;
pub const CONTEXT_SUGGESTION_CONFIDENCE: f64 = 0.5;

/// Blocks that contribute suggestions in `analyze_text`.
const TOP_BLOCKS: usize = 3;
/// Block score that maps to full suggestion confidence.
const SCORE_SCALE: f64 = 50.0;
/// Shortest name considered for label substring matching.
const MIN_LABEL_MATCH_CHARS: usize = 3;

pub struct VariableRegistry {
    cache: CatalogCache,
}

impl VariableRegistry {
    pub fn new(source: Box<dyn CatalogSource>, ttl: Duration) -> Self {
        Self {
            cache: CatalogCache::new(source, ttl),
        }
    }

    /// SQLite-backed registry under the configured data directory. An empty
    /// database is seeded from `catalog.json` when present, else from the
    /// built-in catalog.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let paths = &config.data_paths;
        let seed = match DataPaths::existing(&paths.catalog_seed) {
            Some(path) => {
                info!("Using catalog seed {}", path.display());
                StaticCatalog::load_file(path)?
            }
            None => StaticCatalog::slovak(),
        };
        let catalog = SqliteCatalog::open_seeded(&paths.catalog_db, seed.data())?;
        Ok(Self::new(Box::new(catalog), config.catalog_ttl()))
    }

    pub fn snapshot(&self) -> Result<Arc<CatalogSnapshot>> {
        self.cache.snapshot()
    }

    pub fn refresh(&self) -> Result<()> {
        self.cache.refresh().map(|_| ())
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Score blocks by keyword hits and suggest variables from the best ones.
    pub fn analyze_text(&self, text: &str) -> Result<TextAnalysis> {
        let snap = self.snapshot()?;
        Ok(analyze(&snap, text))
    }

    /// Exact key, then normalized key, then normalized label.
    pub fn find_variable_for_placeholder(&self, name: &str) -> Result<Option<Variable>> {
        let snap = self.snapshot()?;
        let name = name.trim();
        if let Some(v) = snap.variable(name) {
            return Ok(Some(v.clone()));
        }
        if let Some(v) = find_by_normalized_key(&snap, name) {
            return Ok(Some(v.clone()));
        }
        let wanted = normalize_label(name);
        Ok(snap
            .variables()
            .iter()
            .find(|v| normalize_label(&v.label) == wanted || normalize_label(&v.label_en) == wanted)
            .cloned())
    }

    /// Map a template placeholder to a catalog variable, falling back to the
    /// surrounding text when the name itself says nothing.
    pub fn map_placeholder_to_variable(&self, name: &str, context: &str) -> Result<PlaceholderMapping> {
        let snap = self.snapshot()?;
        let name = name.trim();
        let mapping = map_with(&snap, name, context);
        debug!(
            "Mapped '{}' -> {:?} ({:?}, {:.2})",
            name,
            mapping.variable.as_ref().map(|v| v.key.as_str()),
            mapping.method,
            mapping.confidence
        );
        Ok(mapping)
    }

    pub fn get_all_variables_grouped_by_block(&self) -> Result<Vec<BlockVariables>> {
        let snap = self.snapshot()?;
        Ok(snap
            .blocks()
            .iter()
            .map(|b| BlockVariables {
                block: b.clone(),
                variables: snap.variables_in_block(b.id).cloned().collect(),
            })
            .collect())
    }
}

fn analyze(snap: &CatalogSnapshot, text: &str) -> TextAnalysis {
    let lower = text.to_lowercase();
    let mut scores: HashMap<i64, f64> = HashMap::new();
    for kw in snap.keywords() {
        let keyword = kw.keyword.to_lowercase();
        if !keyword.is_empty() && lower.contains(&keyword) {
            *scores.entry(kw.block_id).or_default() += kw.weight;
        }
    }

    let mut detected: Vec<BlockScore> = snap
        .blocks()
        .iter()
        .filter_map(|b| {
            let score = scores.get(&b.id).copied().unwrap_or(0.0);
            (score > 0.0).then(|| BlockScore {
                block: b.clone(),
                score,
            })
        })
        .collect();
    detected.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.block.priority.cmp(&b.block.priority))
            .then_with(|| a.block.code.cmp(&b.block.code))
    });

    let suggested_variables = detected
        .iter()
        .take(TOP_BLOCKS)
        .flat_map(|bs| {
            let confidence = (bs.score / SCORE_SCALE).min(1.0);
            snap.variables_in_block(bs.block.id).map(move |v| SuggestedVariable {
                variable: v.clone(),
                confidence,
            })
        })
        .collect();

    TextAnalysis {
        detected_blocks: detected,
        suggested_variables,
    }
}

fn map_with(snap: &CatalogSnapshot, name: &str, context: &str) -> PlaceholderMapping {
    let found = |variable: &Variable, confidence, method| PlaceholderMapping {
        variable: Some(variable.clone()),
        confidence,
        method,
    };

    if let Some(v) = snap.variable(name) {
        return found(v, EXACT_MATCH_CONFIDENCE, MatchMethod::ExactKeyMatch);
    }

    if let Some(v) = find_in_block(snap, name) {
        return found(v, BLOCK_FIELD_CONFIDENCE, MatchMethod::BlockFieldMatch);
    }

    let wanted = normalize_label(name);
    if wanted.chars().count() >= MIN_LABEL_MATCH_CHARS {
        let by_label = snap
            .blocks()
            .iter()
            .flat_map(|b| snap.variables_in_block(b.id))
            .find(|v| label_overlaps(&v.label, &wanted) || label_overlaps(&v.label_en, &wanted));
        if let Some(v) = by_label {
            return found(v, LABEL_MATCH_CONFIDENCE, MatchMethod::LabelMatch);
        }
    }

    if !context.trim().is_empty() {
        let analysis = analyze(snap, context);
        let hint = normalize_key(name.rsplit('.').next().unwrap_or(name));
        let suggestion = analysis
            .suggested_variables
            .iter()
            .find(|s| {
                let field = normalize_key(s.variable.field());
                !hint.is_empty() && (field.contains(&hint) || hint.contains(&field))
            })
            .or_else(|| analysis.suggested_variables.first());
        if let Some(s) = suggestion {
            return found(&s.variable, CONTEXT_SUGGESTION_CONFIDENCE, MatchMethod::ContextSuggestion);
        }
    }

    PlaceholderMapping::no_match()
}

/// `block.field`: the variable of that block whose field equals `field`
/// after key normalization, else the first one in display order whose field
/// ends with it.
fn find_in_block<'a>(snap: &'a CatalogSnapshot, name: &str) -> Option<&'a Variable> {
    let (code, field) = name.split_once('.')?;
    let block = snap.block_by_code(code)?;
    let suffix = normalize_key(field);
    if suffix.is_empty() {
        return None;
    }
    snap.variables_in_block(block.id)
        .find(|v| normalize_key(v.field()) == suffix)
        .or_else(|| {
            snap.variables_in_block(block.id)
                .find(|v| normalize_key(v.field()).ends_with(&suffix))
        })
}

fn find_by_normalized_key<'a>(snap: &'a CatalogSnapshot, name: &str) -> Option<&'a Variable> {
    let wanted = normalize_key(name);
    snap.variables().iter().find(|v| normalize_key(&v.key) == wanted)
}

/// Lower-case with `_`, `-` and whitespace removed.
fn normalize_key(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lower-case words, with key punctuation treated as spaces.
fn normalize_label(s: &str) -> String {
    s.to_lowercase()
        .replace(['_', '-', '.', ':'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn label_overlaps(label: &str, wanted: &str) -> bool {
    let label = normalize_label(label);
    label.chars().count() >= MIN_LABEL_MATCH_CHARS && (label.contains(wanted) || wanted.contains(&label))
}
