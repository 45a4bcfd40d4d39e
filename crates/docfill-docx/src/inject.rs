//! OOXML placeholder injection.
//!
//! Each replacement turns one blank marker into a `{{key}}` token. The label
//! in front of the marker anchors the match; if the label cannot be found the
//! first free occurrence of the marker is used instead. A key is consumed at
//! most once per document.
//!
//! Injection runs against the paragraph view of the document (see
//! [`DocumentBody`]). When the part is not well-formed XML the same rules are
//! applied to the raw string as a fallback; that path cannot see run
//! boundaries.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::PathBuf;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use docfill_core::{Error, Result};
use docfill_detect::FillFieldReplacement;

use crate::body::DocumentBody;
use crate::cleanup::cleanup_placeholders;
use crate::package::{DocxPackage, MAIN_DOCUMENT_PART};

const MARKER_CHARS: &[char] = &['.', '_', '…'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionMode {
    Structured,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    LabelAnchored,
    MarkerFallback,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectedField {
    pub placeholder: String,
    pub original: String,
    pub kind: MatchKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<usize>,
}

/// Outcome of one injection pass. Skipped items are reported, never raised.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionReport {
    pub mode: InjectionMode,
    pub injected: Vec<InjectedField>,
    /// Placeholders skipped because the key was already bound in this pass.
    pub duplicates: Vec<String>,
    /// Placeholders whose marker could not be found.
    pub unmatched: Vec<String>,
}

impl InjectionReport {
    fn new(mode: InjectionMode) -> Self {
        Self {
            mode,
            injected: Vec::new(),
            duplicates: Vec::new(),
            unmatched: Vec::new(),
        }
    }
}

/// Inject placeholders into main-document XML and run the cleanup pass.
pub fn inject_into_xml(xml: &str, replacements: &[FillFieldReplacement]) -> (String, InjectionReport) {
    let (raw, report) = match DocumentBody::parse(xml) {
        Ok(mut body) => {
            let report = inject_structured(&mut body, replacements);
            (body.to_xml(), report)
        }
        Err(e) => {
            warn!("Document XML not well-formed ({}), using flat injection", e);
            inject_flat(xml, replacements)
        }
    };

    info!(
        "Injection ({:?}): {} injected, {} duplicate, {} unmatched",
        report.mode,
        report.injected.len(),
        report.duplicates.len(),
        report.unmatched.len()
    );
    (cleanup_placeholders(&raw), report)
}

/// Inject into a package and serialize the result. Sibling entries are
/// written back unchanged.
pub fn inject_package(
    package: &DocxPackage,
    replacements: &[FillFieldReplacement],
) -> Result<(Vec<u8>, InjectionReport)> {
    let xml = package.main_document_xml()?;
    let (updated, report) = inject_into_xml(&xml, replacements);

    let mut parts = HashMap::new();
    parts.insert(MAIN_DOCUMENT_PART.to_string(), updated.into_bytes());
    Ok((package.to_bytes(&parts)?, report))
}

/// Read `input`, inject, and write the new DOCX to `output`, as one blocking
/// task.
pub async fn inject_docx(
    input: PathBuf,
    output: PathBuf,
    replacements: Vec<FillFieldReplacement>,
) -> Result<InjectionReport> {
    tokio::task::spawn_blocking(move || {
        let package = DocxPackage::read(&input)?;
        let (bytes, report) = inject_package(&package, &replacements)?;
        std::fs::write(&output, bytes)?;
        Ok(report)
    })
    .await
    .map_err(|e| Error::Internal(format!("inject task failed: {}", e)))?
}

fn token(placeholder: &str) -> String {
    format!("{{{{{}}}}}", placeholder)
}

/// `(label + optional separator)(marker)`.
fn anchor_regex(label: &str, marker: &str) -> Option<Regex> {
    Regex::new(&format!(
        r"({}\s*[:–—-]?\s*)({})",
        regex::escape(label),
        regex::escape(marker)
    ))
    .ok()
}

fn anchored_range(re: &Regex, haystack: &str) -> Option<Range<usize>> {
    re.captures(haystack).and_then(|c| c.get(2)).map(|m| m.range())
}

/// First occurrence of `needle`. A blank marker must match a whole run, not
/// the middle of a longer one.
fn find_literal(haystack: &str, needle: &str) -> Option<Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    let first = needle.chars().next()?;
    let is_marker = needle.chars().all(|c| MARKER_CHARS.contains(&c));

    haystack
        .match_indices(needle)
        .map(|(start, _)| start..start + needle.len())
        .find(|r| {
            !is_marker
                || (!haystack[..r.start].ends_with(first) && !haystack[r.end..].starts_with(first))
        })
}

/// Paragraph search order: the hinted paragraph first, then all others.
fn search_order(count: usize, hint: usize) -> impl Iterator<Item = usize> {
    let first = (hint < count).then_some(hint);
    first.into_iter().chain((0..count).filter(move |i| Some(*i) != first))
}

fn inject_structured(body: &mut DocumentBody, replacements: &[FillFieldReplacement]) -> InjectionReport {
    let mut report = InjectionReport::new(InjectionMode::Structured);
    let mut used: HashSet<&str> = HashSet::new();
    let count = body.paragraph_count();

    for rep in replacements {
        if used.contains(rep.placeholder.as_str()) {
            debug!("Placeholder {} already injected, skipping", rep.placeholder);
            report.duplicates.push(rep.placeholder.clone());
            continue;
        }

        let anchor = rep.label.as_deref().and_then(|l| anchor_regex(l, &rep.original));
        let anchored = anchor.as_ref().and_then(|re| {
            search_order(count, rep.line_index)
                .find_map(|p| anchored_range(re, &body.paragraph_text(p)).map(|r| (p, r)))
        });
        let hit = match anchored {
            Some(found) => Some((found, MatchKind::LabelAnchored)),
            None => search_order(count, rep.line_index)
                .find_map(|p| find_literal(&body.paragraph_text(p), &rep.original).map(|r| (p, r)))
                .map(|found| (found, MatchKind::MarkerFallback)),
        };

        let placed = hit.and_then(|((paragraph, range), kind)| {
            body.replace_range(paragraph, range, &token(&rep.placeholder))
                .then_some((paragraph, kind))
        });

        match placed {
            Some((paragraph, kind)) => {
                used.insert(rep.placeholder.as_str());
                report.injected.push(InjectedField {
                    placeholder: rep.placeholder.clone(),
                    original: rep.original.clone(),
                    kind,
                    paragraph: Some(paragraph),
                });
            }
            None => {
                debug!("No match for {} ('{}')", rep.placeholder, rep.original);
                report.unmatched.push(rep.placeholder.clone());
            }
        }
    }
    report
}

fn escape_xml_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn inject_flat(xml: &str, replacements: &[FillFieldReplacement]) -> (String, InjectionReport) {
    let mut report = InjectionReport::new(InjectionMode::Flat);
    let mut used: HashSet<&str> = HashSet::new();
    let mut out = xml.to_string();

    for rep in replacements {
        if used.contains(rep.placeholder.as_str()) {
            report.duplicates.push(rep.placeholder.clone());
            continue;
        }

        let marker = escape_xml_text(&rep.original);
        let anchored = rep
            .label
            .as_deref()
            .and_then(|l| anchor_regex(&escape_xml_text(l), &marker))
            .and_then(|re| anchored_range(&re, &out));
        let hit = match anchored {
            Some(range) => Some((range, MatchKind::LabelAnchored)),
            None => find_literal(&out, &marker).map(|r| (r, MatchKind::MarkerFallback)),
        };

        match hit {
            Some((range, kind)) => {
                out.replace_range(range, &token(&rep.placeholder));
                used.insert(rep.placeholder.as_str());
                report.injected.push(InjectedField {
                    placeholder: rep.placeholder.clone(),
                    original: rep.original.clone(),
                    kind,
                    paragraph: None,
                });
            }
            None => report.unmatched.push(rep.placeholder.clone()),
        }
    }
    (out, report)
}
