//! Template field detection.
//!
//! Finds declared `{{key}}` placeholders, unfilled blanks with their labels,
//! and already filled-in legal phrasing, and resolves labels to canonical
//! placeholder keys. All detectors are pure functions of their text input;
//! label tables and pattern libraries are loaded from data files so new
//! locales do not require code changes.

pub mod blanks;
pub mod extractor;
pub mod labels;
pub mod markers;
pub mod patterns;
pub mod types;
pub mod zones;

pub use blanks::detect_blanks;
pub use extractor::{extract_from_html, extract_from_pdf_fields, extract_placeholders};
pub use labels::{normalize_label, LabelResolver};
pub use patterns::{PatternLibrary, DETECTOR_CONFIDENCE};
pub use types::*;
pub use zones::ZoneMap;
