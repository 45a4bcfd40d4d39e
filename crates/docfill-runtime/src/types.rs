//! Runtime report types.

use serde::Serialize;

use docfill_detect::{DetectedField, FillFieldReplacement, TemplateField};
use docfill_docx::InjectionReport;

/// Everything the detectors found in one text layer.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    /// Placeholders already declared in the document.
    pub placeholders: Vec<TemplateField>,
    /// Planned bindings, blanks first, at most one per key.
    pub replacements: Vec<FillFieldReplacement>,
    pub detected_fields: Vec<DetectedField>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReport {
    #[serde(flatten)]
    pub detection: DetectionReport,
    pub injection: InjectionReport,
}
