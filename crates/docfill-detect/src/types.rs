//! Data types produced by the detectors.

use serde::{Deserialize, Serialize};

/// Kind of a declared template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Checkbox,
    Dropdown,
    Signature,
}

/// A declared, already-bound field in a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
}

/// One AcroForm field as reported by the PDF collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfFormField {
    pub name: String,
    /// Implementation class of the field (e.g. `PDFCheckBox`, `PDFTextField`).
    pub class_name: String,
    #[serde(default)]
    pub required: bool,
}

/// A value that is already written out in the document, recognized by the
/// pattern library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedField {
    /// The literal matched value.
    pub original: String,
    pub placeholder: String,
    pub label: String,
    /// Text window around the match, kept for auditing.
    pub context: String,
    pub confidence: f64,
    pub line_index: usize,
}

/// An unfilled blank paired with the placeholder it should hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillFieldReplacement {
    /// The blank marker itself (dots, underscores or ellipsis).
    pub original: String,
    pub placeholder: String,
    /// Label text as written before the marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub line_index: usize,
}

impl From<&DetectedField> for FillFieldReplacement {
    /// Treat a filled-in value as the span to replace. The label is not
    /// carried over because the library label rarely appears verbatim in
    /// front of the value, so injection falls back to the literal value.
    fn from(field: &DetectedField) -> Self {
        Self {
            original: field.original.clone(),
            placeholder: field.placeholder.clone(),
            label: None,
            line_index: field.line_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_json_shape() {
        let rep = FillFieldReplacement {
            original: "......".into(),
            placeholder: "father.fullName".into(),
            label: Some("Otec".into()),
            line_index: 3,
        };
        let json = serde_json::to_value(&rep).unwrap();
        assert_eq!(json["lineIndex"], 3);
        assert_eq!(json["placeholder"], "father.fullName");

        let field = TemplateField {
            name: "customer.fullName".into(),
            field_type: FieldType::Signature,
            required: true,
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "signature");
    }
}
