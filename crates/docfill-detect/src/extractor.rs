//! Extraction of placeholders that are already declared in a template.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::types::{FieldType, PdfFormField, TemplateField};

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Prefixes of block-control tokens (`{{#if}}`, `{{/each}}`, `{{^unless}}`).
const CONTROL_PREFIXES: &[char] = &['#', '/', '^'];

/// Collect the declared `{{key}}` placeholders of a text, deduplicated in
/// first-seen order. Control tokens and `{{else}}` are skipped.
pub fn extract_placeholders(text: &str) -> Vec<TemplateField> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut fields = Vec::new();

    for cap in PLACEHOLDER_RE.captures_iter(text) {
        let Some(name) = cap.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if is_control_token(name) || name.chars().any(char::is_whitespace) {
            continue;
        }
        if seen.insert(name) {
            fields.push(TemplateField {
                name: name.to_string(),
                field_type: FieldType::Text,
                required: true,
            });
        }
    }

    info!("Extracted {} placeholders", fields.len());
    fields
}

/// Like [`extract_placeholders`], but strips markup first so tokens split by
/// inline tags (`{{<b>customer</b>.fullName}}`) are still found.
pub fn extract_from_html(html: &str) -> Vec<TemplateField> {
    let text = TAG_RE.replace_all(html, "");
    extract_placeholders(&text)
}

/// Map PDF form fields to template fields by their implementation class.
pub fn extract_from_pdf_fields(fields: &[PdfFormField]) -> Vec<TemplateField> {
    let mut seen: HashSet<&str> = HashSet::new();
    let out: Vec<TemplateField> = fields
        .iter()
        .filter(|f| !f.name.is_empty() && seen.insert(f.name.as_str()))
        .map(|f| TemplateField {
            name: f.name.clone(),
            field_type: field_type_for_class(&f.class_name),
            required: f.required,
        })
        .collect();

    info!("Extracted {} PDF form fields", out.len());
    out
}

fn is_control_token(name: &str) -> bool {
    name.starts_with(CONTROL_PREFIXES) || name == "else" || name.starts_with("else ")
}

fn field_type_for_class(class_name: &str) -> FieldType {
    let class = class_name.to_lowercase();
    if class.contains("checkbox") {
        FieldType::Checkbox
    } else if class.contains("dropdown") || class.contains("combo") || class.contains("optionlist") {
        FieldType::Dropdown
    } else if class.contains("signature") {
        FieldType::Signature
    } else {
        FieldType::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(fields: &[TemplateField]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_extract_and_dedupe() {
        let text = "Klientka {{customer.fullName}}, r. č. {{ customer.personalId }}. \
                    Podpis: {{customer.fullName}}";
        let fields = extract_placeholders(text);
        assert_eq!(names(&fields), vec!["customer.fullName", "customer.personalId"]);
        assert!(fields.iter().all(|f| f.field_type == FieldType::Text && f.required));
    }

    #[test]
    fn test_control_tokens_excluded() {
        let text = "{{#if father.fullName}}Otec: {{father.fullName}}{{else}}-{{/if}} \
                    {{#each children}}{{child.fullName}}{{/each}}{{^hasFather}}x{{/hasFather}}";
        let fields = extract_placeholders(text);
        assert_eq!(names(&fields), vec!["father.fullName", "child.fullName"]);
    }

    #[test]
    fn test_html_split_token() {
        let html = "<p>Meno: {{<b>customer</b>.fullName}}</p><p>{{contract.number}}</p>";
        let fields = extract_from_html(html);
        assert_eq!(names(&fields), vec!["customer.fullName", "contract.number"]);
    }

    #[test]
    fn test_pdf_field_types() {
        let fields = vec![
            PdfFormField { name: "meno".into(), class_name: "PDFTextField".into(), required: true },
            PdfFormField { name: "suhlas".into(), class_name: "PDFCheckBox".into(), required: false },
            PdfFormField { name: "krajina".into(), class_name: "PDFDropdown".into(), required: false },
            PdfFormField { name: "podpis".into(), class_name: "PDFSignature".into(), required: true },
            PdfFormField { name: "meno".into(), class_name: "PDFTextField".into(), required: false },
        ];
        let out = extract_from_pdf_fields(&fields);
        let types: Vec<FieldType> = out.iter().map(|f| f.field_type).collect();
        assert_eq!(
            types,
            vec![FieldType::Text, FieldType::Checkbox, FieldType::Dropdown, FieldType::Signature]
        );
        assert!(out[0].required);
    }
}
