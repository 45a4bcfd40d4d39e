//! End-to-end template flow tests — a DOCX goes in, a template with
//! `{{key}}` tokens comes out, and the JSON reports keep the shapes the
//! editor UI reads (camelCase field names, snake_case enum values).

use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Duration;

use docfill_core::Error;
use docfill_docx::{DocumentBody, DocxPackage};
use docfill_registry::{MatchMethod, StaticCatalog, VariableRegistry};
use docfill_runtime::TemplateProcessor;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const STYLES: &[u8] = b"<w:styles><w:style w:styleId=\"Normal\"/></w:styles>";

fn paragraph(runs: &[&str]) -> String {
    let runs: String = runs
        .iter()
        .map(|r| format!("<w:r><w:t xml:space=\"preserve\">{}</w:t></w:r>", r))
        .collect();
    format!("<w:p>{}</w:p>", runs)
}

fn document(paragraphs: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        paragraphs.concat()
    )
}

fn write_docx(path: &Path, document_xml: Option<&str>) {
    let mut zout = ZipWriter::new(Cursor::new(Vec::new()));
    zout.start_file("[Content_Types].xml", SimpleFileOptions::default()).unwrap();
    zout.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
    if let Some(xml) = document_xml {
        zout.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
        zout.write_all(xml.as_bytes()).unwrap();
    }
    zout.start_file("word/styles.xml", SimpleFileOptions::default()).unwrap();
    zout.write_all(STYLES).unwrap();
    std::fs::write(path, zout.finish().unwrap().into_inner()).unwrap();
}

fn contract() -> String {
    document(&[
        paragraph(&["ZMLUVA O UCHOVANÍ"]),
        paragraph(&["Klientka: {{customer.", "fullName}}"]),
        paragraph(&["rodné číslo: ", "900315/1234"]),
        paragraph(&["Otec: ", ".....", "......"]),
        paragraph(&["IBAN: ________________"]),
    ])
}

fn output_text(path: &Path) -> String {
    let package = DocxPackage::read(path).unwrap();
    DocumentBody::parse(&package.main_document_xml().unwrap())
        .unwrap()
        .text_layer()
}

#[tokio::test]
async fn test_contract_becomes_template() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("zmluva.docx");
    let output = dir.path().join("zmluva.template.docx");
    write_docx(&input, Some(&contract()));

    let processor = TemplateProcessor::slovak();
    let report = processor.process_docx(&input, &output).await.unwrap();

    assert_eq!(report.detection.placeholders[0].name, "customer.fullName");
    assert_eq!(report.injection.injected.len(), 3);
    assert!(report.injection.duplicates.is_empty());
    assert!(report.injection.unmatched.is_empty());

    let text = output_text(&output);
    assert_eq!(
        text,
        "ZMLUVA O UCHOVANÍ\n\
         Klientka: {{customer.fullName}}\n\
         rodné číslo: {{customer.personalId}}\n\
         Otec: {{father.fullName}}\n\
         IBAN: {{customer.IBAN}}"
    );

    let package = DocxPackage::read(&output).unwrap();
    assert_eq!(package.entry("word/styles.xml").unwrap().data, STYLES);

    let declared = processor.extract_docx_placeholders(&output).await.unwrap();
    let names: Vec<&str> = declared.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["customer.fullName", "customer.personalId", "father.fullName", "customer.IBAN"]
    );
}

#[tokio::test]
async fn test_process_report_shape() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.docx");
    write_docx(&input, Some(&contract()));

    let report = TemplateProcessor::slovak()
        .process_docx(&input, &dir.path().join("out.docx"))
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert!(json["placeholders"].is_array());
    assert_eq!(json["placeholders"][0]["type"], "text");
    assert_eq!(json["placeholders"][0]["required"], true);

    let first = &json["replacements"][0];
    assert_eq!(first["placeholder"], "father.fullName");
    assert_eq!(first["original"], "...........");
    assert_eq!(first["label"], "Otec");
    assert_eq!(first["lineIndex"], 3);

    let field = &json["detectedFields"][0];
    assert_eq!(field["placeholder"], "customer.personalId");
    assert!(field["confidence"].is_number());
    assert!(field["context"].is_string());

    assert_eq!(json["injection"]["mode"], "structured");
    assert_eq!(json["injection"]["injected"][0]["kind"], "label_anchored");
    assert!(json["injection"]["duplicates"].is_array());
    assert!(json["injection"]["unmatched"].is_array());
}

#[tokio::test]
async fn test_duplicate_blank_keys_bound_once() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.docx");
    let output = dir.path().join("out.docx");
    let xml = document(&[
        paragraph(&["Otec: .........."]),
        paragraph(&["Zákonný zástupca - otec: __________"]),
    ]);
    write_docx(&input, Some(&xml));

    let report = TemplateProcessor::slovak().process_docx(&input, &output).await.unwrap();
    assert_eq!(report.detection.replacements.len(), 1);
    let text = output_text(&output);
    assert_eq!(text.matches("{{father.fullName}}").count(), 1);
    assert!(text.contains("__________"));
}

#[tokio::test]
async fn test_missing_main_document() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("broken.docx");
    write_docx(&input, None);

    let err = TemplateProcessor::slovak()
        .process_docx(&input, &dir.path().join("out.docx"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DocumentStructure(_)));
    assert!(!err.is_environment());
    assert!(!err.user_message().is_empty());
    assert!(!dir.path().join("out.docx").exists());
}

#[tokio::test]
async fn test_planned_keys_exist_in_catalog() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.docx");
    write_docx(&input, Some(&contract()));
    let report = TemplateProcessor::slovak()
        .process_docx(&input, &dir.path().join("out.docx"))
        .await
        .unwrap();

    let registry = VariableRegistry::new(Box::new(StaticCatalog::slovak()), Duration::from_secs(300));
    for rep in &report.detection.replacements {
        let mapping = registry.map_placeholder_to_variable(&rep.placeholder, "").unwrap();
        assert_eq!(mapping.method, MatchMethod::ExactKeyMatch, "{}", rep.placeholder);
    }
}

#[test]
fn test_mapping_shape() {
    let registry = VariableRegistry::new(Box::new(StaticCatalog::slovak()), Duration::from_secs(300));
    let mapping = registry.map_placeholder_to_variable("customer.fullName", "").unwrap();
    let json = serde_json::to_value(&mapping).unwrap();

    assert_eq!(json["method"], "exact_key_match");
    assert_eq!(json["confidence"], 1.0);
    assert_eq!(json["variable"]["key"], "customer.fullName");
    assert!(json["variable"]["blockId"].is_number());
    assert_eq!(json["variable"]["dataType"], "text");
    assert!(json["variable"]["labelEn"].is_string());

    let analysis = registry.analyze_text("Otec dieťaťa podpísal zmluvu").unwrap();
    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["detectedBlocks"][0]["block"]["code"], "father");
    assert!(json["detectedBlocks"][0]["score"].is_number());
    assert!(json["suggestedVariables"][0]["confidence"].is_number());
}
