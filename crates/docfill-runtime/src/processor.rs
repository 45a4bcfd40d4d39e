//! Template processor — one document in, one template out.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use docfill_core::{ConverterConfig, DataPaths, EngineConfig, Error, Result, ZoneConfig};
use docfill_detect::{
    detect_blanks, extract_placeholders, DetectedField, FillFieldReplacement, LabelResolver, PatternLibrary,
    TemplateField,
};
use docfill_docx::{convert_to_pdf, flat_text_layer, inject_package, DocumentBody, DocxPackage};

use crate::types::{DetectionReport, ProcessReport};

pub struct TemplateProcessor {
    labels: LabelResolver,
    patterns: PatternLibrary,
    zones: ZoneConfig,
    converter: ConverterConfig,
}

impl TemplateProcessor {
    pub fn new(labels: LabelResolver, patterns: PatternLibrary, zones: ZoneConfig, converter: ConverterConfig) -> Self {
        Self {
            labels,
            patterns,
            zones,
            converter,
        }
    }

    /// Built-in Slovak tables with default zones and converter.
    pub fn slovak() -> Self {
        Self::new(
            LabelResolver::slovak(),
            PatternLibrary::slovak(),
            ZoneConfig::default(),
            ConverterConfig::default(),
        )
    }

    /// Built-in tables plus overrides from the data directory: a label file
    /// is appended after the built-in table, a pattern file replaces the
    /// built-in library.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let paths = &config.data_paths;

        let mut labels = LabelResolver::slovak();
        if let Some(path) = DataPaths::existing(&paths.labels_file) {
            let json = std::fs::read_to_string(path)?;
            labels.extend_from_json(&json)?;
            info!("Extended label table from {} ({} entries)", path.display(), labels.len());
        }

        let patterns = match DataPaths::existing(&paths.patterns_file) {
            Some(path) => {
                let library = PatternLibrary::load(path)?;
                info!("Loaded pattern library {} ({} fields)", path.display(), library.len());
                library
            }
            None => PatternLibrary::slovak(),
        };

        Ok(Self::new(labels, patterns, config.zones, config.converter.clone()))
    }

    pub fn labels(&self) -> &LabelResolver {
        &self.labels
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    /// Run every detector over a text layer and plan the bindings.
    pub fn detect(&self, text: &str) -> DetectionReport {
        let placeholders = extract_placeholders(text);
        let blanks = detect_blanks(text, &self.labels, self.zones);
        let detected_fields = self.patterns.detect(text, self.zones);
        let replacements = rank_replacements(&placeholders, blanks, &detected_fields);

        DetectionReport {
            placeholders,
            replacements,
            detected_fields,
        }
    }

    /// Declared placeholders of a DOCX, scanned over its paragraph text.
    pub async fn extract_docx_placeholders(&self, input: &Path) -> Result<Vec<TemplateField>> {
        let package = DocxPackage::read_async(input.to_path_buf()).await?;
        Ok(extract_placeholders(&text_layer(&package)?))
    }

    /// Run the detectors over a DOCX without writing anything.
    pub async fn detect_docx(&self, input: &Path) -> Result<DetectionReport> {
        let package = DocxPackage::read_async(input.to_path_buf()).await?;
        Ok(self.detect(&text_layer(&package)?))
    }

    /// Detect fields in `input`, inject the planned bindings and write the
    /// template to `output`.
    pub async fn process_docx(&self, input: &Path, output: &Path) -> Result<ProcessReport> {
        let package = DocxPackage::read_async(input.to_path_buf()).await?;
        let detection = self.detect(&text_layer(&package)?);

        let replacements = detection.replacements.clone();
        let output_path = output.to_path_buf();
        let injection = tokio::task::spawn_blocking(move || {
            let (bytes, report) = inject_package(&package, &replacements)?;
            std::fs::write(&output_path, bytes)?;
            Ok::<_, Error>(report)
        })
        .await
        .map_err(|e| Error::Internal(format!("inject task failed: {}", e)))??;

        info!(
            "Processed {}: {} declared, {} planned, {} injected -> {}",
            input.display(),
            detection.placeholders.len(),
            detection.replacements.len(),
            injection.injected.len(),
            output.display()
        );
        Ok(ProcessReport { detection, injection })
    }

    /// Render a DOCX to PDF with the configured converter.
    pub async fn export_pdf(&self, docx: &Path, out_dir: &Path) -> Result<PathBuf> {
        convert_to_pdf(&self.converter, docx, out_dir).await
    }
}

fn text_layer(package: &DocxPackage) -> Result<String> {
    let xml = package.main_document_xml()?;
    Ok(match DocumentBody::parse(&xml) {
        Ok(body) => body.text_layer(),
        Err(e) => {
            warn!("Document XML not well-formed ({}), using flat text layer", e);
            flat_text_layer(&xml)
        }
    })
}

/// Blanks first, then filled-in values. Keys already declared in the
/// document, or bound by an earlier candidate, are skipped.
fn rank_replacements(
    declared: &[TemplateField],
    blanks: Vec<FillFieldReplacement>,
    detected: &[DetectedField],
) -> Vec<FillFieldReplacement> {
    let mut bound: HashSet<String> = declared.iter().map(|f| f.name.clone()).collect();
    let mut plan = Vec::new();

    for candidate in blanks.into_iter().chain(detected.iter().map(FillFieldReplacement::from)) {
        if bound.insert(candidate.placeholder.clone()) {
            plan.push(candidate);
        } else {
            debug!("Key {} already bound, dropping candidate '{}'", candidate.placeholder, candidate.original);
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONTRACT: &str = "ZMLUVA O UCHOVANÍ\n\
        Klientka: {{customer.fullName}}\n\
        rodné číslo: 900315/1234\n\
        Otec: ...........\n\
        IBAN: ________________";

    #[test]
    fn test_detect_plans_blanks_then_values() {
        let report = TemplateProcessor::slovak().detect(CONTRACT);

        assert_eq!(report.placeholders.len(), 1);
        let keys: Vec<&str> = report.replacements.iter().map(|r| r.placeholder.as_str()).collect();
        assert_eq!(keys, vec!["father.fullName", "customer.IBAN", "customer.personalId"]);
        assert_eq!(report.replacements[0].original, "...........");
        assert_eq!(report.replacements[2].original, "900315/1234");
        assert!(report.detected_fields.iter().all(|f| f.confidence == 0.9));
    }

    #[test]
    fn test_rank_skips_declared_and_repeated_keys() {
        let declared = vec![TemplateField {
            name: "customer.IBAN".into(),
            field_type: docfill_detect::FieldType::Text,
            required: true,
        }];
        let blank = |original: &str, key: &str, line| FillFieldReplacement {
            original: original.into(),
            placeholder: key.into(),
            label: Some("x".into()),
            line_index: line,
        };
        let detected = vec![DetectedField {
            original: "Ján Novák".into(),
            placeholder: "father.fullName".into(),
            label: "Otec".into(),
            context: String::new(),
            confidence: 0.9,
            line_index: 4,
        }];

        let plan = rank_replacements(
            &declared,
            vec![blank("....", "customer.IBAN", 0), blank("____", "father.fullName", 1)],
            &detected,
        );
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].original, "____");
    }

    #[test]
    fn test_from_config_overrides() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::from_env(dir.path()).unwrap();
        std::fs::write(
            &config.data_paths.labels_file,
            r#"{"locale":"cs","entries":[{"label":"jméno dítěte","placeholder":"child.fullName"}]}"#,
        )
        .unwrap();

        let processor = TemplateProcessor::from_config(&config).unwrap();
        assert_eq!(processor.labels().resolve("Jméno dítěte"), Some("child.fullName"));
        assert!(processor.labels().locales().iter().any(|l| l == "cs"));
        assert!(!processor.patterns().is_empty());

        std::fs::write(&config.data_paths.patterns_file, r#"{"fields":[{"placeholder":"x.y","label":"Y","patterns":["(["]}]}"#)
            .unwrap();
        assert!(matches!(TemplateProcessor::from_config(&config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_export_pdf_without_converter() {
        let dir = TempDir::new().unwrap();
        let docx = dir.path().join("a.docx");
        std::fs::write(&docx, b"PK").unwrap();
        let converter = ConverterConfig {
            soffice: dir.path().join("missing-soffice"),
            timeout_secs: 5,
        };
        let processor = TemplateProcessor::new(
            LabelResolver::slovak(),
            PatternLibrary::slovak(),
            ZoneConfig::default(),
            converter,
        );
        let err = processor.export_pdf(&docx, dir.path()).await.unwrap_err();
        assert!(err.is_environment());
    }
}
