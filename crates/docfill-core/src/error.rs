//! Error types for the docfill engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A required part of the document package is missing or unusable.
    #[error("Document structure error: {0}")]
    DocumentStructure(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The external converter binary could not be started.
    #[error("Converter unavailable: {0}")]
    ConverterUnavailable(String),

    /// The converter ran but rejected the input document.
    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Conversion timed out after {0}s")]
    ConversionTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Localized (Slovak) message suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::DocumentStructure(_) => {
                "Dokument nemá očakávanú štruktúru: chýba hlavné telo dokumentu."
            }
            Error::Archive(_) => "Súbor DOCX sa nepodarilo otvoriť alebo uložiť.",
            Error::Xml(_) => "Obsah dokumentu sa nepodarilo spracovať.",
            Error::Database(_) => "Katalóg premenných momentálne nie je dostupný.",
            Error::NotFound(_) => "Požadovaný súbor alebo záznam neexistuje.",
            Error::Config(_) => "Konfigurácia aplikácie je neplatná alebo chýba.",
            Error::ConverterUnavailable(_) => {
                "Konverzia do PDF nie je dostupná. Skontrolujte inštaláciu LibreOffice."
            }
            Error::Conversion(_) => "Dokument sa nepodarilo skonvertovať do PDF.",
            Error::ConversionTimeout(_) => "Konverzia do PDF trvala príliš dlho a bola prerušená.",
            Error::Io(_) => "Pri práci so súborom nastala chyba.",
            Error::Json(_) => "Dátový súbor má neplatný formát.",
            Error::Internal(_) => "Nastala neočakávaná chyba.",
        }
    }

    /// True when the failure comes from a missing or broken environment
    /// (configuration, converter install, catalog database) rather than from
    /// the document the caller supplied.
    pub fn is_environment(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::ConverterUnavailable(_) | Error::Database(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_vs_input_errors() {
        assert!(Error::ConverterUnavailable("soffice".into()).is_environment());
        assert!(Error::Config("bad ttl".into()).is_environment());
        assert!(!Error::DocumentStructure("word/document.xml".into()).is_environment());
        assert!(!Error::Conversion("exit 1".into()).is_environment());
    }

    #[test]
    fn test_user_message_is_localized() {
        let err = Error::ConversionTimeout(120);
        assert!(err.user_message().contains("PDF"));
        assert_eq!(err.to_string(), "Conversion timed out after 120s");
    }
}
