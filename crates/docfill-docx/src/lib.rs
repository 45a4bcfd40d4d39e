//! DOCX handling: package I/O, a paragraph-aware view of the main document
//! part, placeholder injection, and the external PDF converter.

pub mod body;
pub mod cleanup;
pub mod convert;
pub mod inject;
pub mod package;
pub mod xml;

pub use body::{flat_text_layer, DocumentBody};
pub use cleanup::cleanup_placeholders;
pub use convert::convert_to_pdf;
pub use inject::{inject_docx, inject_into_xml, inject_package, InjectedField, InjectionMode, InjectionReport, MatchKind};
pub use package::{DocxPackage, MAIN_DOCUMENT_PART};
