//! Runtime processor — turns one contract document into a template.
//!
//! Coordinates the detectors and the DOCX injector for a single request and
//! returns a serializable report of what was found and changed.

pub mod processor;
pub mod types;

pub use processor::TemplateProcessor;
pub use types::*;
