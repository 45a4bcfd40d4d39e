//! docfill core — shared error type and engine configuration.

pub mod config;
pub mod error;

pub use config::{ConverterConfig, DataPaths, EngineConfig, ZoneConfig};
pub use error::{Error, Result};
