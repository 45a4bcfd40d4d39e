//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lines at the top of a document treated as the header zone.
pub const DEFAULT_HEADER_LINES: usize = 40;
/// Lines at the bottom of a document treated as the signature zone.
pub const DEFAULT_SIGNATURE_LINES: usize = 50;
/// Catalog cache lifetime.
pub const DEFAULT_CATALOG_TTL_SECS: u64 = 300;
/// Hard limit for one external conversion attempt.
pub const DEFAULT_CONVERT_TIMEOUT_SECS: u64 = 120;

/// Paths to the engine's data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite catalog database (`data/catalog.db`).
    pub catalog_db: PathBuf,
    /// Catalog seed file (`data/catalog.json`).
    pub catalog_seed: PathBuf,
    /// Label → placeholder table override (`data/labels.json`).
    pub labels_file: PathBuf,
    /// Field pattern library override (`data/patterns.json`).
    pub patterns_file: PathBuf,
    /// Generated templates and PDFs (`data/output/`).
    pub output: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            catalog_db: root.join("catalog.db"),
            catalog_seed: root.join("catalog.json"),
            labels_file: root.join("labels.json"),
            patterns_file: root.join("patterns.json"),
            output: root.join("output"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.output)?;
        Ok(())
    }

    /// Returns `path` only if the file exists, so callers can fall back to
    /// the embedded defaults.
    pub fn existing(path: &Path) -> Option<&Path> {
        path.is_file().then_some(path)
    }
}

/// Line-count zones in which blank and field detection is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub header_lines: usize,
    pub signature_lines: usize,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            header_lines: DEFAULT_HEADER_LINES,
            signature_lines: DEFAULT_SIGNATURE_LINES,
        }
    }
}

/// External office converter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path or name of the `soffice` binary.
    pub soffice: PathBuf,
    pub timeout_secs: u64,
}

impl ConverterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            soffice: PathBuf::from("soffice"),
            timeout_secs: DEFAULT_CONVERT_TIMEOUT_SECS,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub data_paths: DataPaths,
    pub zones: ZoneConfig,
    pub catalog_ttl_secs: u64,
    pub converter: ConverterConfig,
}

impl EngineConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let zones = ZoneConfig {
            header_lines: env_parse("DOCFILL_HEADER_LINES").unwrap_or(DEFAULT_HEADER_LINES),
            signature_lines: env_parse("DOCFILL_SIGNATURE_LINES")
                .unwrap_or(DEFAULT_SIGNATURE_LINES),
        };

        let converter = ConverterConfig {
            soffice: std::env::var("DOCFILL_SOFFICE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("soffice")),
            timeout_secs: env_parse("DOCFILL_CONVERT_TIMEOUT_SECS")
                .unwrap_or(DEFAULT_CONVERT_TIMEOUT_SECS),
        };

        Ok(Self {
            data_paths: DataPaths::new(data_dir)?,
            zones,
            catalog_ttl_secs: env_parse("DOCFILL_CATALOG_TTL_SECS")
                .unwrap_or(DEFAULT_CATALOG_TTL_SECS),
            converter,
        })
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_data_paths_layout() {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths::new(dir.path().join("data")).unwrap();
        assert!(paths.output.is_dir());
        assert_eq!(paths.catalog_db.file_name().unwrap(), "catalog.db");
        assert!(DataPaths::existing(&paths.labels_file).is_none());
    }

    #[test]
    fn test_zone_defaults() {
        let zones = ZoneConfig::default();
        assert_eq!(zones.header_lines, 40);
        assert_eq!(zones.signature_lines, 50);
        assert_eq!(ConverterConfig::default().timeout(), Duration::from_secs(120));
    }
}
