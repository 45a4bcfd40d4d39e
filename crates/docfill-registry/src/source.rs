//! Catalog sources.
//!
//! The registry never talks to storage directly; it asks a `CatalogSource`
//! for a full set of rows whenever its cached snapshot expires.
//! Implementations:
//! - `SqliteCatalog`: rusqlite-backed store (see `sqlite.rs`)
//! - `StaticCatalog`: in-memory rows, from the embedded seed or a JSON file

use std::path::Path;

use once_cell::sync::Lazy;

use docfill_core::Result;

use crate::types::CatalogData;

const SLOVAK_SEED: &str = include_str!("../data/catalog.sk.json");

static SLOVAK: Lazy<CatalogData> =
    Lazy::new(|| CatalogData::from_json(SLOVAK_SEED).expect("embedded catalog seed is valid"));

pub trait CatalogSource: Send + Sync {
    /// Short name for logs and stats.
    fn name(&self) -> &str;

    /// Load every block, variable and keyword.
    fn load(&self) -> Result<CatalogData>;
}

pub struct StaticCatalog {
    data: CatalogData,
}

impl StaticCatalog {
    pub fn new(data: CatalogData) -> Result<Self> {
        data.validate()?;
        Ok(Self { data })
    }

    /// The built-in Slovak catalog.
    pub fn slovak() -> Self {
        Self { data: SLOVAK.clone() }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self {
            data: CatalogData::from_json(&json)?,
        })
    }

    pub fn data(&self) -> &CatalogData {
        &self.data
    }
}

impl CatalogSource for StaticCatalog {
    fn name(&self) -> &str {
        "static"
    }

    fn load(&self) -> Result<CatalogData> {
        Ok(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_seed_is_complete() {
        let data = StaticCatalog::slovak().load().unwrap();
        assert!(data.variables.iter().any(|v| v.key == "customer.fullName"));
        assert!(data.variables.iter().any(|v| v.key == "father.fullName"));
        assert!(data.blocks.iter().any(|b| b.code == "child"));
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"blocks":[{"code":"pet","displayName":"Zviera","displayNameEn":"Pet",
                "variables":[{"key":"pet.name","label":"Meno zvieraťa"}]}]}"#,
        )
        .unwrap();
        let catalog = StaticCatalog::load_file(&path).unwrap();
        assert_eq!(catalog.data().variables[0].key, "pet.name");
        assert_eq!(catalog.name(), "static");
    }
}
