//! SQLite-backed catalog store.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use tracing::info;

use docfill_core::{Error, Result};

use crate::schema::SCHEMA_SQL;
use crate::source::CatalogSource;
use crate::types::*;

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

pub struct SqliteCatalog {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteCatalog {
    /// Open or create the catalog database at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Open and, if the catalog has no blocks yet, seed it.
    pub fn open_seeded(db_path: impl AsRef<Path>, seed: &CatalogData) -> Result<Self> {
        let catalog = Self::open(db_path)?;
        if catalog.count_blocks()? == 0 {
            catalog.replace_all(seed)?;
        }
        let (blocks, variables) = (catalog.count_blocks()?, catalog.count_variables()?);
        info!(
            "SqliteCatalog initialized: {} blocks, {} variables, path={}",
            blocks,
            variables,
            catalog.db_path.display()
        );
        Ok(catalog)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        Ok(conn)
    }

    /// Replace the whole catalog in one transaction.
    pub fn replace_all(&self, data: &CatalogData) -> Result<()> {
        data.validate()?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        tx.execute_batch(
            "DELETE FROM variable_keywords;
             DELETE FROM variables;
             DELETE FROM variable_blocks;",
        )
        .map_err(db_err)?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO variable_blocks (id, code, display_name, display_name_en, icon, priority)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(db_err)?;
            for b in &data.blocks {
                stmt.execute(params![b.id, b.code, b.display_name, b.display_name_en, b.icon, b.priority])
                    .map_err(db_err)?;
            }

            let mut stmt = tx
                .prepare(
                    "INSERT INTO variables (id, key, block_id, label, label_en, data_type, example, priority)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .map_err(db_err)?;
            for v in &data.variables {
                stmt.execute(params![
                    v.id,
                    v.key,
                    v.block_id,
                    v.label,
                    v.label_en,
                    v.data_type.as_str(),
                    v.example,
                    v.priority
                ])
                .map_err(db_err)?;
            }

            let mut stmt = tx
                .prepare(
                    "INSERT INTO variable_keywords (block_id, keyword, locale, weight)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(db_err)?;
            for k in &data.keywords {
                stmt.execute(params![k.block_id, k.keyword, k.locale, k.weight])
                    .map_err(db_err)?;
            }
        }

        tx.commit().map_err(db_err)?;
        info!(
            "Catalog replaced: {} blocks, {} variables, {} keywords",
            data.blocks.len(),
            data.variables.len(),
            data.keywords.len()
        );
        Ok(())
    }

    pub fn count_blocks(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM variable_blocks")
    }

    pub fn count_variables(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM variables")
    }

    fn count(&self, sql: &str) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row(sql, [], |row| row.get(0)).map_err(db_err)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn row_to_block(row: &Row<'_>) -> rusqlite::Result<VariableBlock> {
        Ok(VariableBlock {
            id: row.get("id")?,
            code: row.get("code")?,
            display_name: row.get("display_name")?,
            display_name_en: row.get("display_name_en")?,
            icon: row.get("icon")?,
            priority: row.get("priority")?,
        })
    }

    fn row_to_variable(row: &Row<'_>) -> rusqlite::Result<Variable> {
        let data_type: String = row.get("data_type")?;
        Ok(Variable {
            id: row.get("id")?,
            key: row.get("key")?,
            block_id: row.get("block_id")?,
            label: row.get("label")?,
            label_en: row.get("label_en")?,
            data_type: DataType::parse(&data_type),
            example: row.get("example")?,
            priority: row.get("priority")?,
        })
    }

    fn row_to_keyword(row: &Row<'_>) -> rusqlite::Result<VariableKeyword> {
        Ok(VariableKeyword {
            block_id: row.get("block_id")?,
            keyword: row.get("keyword")?,
            locale: row.get("locale")?,
            weight: row.get("weight")?,
        })
    }
}

impl CatalogSource for SqliteCatalog {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn load(&self) -> Result<CatalogData> {
        let conn = self.conn.lock();

        let blocks = conn
            .prepare_cached("SELECT * FROM variable_blocks ORDER BY priority, code")
            .map_err(db_err)?
            .query_map([], Self::row_to_block)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        let variables = conn
            .prepare_cached("SELECT * FROM variables ORDER BY block_id, priority, key")
            .map_err(db_err)?
            .query_map([], Self::row_to_variable)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        let keywords = conn
            .prepare_cached("SELECT * FROM variable_keywords ORDER BY id")
            .map_err(db_err)?
            .query_map([], Self::row_to_keyword)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        let data = CatalogData {
            blocks,
            variables,
            keywords,
        };
        data.validate()?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticCatalog;
    use tempfile::TempDir;

    #[test]
    fn test_seed_and_load() {
        let dir = TempDir::new().unwrap();
        let seed = StaticCatalog::slovak().load().unwrap();
        let catalog = SqliteCatalog::open_seeded(dir.path().join("catalog.db"), &seed).unwrap();

        let data = catalog.load().unwrap();
        assert_eq!(data.blocks.len(), seed.blocks.len());
        assert_eq!(data.variables.len(), seed.variables.len());
        assert_eq!(data.keywords.len(), seed.keywords.len());
        let iban = data.variables.iter().find(|v| v.key == "customer.IBAN").unwrap();
        assert_eq!(iban.data_type, DataType::Iban);
    }

    #[test]
    fn test_existing_catalog_not_reseeded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.db");
        let small = CatalogData::from_json(
            r#"{"blocks":[{"code":"pet","displayName":"Zviera","displayNameEn":"Pet",
                "variables":[{"key":"pet.name","label":"Meno"}]}]}"#,
        )
        .unwrap();
        SqliteCatalog::open_seeded(&path, &small).unwrap();

        let full = StaticCatalog::slovak().load().unwrap();
        let reopened = SqliteCatalog::open_seeded(&path, &full).unwrap();
        assert_eq!(reopened.count_blocks().unwrap(), 1);
        assert_eq!(reopened.load().unwrap().variables[0].key, "pet.name");
    }

    #[test]
    fn test_replace_all_rejects_invalid_data() {
        let dir = TempDir::new().unwrap();
        let catalog = SqliteCatalog::open(dir.path().join("catalog.db")).unwrap();
        let mut data = StaticCatalog::slovak().load().unwrap();
        data.variables[0].key = "wrong.prefix".into();
        assert!(matches!(catalog.replace_all(&data), Err(Error::Config(_))));
        assert_eq!(catalog.count_blocks().unwrap(), 0);
    }
}
