//! Docfill Registry — the variable catalog (blocks, variables, keywords)
//! behind a refreshable snapshot cache.

pub mod cache;
pub mod registry;
pub mod schema;
pub mod snapshot;
pub mod source;
pub mod sqlite;
pub mod types;

pub use cache::{CacheStats, CatalogCache};
pub use registry::{
    VariableRegistry, BLOCK_FIELD_CONFIDENCE, CONTEXT_SUGGESTION_CONFIDENCE, EXACT_MATCH_CONFIDENCE,
    LABEL_MATCH_CONFIDENCE,
};
pub use snapshot::CatalogSnapshot;
pub use source::{CatalogSource, StaticCatalog};
pub use sqlite::SqliteCatalog;
pub use types::*;
