//! Catalog schema SQL.

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS variable_blocks (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    display_name_en TEXT NOT NULL DEFAULT '',
    icon TEXT,
    priority INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS variables (
    id INTEGER PRIMARY KEY,
    key TEXT NOT NULL UNIQUE,
    block_id INTEGER NOT NULL REFERENCES variable_blocks(id) ON DELETE CASCADE,
    label TEXT NOT NULL,
    label_en TEXT NOT NULL DEFAULT '',
    data_type TEXT NOT NULL DEFAULT 'text',
    example TEXT,
    priority INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS variable_keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    block_id INTEGER NOT NULL REFERENCES variable_blocks(id) ON DELETE CASCADE,
    keyword TEXT NOT NULL,
    locale TEXT NOT NULL DEFAULT 'sk',
    weight REAL NOT NULL CHECK (weight >= 0)
);

CREATE INDEX IF NOT EXISTS idx_variables_block ON variables(block_id);
CREATE INDEX IF NOT EXISTS idx_keywords_block ON variable_keywords(block_id);
"#;
