//! SQLite schema for the field store.
//!
//! - `enum_values` holds the ordered fields, one row per `(field, name)`
//!   with its display `position`
//! - `components` holds component names with their owner
//! - `store_meta` tracks the schema version applied to this database

/// Migration v1: value tables, the position index, and store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS enum_values (
    field TEXT NOT NULL CHECK (field IN ('priority', 'severity', 'resolution', 'ticket_type')),
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    position INTEGER NOT NULL CHECK (position > 0),
    PRIMARY KEY (field, name)
);

CREATE TABLE IF NOT EXISTS components (
    name TEXT PRIMARY KEY CHECK (length(trim(name)) > 0),
    owner TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    seeded_at_us INTEGER
);

CREATE INDEX IF NOT EXISTS idx_enum_values_field_position
    ON enum_values(field, position, name);

INSERT OR IGNORE INTO store_meta (id, schema_version, seeded_at_us)
VALUES (1, 1, NULL);
";

/// Indexes expected by listing query paths.
pub const REQUIRED_INDEXES: &[&str] = &["idx_enum_values_field_position"];
