use anyhow::Result;
use rusqlite::{Connection, ErrorCode as SqliteCode, OptionalExtension, params};
use std::path::Path;
use tracing::debug;

use super::{open_connection, seed, try_open_connection};
use crate::field::{EnumField, FieldName};
use crate::store::{ComponentEntry, ComponentPanel, EnumEntry, EnumPanel, StoreError};

/// Field store persisted in a SQLite database.
///
/// Every call runs as its own statement; a failing call leaves the effects
/// of earlier calls in place.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(open_connection(path)?))
    }

    /// Open the store at `path` only if its database file already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be opened or migrated.
    pub fn open_existing(path: &Path) -> Result<Option<Self>> {
        Ok(try_open_connection(path)?.map(Self::new))
    }

    /// Wrap an already-migrated connection.
    #[must_use]
    pub const fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open a migrated store that lives only in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be migrated.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        super::migrations::migrate(&mut conn)?;
        Ok(Self::new(conn))
    }

    /// Write the stock values into an empty store.
    ///
    /// Returns `true` when defaults were written, `false` if the store
    /// already held values.
    ///
    /// # Errors
    ///
    /// Returns an error if the seed transaction fails.
    pub fn seed_defaults(&mut self) -> Result<bool, StoreError> {
        Ok(seed::seed_defaults(&mut self.conn)?)
    }

    fn enum_exists(&self, field: EnumField, label: &str) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM enum_values WHERE field = ?1 AND name = ?2",
                params![field.as_str(), label],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn component_exists(&self, name: &str) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM components WHERE name = ?1",
                [name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

/// Map constraint failures on insert to a store rejection.
fn insert_error(field: FieldName, label: &str, error: rusqlite::Error) -> StoreError {
    match error.sqlite_error_code() {
        Some(SqliteCode::ConstraintViolation) => StoreError::Rejected {
            field,
            label: label.to_string(),
            reason: error.to_string(),
        },
        _ => StoreError::Sqlite(error),
    }
}

impl EnumPanel for SqliteStore {
    fn list_enum(&self, field: EnumField) -> Result<Vec<EnumEntry>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT name, position
             FROM enum_values
             WHERE field = ?1
             ORDER BY position ASC, name ASC",
        )?;
        let rows = stmt.query_map([field.as_str()], |row| {
            Ok(EnumEntry {
                name: row.get(0)?,
                position: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn remove_enum(&mut self, field: EnumField, label: &str) -> Result<(), StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM enum_values WHERE field = ?1 AND name = ?2",
            params![field.as_str(), label],
        )?;
        if deleted == 0 {
            return Err(StoreError::NotFound {
                field: field.name(),
                label: label.to_string(),
            });
        }
        debug!(%field, label, "removed enum value");
        Ok(())
    }

    fn add_enum(&mut self, field: EnumField, label: &str) -> Result<(), StoreError> {
        if self.enum_exists(field, label)? {
            return Err(StoreError::AlreadyExists {
                field: field.name(),
                label: label.to_string(),
            });
        }
        self.conn
            .execute(
                "INSERT INTO enum_values (field, name, position)
                 SELECT ?1, ?2, COALESCE(MAX(position), 0) + 1
                 FROM enum_values
                 WHERE field = ?1",
                params![field.as_str(), label],
            )
            .map_err(|error| insert_error(field.name(), label, error))?;
        debug!(%field, label, "added enum value");
        Ok(())
    }

    fn set_enum_position(
        &mut self,
        field: EnumField,
        label: &str,
        position: u32,
    ) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE enum_values SET position = ?3 WHERE field = ?1 AND name = ?2",
            params![field.as_str(), label, position],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound {
                field: field.name(),
                label: label.to_string(),
            });
        }
        Ok(())
    }
}

impl ComponentPanel for SqliteStore {
    fn list_components(&self) -> Result<Vec<ComponentEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT name, owner FROM components ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(ComponentEntry {
                name: row.get(0)?,
                owner: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn remove_component(&mut self, name: &str) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM components WHERE name = ?1", [name])?;
        if deleted == 0 {
            return Err(StoreError::NotFound {
                field: FieldName::Component,
                label: name.to_string(),
            });
        }
        debug!(component = name, "removed component");
        Ok(())
    }

    fn add_component(&mut self, name: &str, owner: &str) -> Result<(), StoreError> {
        if self.component_exists(name)? {
            return Err(StoreError::AlreadyExists {
                field: FieldName::Component,
                label: name.to_string(),
            });
        }
        self.conn
            .execute(
                "INSERT INTO components (name, owner) VALUES (?1, ?2)",
                params![name, owner],
            )
            .map_err(|error| insert_error(FieldName::Component, name, error))?;
        debug!(component = name, owner, "added component");
        Ok(())
    }
}
