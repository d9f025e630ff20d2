//! SQLite-backed field store.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so readers are not blocked while a run writes
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `foreign_keys = ON`

pub mod migrations;
pub mod schema;
pub mod seed;
pub mod store;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

pub use store::SqliteStore;

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the store database, apply runtime pragmas, and migrate
/// schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store db directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open store database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;

    Ok(conn)
}

/// Open an existing store database without creating it.
///
/// Returns `Ok(None)` when no database file exists at `path`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be opened or migrated.
pub fn try_open_connection(path: &Path) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }
    open_connection(path).map(Some)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}
