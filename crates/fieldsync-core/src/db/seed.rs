//! Stock field values written into a freshly created store.

use chrono::Utc;
use rusqlite::{Connection, params};

use crate::field::EnumField;

/// Default values per ordered field, in display order.
pub const DEFAULT_ENUMS: &[(EnumField, &[&str])] = &[
    (
        EnumField::Priority,
        &["blocker", "critical", "major", "minor", "trivial"],
    ),
    (EnumField::Severity, &[]),
    (
        EnumField::Resolution,
        &["fixed", "invalid", "wontfix", "duplicate", "worksforme"],
    ),
    (EnumField::TicketType, &["defect", "enhancement", "task"]),
];

/// Default components with their owner.
pub const DEFAULT_COMPONENTS: &[(&str, &str)] =
    &[("component1", "somebody"), ("component2", "somebody")];

/// Insert the default values unless the store already holds any value.
///
/// Returns `true` when defaults were written.
///
/// # Errors
///
/// Returns an error if any statement fails; nothing is written in that case.
pub fn seed_defaults(conn: &mut Connection) -> rusqlite::Result<bool> {
    let existing: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM enum_values) + (SELECT COUNT(*) FROM components)",
        [],
        |row| row.get(0),
    )?;
    if existing > 0 {
        return Ok(false);
    }

    let tx = conn.transaction()?;
    for (field, labels) in DEFAULT_ENUMS {
        for (label, position) in labels.iter().zip(1_u32..) {
            tx.execute(
                "INSERT INTO enum_values (field, name, position) VALUES (?1, ?2, ?3)",
                params![field.as_str(), label, position],
            )?;
        }
    }
    for (name, owner) in DEFAULT_COMPONENTS {
        tx.execute(
            "INSERT INTO components (name, owner) VALUES (?1, ?2)",
            params![name, owner],
        )?;
    }
    tx.execute(
        "UPDATE store_meta SET seeded_at_us = ?1 WHERE id = 1",
        [Utc::now().timestamp_micros()],
    )?;
    tx.commit()?;

    Ok(true)
}
