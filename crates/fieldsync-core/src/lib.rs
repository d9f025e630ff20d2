//! fieldsync-core library.
//!
//! Reconciles ticket field enumerations (priority, severity, resolution,
//! ticket type, and components with owners) held in an enumeration store
//! against the desired values declared in configuration.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums at library seams ([`error::ReconcileError`],
//!   [`store::StoreError`]); `anyhow::Result` for file and database setup.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod db;
pub mod diff;
pub mod error;
pub mod field;
pub mod reconcile;
pub mod store;

pub use config::{ConfigSource, InvalidListOption, TomlConfig};
pub use diff::{ChangeRecord, OrderMismatch};
pub use error::{ErrorCode, ReconcileError};
pub use field::{EnumField, FieldName, ManagedField};
pub use reconcile::{ReconcileReport, Reconciler};
pub use store::{FieldStore, StoreError};
