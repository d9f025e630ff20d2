//! Enumeration store collaborators.
//!
//! A store exposes two panels, one per field shape:
//! - [`EnumPanel`] for ordered fields (priority, severity, resolution,
//!   ticket type), whose values carry a 1-based display position
//! - [`ComponentPanel`] for components, which are `(name, owner)` pairs
//!
//! Every call either succeeds or fails immediately. Implementations provide
//! no transactions across calls; the reconciler relies on that to leave
//! partially applied changes in place when a later call fails.

pub mod memory;

use serde::Serialize;

use crate::field::{EnumField, FieldName};

pub use memory::{MemoryStore, StoreCall};

/// One stored value of an ordered field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumEntry {
    pub name: String,
    pub position: u32,
}

/// One stored component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentEntry {
    pub name: String,
    pub owner: String,
}

/// Errors reported by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{field} value '{label}' does not exist")]
    NotFound { field: FieldName, label: String },

    #[error("{field} value '{label}' already exists")]
    AlreadyExists { field: FieldName, label: String },

    /// The store refused the change for a reason of its own.
    #[error("{field} value '{label}' rejected: {reason}")]
    Rejected {
        field: FieldName,
        label: String,
        reason: String,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Store operations for ordered fields.
pub trait EnumPanel {
    /// Current values ordered by position, ties broken by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn list_enum(&self, field: EnumField) -> Result<Vec<EnumEntry>, StoreError>;

    /// Delete a value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the value is not stored.
    fn remove_enum(&mut self, field: EnumField, label: &str) -> Result<(), StoreError>;

    /// Append a value after the current last position.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if the value is already stored.
    fn add_enum(&mut self, field: EnumField, label: &str) -> Result<(), StoreError>;

    /// Move a value to a new display position.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the value is not stored.
    fn set_enum_position(
        &mut self,
        field: EnumField,
        label: &str,
        position: u32,
    ) -> Result<(), StoreError>;
}

/// Store operations for components.
pub trait ComponentPanel {
    /// Current components ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn list_components(&self) -> Result<Vec<ComponentEntry>, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the component is not stored.
    fn remove_component(&mut self, name: &str) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if the component is already stored.
    fn add_component(&mut self, name: &str, owner: &str) -> Result<(), StoreError>;
}

/// A store offering both panels.
pub trait FieldStore: EnumPanel + ComponentPanel {}

impl<T: EnumPanel + ComponentPanel + ?Sized> FieldStore for T {}
