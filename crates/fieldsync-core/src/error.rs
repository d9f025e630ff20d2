use std::fmt;

use crate::config::InvalidListOption;
use crate::field::FieldName;
use crate::store::StoreError;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigSectionMissing,
    ComponentOwnerMissing,
    DuplicateValue,
    InvalidOption,
    StoreReadFailed,
    StoreRemovalFailed,
    StoreAdditionFailed,
    StorePositionFailed,
    ItemNotInDesiredOrder,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigSectionMissing => "E1001",
            Self::ComponentOwnerMissing => "E1002",
            Self::DuplicateValue => "E1003",
            Self::InvalidOption => "E1004",
            Self::StoreReadFailed => "E3001",
            Self::StoreRemovalFailed => "E3002",
            Self::StoreAdditionFailed => "E3003",
            Self::StorePositionFailed => "E3004",
            Self::ItemNotInDesiredOrder => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigSectionMissing => "Config section missing",
            Self::ComponentOwnerMissing => "Component owner missing",
            Self::DuplicateValue => "Duplicate configured value",
            Self::InvalidOption => "Field option is not a list",
            Self::StoreReadFailed => "Store read failed",
            Self::StoreRemovalFailed => "Store removal failed",
            Self::StoreAdditionFailed => "Store addition failed",
            Self::StorePositionFailed => "Store position update failed",
            Self::ItemNotInDesiredOrder => "Stored value missing from desired order",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigSectionMissing => {
                Some("Add the section to the field config, or point --config/--section at it.")
            }
            Self::ComponentOwnerMissing => {
                Some("Set component_owner next to the component list in the config section.")
            }
            Self::DuplicateValue => Some("List each value once per field."),
            Self::InvalidOption => Some(
                "Write the values as a comma-separated string or an array of strings.",
            ),
            Self::StoreReadFailed => Some("Run `fieldsync init` to create the field database."),
            Self::StoreRemovalFailed | Self::StoreAdditionFailed | Self::StorePositionFailed => {
                Some("Earlier changes in this run were kept. Fix the store and run apply again.")
            }
            Self::ItemNotInDesiredOrder => {
                Some("Retry once. If persistent, report a bug with logs.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by a reconciliation run.
///
/// Validation errors (`ConfigSectionMissing`, `ComponentOwnerMissing`,
/// `DuplicateValue`, `InvalidOption`) fire before the store is read or
/// written. Store errors
/// can fire after earlier mutations of the same field or of previous fields
/// have been applied; nothing is rolled back.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("section [{section}] not found in config")]
    ConfigSectionMissing { section: String },

    #[error("components are configured but {option} is missing in [{section}]")]
    ComponentOwnerMissing { section: String, option: String },

    #[error("{field} value '{label}' is configured more than once")]
    DuplicateValue { field: FieldName, label: String },

    #[error("{field} is not a list of values: {source}")]
    InvalidOption {
        field: FieldName,
        #[source]
        source: InvalidListOption,
    },

    #[error("failed to read current {field} values: {source}")]
    StoreReadFailed {
        field: FieldName,
        #[source]
        source: StoreError,
    },

    #[error("failed to remove {field} value '{label}': {source}")]
    StoreRemovalFailed {
        field: FieldName,
        label: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to add {field} value '{label}': {source}")]
    StoreAdditionFailed {
        field: FieldName,
        label: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to move {field} value '{label}' to position {position}: {source}")]
    StorePositionFailed {
        field: FieldName,
        label: String,
        position: u32,
        #[source]
        source: StoreError,
    },

    #[error("{field} value '{label}' is stored but absent from the configured order")]
    ItemNotInDesiredOrder { field: FieldName, label: String },
}

impl ReconcileError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ConfigSectionMissing { .. } => ErrorCode::ConfigSectionMissing,
            Self::ComponentOwnerMissing { .. } => ErrorCode::ComponentOwnerMissing,
            Self::DuplicateValue { .. } => ErrorCode::DuplicateValue,
            Self::InvalidOption { .. } => ErrorCode::InvalidOption,
            Self::StoreReadFailed { .. } => ErrorCode::StoreReadFailed,
            Self::StoreRemovalFailed { .. } => ErrorCode::StoreRemovalFailed,
            Self::StoreAdditionFailed { .. } => ErrorCode::StoreAdditionFailed,
            Self::StorePositionFailed { .. } => ErrorCode::StorePositionFailed,
            Self::ItemNotInDesiredOrder { .. } => ErrorCode::ItemNotInDesiredOrder,
        }
    }

    /// Remediation text, falling back to the code's summary.
    #[must_use]
    pub fn suggestion(&self) -> String {
        match self {
            Self::ConfigSectionMissing { section } => {
                format!("Add a [{section}] table to the field config, or pass --section.")
            }
            Self::ComponentOwnerMissing { section, option } => {
                format!("Set {option} in [{section}] next to the component list.")
            }
            _ => {
                let code = self.error_code();
                code.hint().unwrap_or_else(|| code.message()).to_string()
            }
        }
    }

    /// Returns `true` when the error fired before any store access.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ConfigSectionMissing { .. }
                | Self::ComponentOwnerMissing { .. }
                | Self::DuplicateValue { .. }
                | Self::InvalidOption { .. }
        )
    }
}
