use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The five ticket fields whose values are managed from configuration.
///
/// Declaration order is the processing order used by the reconciler and the
/// key order of serialized reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Priority,
    Severity,
    Resolution,
    TicketType,
    Component,
}

/// Every managed field, in processing order.
pub const MANAGED_FIELDS: [FieldName; 5] = [
    FieldName::Priority,
    FieldName::Severity,
    FieldName::Resolution,
    FieldName::TicketType,
    FieldName::Component,
];

impl FieldName {
    /// Configuration option name for this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Severity => "severity",
            Self::Resolution => "resolution",
            Self::TicketType => "ticket_type",
            Self::Component => "component",
        }
    }
}

/// Ordered enumeration fields: values have a 1-based display position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumField {
    Priority,
    Severity,
    Resolution,
    TicketType,
}

impl EnumField {
    pub const ALL: [Self; 4] = [
        Self::Priority,
        Self::Severity,
        Self::Resolution,
        Self::TicketType,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.name().as_str()
    }

    #[must_use]
    pub const fn name(self) -> FieldName {
        match self {
            Self::Priority => FieldName::Priority,
            Self::Severity => FieldName::Severity,
            Self::Resolution => FieldName::Resolution,
            Self::TicketType => FieldName::TicketType,
        }
    }
}

/// A field together with the store capabilities it needs.
///
/// Resolved once from a [`FieldName`]; the reconciler matches on the variant
/// instead of comparing field names at every store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedField {
    /// Ordered labels: list, add, remove, set position.
    Simple(EnumField),
    /// `(name, owner)` pairs without a meaningful order.
    Component,
}

impl ManagedField {
    #[must_use]
    pub const fn name(self) -> FieldName {
        match self {
            Self::Simple(field) => field.name(),
            Self::Component => FieldName::Component,
        }
    }
}

impl From<FieldName> for ManagedField {
    fn from(name: FieldName) -> Self {
        match name {
            FieldName::Priority => Self::Simple(EnumField::Priority),
            FieldName::Severity => Self::Simple(EnumField::Severity),
            FieldName::Resolution => Self::Simple(EnumField::Resolution),
            FieldName::TicketType => Self::Simple(EnumField::TicketType),
            FieldName::Component => Self::Component,
        }
    }
}

impl From<EnumField> for ManagedField {
    fn from(field: EnumField) -> Self {
        Self::Simple(field)
    }
}

/// Error returned when parsing a field name from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFieldError {
    pub got: String,
}

impl fmt::Display for ParseFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid field: '{}' (expected one of priority, severity, resolution, ticket_type, component)",
            self.got
        )
    }
}

impl std::error::Error for ParseFieldError {}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EnumField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace('-', "_")
}

impl FromStr for FieldName {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "priority" => Ok(Self::Priority),
            "severity" => Ok(Self::Severity),
            "resolution" => Ok(Self::Resolution),
            "ticket_type" | "type" => Ok(Self::TicketType),
            "component" => Ok(Self::Component),
            _ => Err(ParseFieldError { got: s.to_string() }),
        }
    }
}

impl FromStr for EnumField {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match ManagedField::from(FieldName::from_str(s)?) {
            ManagedField::Simple(field) => Ok(field),
            ManagedField::Component => Err(ParseFieldError { got: s.to_string() }),
        }
    }
}
