//! Pure diff between stored and configured values of one field.
//!
//! The diff never touches a store. For the same inputs it always produces the
//! same record, with `added` in configured order and `removed` in stored
//! order, so serialized reports are byte-stable across runs.

use serde::ser::{Serialize, Serializer};
use std::collections::HashSet;

use crate::field::ManagedField;

/// A display position where stored and configured values disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMismatch {
    /// 1-based position of the mismatch.
    pub position: u32,
    /// Value currently stored at this position.
    pub current: String,
    /// Value configured for this position.
    pub desired: String,
}

/// Serialized as a `[current, desired]` pair.
impl Serialize for OrderMismatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.current, &self.desired).serialize(serializer)
    }
}

/// What changed (or would change) for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ChangeRecord {
    #[serde(rename = "Added")]
    pub added: Vec<String>,
    #[serde(rename = "Removed")]
    pub removed: Vec<String>,
    #[serde(rename = "Reordered")]
    pub reordered: Vec<OrderMismatch>,
}

impl ChangeRecord {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.reordered.is_empty()
    }
}

/// Compute the change needed to turn `current` into `desired`.
///
/// Membership is compared as sets. For ordered fields the order delta
/// compares both lists position by position up to the shorter length; the
/// tail of the longer list is never reported as a mismatch, since those
/// values already show up as additions or removals. Components never report
/// an order delta.
#[must_use]
pub fn diff_field(field: ManagedField, current: &[String], desired: &[String]) -> ChangeRecord {
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
    let desired_set: HashSet<&str> = desired.iter().map(String::as_str).collect();

    let added = desired
        .iter()
        .filter(|label| !current_set.contains(label.as_str()))
        .cloned()
        .collect();
    let removed = current
        .iter()
        .filter(|label| !desired_set.contains(label.as_str()))
        .cloned()
        .collect();

    let reordered = match field {
        ManagedField::Simple(_) => order_mismatches(current, desired),
        ManagedField::Component => Vec::new(),
    };

    ChangeRecord {
        added,
        removed,
        reordered,
    }
}

fn order_mismatches(current: &[String], desired: &[String]) -> Vec<OrderMismatch> {
    current
        .iter()
        .zip(desired)
        .zip(1_u32..)
        .filter(|((cur, want), _)| cur != want)
        .map(|((cur, want), position)| OrderMismatch {
            position,
            current: cur.clone(),
            desired: want.clone(),
        })
        .collect()
}
