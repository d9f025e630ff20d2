//! In-process enumeration store.
//!
//! Holds field values in memory and records every call it receives, so it
//! doubles as a spy when checking which store operations a run performed.
//! Rejections can be injected per value to exercise partial failures.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use super::{ComponentEntry, ComponentPanel, EnumEntry, EnumPanel, StoreError};
use crate::field::{EnumField, FieldName};

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListEnum(EnumField),
    RemoveEnum(EnumField, String),
    AddEnum(EnumField, String),
    SetPosition(EnumField, String, u32),
    ListComponents,
    RemoveComponent(String),
    AddComponent(String, String),
}

impl StoreCall {
    /// Returns `true` for calls that change stored state.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::ListEnum(_) | Self::ListComponents)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    enums: BTreeMap<EnumField, Vec<EnumEntry>>,
    components: BTreeMap<String, String>,
    reject_remove: HashSet<(FieldName, String)>,
    reject_add: HashSet<(FieldName, String)>,
    calls: RefCell<Vec<StoreCall>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an ordered field with positions `1..=n` in slice order.
    #[must_use]
    pub fn with_enum(mut self, field: EnumField, labels: &[&str]) -> Self {
        let entries = labels
            .iter()
            .zip(1_u32..)
            .map(|(name, position)| EnumEntry {
                name: (*name).to_string(),
                position,
            })
            .collect();
        self.enums.insert(field, entries);
        self
    }

    /// Seed an ordered field with explicit positions.
    #[must_use]
    pub fn with_positions(mut self, field: EnumField, entries: &[(&str, u32)]) -> Self {
        let entries = entries
            .iter()
            .map(|(name, position)| EnumEntry {
                name: (*name).to_string(),
                position: *position,
            })
            .collect();
        self.enums.insert(field, entries);
        self
    }

    #[must_use]
    pub fn with_components(mut self, components: &[(&str, &str)]) -> Self {
        self.components = components
            .iter()
            .map(|(name, owner)| ((*name).to_string(), (*owner).to_string()))
            .collect();
        self
    }

    /// Make the next removal of `label` from `field` fail.
    pub fn reject_removal(&mut self, field: FieldName, label: &str) {
        self.reject_remove.insert((field, label.to_string()));
    }

    /// Make the next addition of `label` to `field` fail.
    pub fn reject_addition(&mut self, field: FieldName, label: &str) {
        self.reject_add.insert((field, label.to_string()));
    }

    /// Names of an ordered field in display order, without recording a call.
    #[must_use]
    pub fn values(&self, field: EnumField) -> Vec<String> {
        self.sorted(field).into_iter().map(|e| e.name).collect()
    }

    /// Entries of an ordered field in display order, without recording a call.
    #[must_use]
    pub fn entries(&self, field: EnumField) -> Vec<EnumEntry> {
        self.sorted(field)
    }

    /// Components ordered by name, without recording a call.
    #[must_use]
    pub fn components(&self) -> Vec<ComponentEntry> {
        self.components
            .iter()
            .map(|(name, owner)| ComponentEntry {
                name: name.clone(),
                owner: owner.clone(),
            })
            .collect()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.calls.borrow().iter().filter(|c| c.is_mutation()).count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: StoreCall) {
        self.calls.borrow_mut().push(call);
    }

    fn sorted(&self, field: EnumField) -> Vec<EnumEntry> {
        let mut entries = self.enums.get(&field).cloned().unwrap_or_default();
        entries.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));
        entries
    }

    fn check_rejection(
        rejections: &mut HashSet<(FieldName, String)>,
        field: FieldName,
        label: &str,
        action: &str,
    ) -> Result<(), StoreError> {
        if rejections.remove(&(field, label.to_string())) {
            return Err(StoreError::Rejected {
                field,
                label: label.to_string(),
                reason: format!("{action} refused by store"),
            });
        }
        Ok(())
    }
}

impl EnumPanel for MemoryStore {
    fn list_enum(&self, field: EnumField) -> Result<Vec<EnumEntry>, StoreError> {
        self.record(StoreCall::ListEnum(field));
        Ok(self.sorted(field))
    }

    fn remove_enum(&mut self, field: EnumField, label: &str) -> Result<(), StoreError> {
        self.record(StoreCall::RemoveEnum(field, label.to_string()));
        Self::check_rejection(&mut self.reject_remove, field.name(), label, "removal")?;

        let entries = self.enums.entry(field).or_default();
        let before = entries.len();
        entries.retain(|e| e.name != label);
        if entries.len() == before {
            return Err(StoreError::NotFound {
                field: field.name(),
                label: label.to_string(),
            });
        }
        Ok(())
    }

    fn add_enum(&mut self, field: EnumField, label: &str) -> Result<(), StoreError> {
        self.record(StoreCall::AddEnum(field, label.to_string()));
        Self::check_rejection(&mut self.reject_add, field.name(), label, "addition")?;

        let entries = self.enums.entry(field).or_default();
        if entries.iter().any(|e| e.name == label) {
            return Err(StoreError::AlreadyExists {
                field: field.name(),
                label: label.to_string(),
            });
        }
        let position = entries.iter().map(|e| e.position).max().unwrap_or(0) + 1;
        entries.push(EnumEntry {
            name: label.to_string(),
            position,
        });
        Ok(())
    }

    fn set_enum_position(
        &mut self,
        field: EnumField,
        label: &str,
        position: u32,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::SetPosition(field, label.to_string(), position));

        let entry = self
            .enums
            .get_mut(&field)
            .and_then(|entries| entries.iter_mut().find(|e| e.name == label))
            .ok_or_else(|| StoreError::NotFound {
                field: field.name(),
                label: label.to_string(),
            })?;
        entry.position = position;
        Ok(())
    }
}

impl ComponentPanel for MemoryStore {
    fn list_components(&self) -> Result<Vec<ComponentEntry>, StoreError> {
        self.record(StoreCall::ListComponents);
        Ok(self.components())
    }

    fn remove_component(&mut self, name: &str) -> Result<(), StoreError> {
        self.record(StoreCall::RemoveComponent(name.to_string()));
        Self::check_rejection(&mut self.reject_remove, FieldName::Component, name, "removal")?;

        if self.components.remove(name).is_none() {
            return Err(StoreError::NotFound {
                field: FieldName::Component,
                label: name.to_string(),
            });
        }
        Ok(())
    }

    fn add_component(&mut self, name: &str, owner: &str) -> Result<(), StoreError> {
        self.record(StoreCall::AddComponent(name.to_string(), owner.to_string()));
        Self::check_rejection(&mut self.reject_add, FieldName::Component, name, "addition")?;

        if self.components.contains_key(name) {
            return Err(StoreError::AlreadyExists {
                field: FieldName::Component,
                label: name.to_string(),
            });
        }
        self.components.insert(name.to_string(), owner.to_string());
        Ok(())
    }
}
