//! Reconciliation of stored field values against configuration.
//!
//! A run goes through three stages:
//!
//! 1. **Validate** the configuration: the section must exist, components
//!    need an owner, and no field may list a value twice. Nothing touches
//!    the store until this passes.
//! 2. For each configured field, **diff** the stored values against the
//!    configured ones ([`diff_field`]).
//! 3. **Apply** the diff: removals, then additions, then (ordered fields
//!    only) positions. Positions are assigned after membership settles,
//!    walking the post-mutation store contents.
//!
//! Fields not mentioned in the section are skipped entirely. A field
//! configured with an empty list is authoritative and loses every value.
//!
//! Store failures are fail-fast: the first rejected call ends the run.
//! Changes already applied to earlier fields, or earlier in the same field,
//! are kept.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::{COMPONENT_OWNER_OPTION, ConfigSource, SECTION_NAME};
use crate::diff::{ChangeRecord, diff_field};
use crate::error::ReconcileError;
use crate::field::{EnumField, FieldName, MANAGED_FIELDS, ManagedField};
use crate::store::{EnumPanel, FieldStore};

/// Aggregate outcome of one run.
///
/// Serializes as `{"changed": bool, "comment": {field: record}}`; only
/// fields with a non-empty [`ChangeRecord`] appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub changed: bool,
    #[serde(rename = "comment")]
    pub fields: BTreeMap<FieldName, ChangeRecord>,
}

impl ReconcileReport {
    fn record(&mut self, field: FieldName, record: ChangeRecord) {
        if record.is_empty() {
            return;
        }
        self.changed = true;
        self.fields.insert(field, record);
    }

    #[must_use]
    pub fn get(&self, field: FieldName) -> Option<&ChangeRecord> {
        self.fields.get(&field)
    }
}

/// Desired values for one configured field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlan {
    pub field: ManagedField,
    pub desired: Vec<String>,
}

/// Configuration that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    /// Configured fields in processing order.
    pub plans: Vec<FieldPlan>,
    /// Owner for new components; empty when no components are configured.
    pub component_owner: String,
}

/// Drives validation, diffing, and store mutation for a set of fields.
#[derive(Debug)]
pub struct Reconciler<'a, C: ConfigSource + ?Sized> {
    config: &'a C,
    section: String,
    owner_option: String,
    fields: Vec<ManagedField>,
}

impl<'a, C: ConfigSource + ?Sized> Reconciler<'a, C> {
    /// Reconcile every managed field from the default section.
    #[must_use]
    pub fn new(config: &'a C) -> Self {
        Self {
            config,
            section: SECTION_NAME.to_string(),
            owner_option: COMPONENT_OWNER_OPTION.to_string(),
            fields: MANAGED_FIELDS.into_iter().map(ManagedField::from).collect(),
        }
    }

    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Restrict the run to `fields`, processed in the order given.
    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldName>) -> Self {
        let mut seen = HashSet::new();
        self.fields = fields
            .into_iter()
            .filter(|field| seen.insert(*field))
            .map(ManagedField::from)
            .collect();
        self
    }

    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Check preconditions and collect desired values. Reads configuration
    /// only.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::ConfigSectionMissing`] if the section is absent
    /// - [`ReconcileError::ComponentOwnerMissing`] if components are listed
    ///   without an owner
    /// - [`ReconcileError::DuplicateValue`] if a field lists a value twice
    /// - [`ReconcileError::InvalidOption`] if a field option is not a list
    pub fn validate(&self) -> Result<ValidatedConfig, ReconcileError> {
        if !self.config.has_section(&self.section) {
            return Err(ReconcileError::ConfigSectionMissing {
                section: self.section.clone(),
            });
        }

        for option in self.config.options(&self.section) {
            let is_field = MANAGED_FIELDS.iter().any(|field| field.as_str() == option);
            if !is_field && option != self.owner_option {
                debug!(section = %self.section, option = %option, "ignoring unknown option");
            }
        }

        let component_owner = self.config.get_scalar(&self.section, &self.owner_option);
        let manages_components = self.fields.contains(&ManagedField::Component);
        if manages_components
            && component_owner.is_empty()
            && !self.desired_values(FieldName::Component)?.is_empty()
        {
            return Err(ReconcileError::ComponentOwnerMissing {
                section: self.section.clone(),
                option: self.owner_option.clone(),
            });
        }

        let mut plans = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let name = field.name();
            if !self.config.has_option(&self.section, name.as_str()) {
                debug!(field = %name, "field not configured, skipping");
                continue;
            }

            let desired = self.desired_values(name)?;
            if let Some(label) = first_duplicate(&desired) {
                return Err(ReconcileError::DuplicateValue {
                    field: name,
                    label: label.to_string(),
                });
            }
            plans.push(FieldPlan {
                field: *field,
                desired,
            });
        }

        Ok(ValidatedConfig {
            plans,
            component_owner,
        })
    }

    fn desired_values(&self, field: FieldName) -> Result<Vec<String>, ReconcileError> {
        self.config
            .get_list(&self.section, field.as_str())
            .map_err(|source| ReconcileError::InvalidOption { field, source })
    }

    /// Compute the report a run would produce, without mutating the store.
    ///
    /// # Errors
    ///
    /// Returns validation errors, or [`ReconcileError::StoreReadFailed`].
    pub fn plan<S: FieldStore + ?Sized>(&self, store: &S) -> Result<ReconcileReport, ReconcileError> {
        let validated = self.validate()?;
        let mut report = ReconcileReport::default();

        for plan in &validated.plans {
            let current = current_labels(store, plan.field)?;
            let record = diff_field(plan.field, &current, &plan.desired);
            report.record(plan.field.name(), record);
        }

        Ok(report)
    }

    /// Bring the store in line with configuration and report what changed.
    ///
    /// # Errors
    ///
    /// Validation errors leave the store untouched. Store errors end the run
    /// at the failing call; changes applied before it are kept.
    pub fn reconcile<S: FieldStore + ?Sized>(
        &self,
        store: &mut S,
    ) -> Result<ReconcileReport, ReconcileError> {
        let validated = self.validate()?;
        let mut report = ReconcileReport::default();

        for plan in &validated.plans {
            let name = plan.field.name();
            let current = current_labels(store, plan.field)?;
            let record = diff_field(plan.field, &current, &plan.desired);

            if let Err(error) = apply_field(store, plan, &record, &validated.component_owner) {
                warn!(field = %name, %error, "store rejected change; earlier changes kept");
                return Err(error);
            }

            if !record.is_empty() {
                info!(
                    field = %name,
                    added = record.added.len(),
                    removed = record.removed.len(),
                    reordered = record.reordered.len(),
                    "field reconciled"
                );
            }
            report.record(name, record);
        }

        Ok(report)
    }
}

fn first_duplicate(values: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(String::as_str)
        .find(|value| !seen.insert(*value))
}

fn current_labels<S: FieldStore + ?Sized>(
    store: &S,
    field: ManagedField,
) -> Result<Vec<String>, ReconcileError> {
    let read_failed = |source| ReconcileError::StoreReadFailed {
        field: field.name(),
        source,
    };

    match field {
        ManagedField::Simple(enum_field) => Ok(store
            .list_enum(enum_field)
            .map_err(read_failed)?
            .into_iter()
            .map(|entry| entry.name)
            .collect()),
        ManagedField::Component => Ok(store
            .list_components()
            .map_err(read_failed)?
            .into_iter()
            .map(|entry| entry.name)
            .collect()),
    }
}

/// Apply one field's diff: removals, additions, then positions.
fn apply_field<S: FieldStore + ?Sized>(
    store: &mut S,
    plan: &FieldPlan,
    record: &ChangeRecord,
    component_owner: &str,
) -> Result<(), ReconcileError> {
    let name = plan.field.name();
    let removal_failed = |label: &String| {
        let label = label.clone();
        move |source| ReconcileError::StoreRemovalFailed {
            field: name,
            label,
            source,
        }
    };
    let addition_failed = |label: &String| {
        let label = label.clone();
        move |source| ReconcileError::StoreAdditionFailed {
            field: name,
            label,
            source,
        }
    };

    match plan.field {
        ManagedField::Simple(field) => {
            for label in &record.removed {
                store
                    .remove_enum(field, label)
                    .map_err(removal_failed(label))?;
            }
            for label in &record.added {
                store.add_enum(field, label).map_err(addition_failed(label))?;
            }
            let moved = apply_positions(store, field, &plan.desired)?;
            debug!(field = %name, moved, "positions updated");
        }
        ManagedField::Component => {
            for label in &record.removed {
                store
                    .remove_component(label)
                    .map_err(removal_failed(label))?;
            }
            for label in &record.added {
                store
                    .add_component(label, component_owner)
                    .map_err(addition_failed(label))?;
            }
        }
    }

    Ok(())
}

/// Give every stored value its 1-based index in `desired` as its position.
///
/// Returns the number of values whose position changed.
fn apply_positions<S: EnumPanel + ?Sized>(
    store: &mut S,
    field: EnumField,
    desired: &[String],
) -> Result<usize, ReconcileError> {
    let wanted: HashMap<&str, u32> = desired
        .iter()
        .map(String::as_str)
        .zip(1_u32..)
        .collect();

    let entries = store
        .list_enum(field)
        .map_err(|source| ReconcileError::StoreReadFailed {
            field: field.name(),
            source,
        })?;

    let mut moved = 0;
    for entry in entries {
        let Some(&position) = wanted.get(entry.name.as_str()) else {
            return Err(ReconcileError::ItemNotInDesiredOrder {
                field: field.name(),
                label: entry.name,
            });
        };
        if entry.position == position {
            continue;
        }
        store
            .set_enum_position(field, &entry.name, position)
            .map_err(|source| ReconcileError::StorePositionFailed {
                field: field.name(),
                label: entry.name.clone(),
                position,
                source,
            })?;
        moved += 1;
    }

    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::{Reconciler, apply_positions, first_duplicate};
    use crate::config::TomlConfig;
    use crate::error::ReconcileError;
    use crate::field::{EnumField, FieldName};
    use crate::store::{MemoryStore, StoreCall};

    fn config(body: &str) -> TomlConfig {
        TomlConfig::parse(&format!("[ticket-field-config]\n{body}")).expect("parse config")
    }

    #[test]
    fn missing_section_fails_before_any_store_call() {
        let cfg = TomlConfig::parse("[other]\npriority = \"P1\"\n").expect("parse");
        let mut store = MemoryStore::new().with_enum(EnumField::Priority, &["major"]);

        let err = Reconciler::new(&cfg)
            .reconcile(&mut store)
            .expect_err("must fail");
        assert!(matches!(err, ReconcileError::ConfigSectionMissing { .. }));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn table_valued_field_fails_before_any_store_call() {
        let cfg = config("priority = { first = \"P1\" }\n");
        let mut store = MemoryStore::new().with_enum(EnumField::Priority, &["blocker", "major"]);

        let err = Reconciler::new(&cfg)
            .reconcile(&mut store)
            .expect_err("must fail");
        match &err {
            ReconcileError::InvalidOption { field, source } => {
                assert_eq!(*field, FieldName::Priority);
                assert_eq!(source.found, "table");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.error_code().code(), "E1004");
        assert!(store.calls().is_empty());
        assert_eq!(store.values(EnumField::Priority), ["blocker", "major"]);
    }

    #[test]
    fn nested_array_item_is_rejected() {
        let cfg = config("component = [[\"a\"], \"b\"]\ncomponent_owner = \"admin\"\n");
        let err = Reconciler::new(&cfg).validate().expect_err("must fail");
        assert!(matches!(
            err,
            ReconcileError::InvalidOption {
                field: FieldName::Component,
                ..
            }
        ));
    }

    #[test]
    fn components_without_owner_fail_validation() {
        let cfg = config("component = \"a,b\"\ncomponent_owner = \"\"\n");
        let err = Reconciler::new(&cfg).validate().expect_err("must fail");
        assert!(matches!(err, ReconcileError::ComponentOwnerMissing { .. }));
    }

    #[test]
    fn empty_component_list_needs_no_owner() {
        let cfg = config("component = \"\"\n");
        let validated = Reconciler::new(&cfg).validate().expect("valid");
        assert_eq!(validated.plans.len(), 1);
        assert!(validated.plans[0].desired.is_empty());
    }

    #[test]
    fn duplicates_are_rejected() {
        let cfg = config("priority = \"P1,P2,P1\"\n");
        let err = Reconciler::new(&cfg).validate().expect_err("must fail");
        match err {
            ReconcileError::DuplicateValue { field, label } => {
                assert_eq!(field, FieldName::Priority);
                assert_eq!(label, "P1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unconfigured_and_unknown_options_are_skipped() {
        let cfg = config("ticket_type = \"Bug\"\nnintendo = \"mario,pacman\"\n");
        let validated = Reconciler::new(&cfg).validate().expect("valid");
        let names: Vec<FieldName> = validated.plans.iter().map(|p| p.field.name()).collect();
        assert_eq!(names, [FieldName::TicketType]);
    }

    #[test]
    fn with_fields_limits_and_orders_processing() {
        let cfg = config("priority = \"a\"\nseverity = \"b\"\ncomponent = \"c\"\n");
        let validated = Reconciler::new(&cfg)
            .with_fields([FieldName::Severity, FieldName::Priority, FieldName::Severity])
            .validate()
            .expect("owner check skipped when components are not managed");
        let names: Vec<FieldName> = validated.plans.iter().map(|p| p.field.name()).collect();
        assert_eq!(names, [FieldName::Severity, FieldName::Priority]);
    }

    #[test]
    fn custom_section_is_honoured() {
        let cfg = TomlConfig::parse("[set-from-config-plugin]\nseverity = \"High\"\n").expect("parse");
        let mut store = MemoryStore::new();
        let report = Reconciler::new(&cfg)
            .with_section("set-from-config-plugin")
            .reconcile(&mut store)
            .expect("reconcile");
        assert!(report.changed);
        assert_eq!(store.values(EnumField::Severity), ["High"]);
    }

    #[test]
    fn removals_run_before_additions_and_positions_last() {
        let cfg = config("priority = \"high,low\"\n");
        let mut store = MemoryStore::new().with_enum(EnumField::Priority, &["low", "old"]);

        Reconciler::new(&cfg).reconcile(&mut store).expect("reconcile");

        let mutations: Vec<StoreCall> = store
            .calls()
            .into_iter()
            .filter(StoreCall::is_mutation)
            .collect();
        assert_eq!(
            mutations,
            [
                StoreCall::RemoveEnum(EnumField::Priority, "old".into()),
                StoreCall::AddEnum(EnumField::Priority, "high".into()),
                StoreCall::SetPosition(EnumField::Priority, "low".into(), 2),
                StoreCall::SetPosition(EnumField::Priority, "high".into(), 1),
            ]
        );
        assert_eq!(store.values(EnumField::Priority), ["high", "low"]);
    }

    #[test]
    fn plan_does_not_mutate() {
        let cfg = config("resolution = \"fixed,wontfix\"\n");
        let store = MemoryStore::new().with_enum(EnumField::Resolution, &["wontfix", "invalid"]);

        let report = Reconciler::new(&cfg).plan(&store).expect("plan");
        assert!(report.changed);
        let record = report.get(FieldName::Resolution).expect("record");
        assert_eq!(record.added, ["fixed"]);
        assert_eq!(record.removed, ["invalid"]);
        assert_eq!(store.mutation_count(), 0);
    }

    #[test]
    fn first_removal_failure_stops_the_run() {
        let cfg = config("priority = \"P1\"\nseverity = \"S1\"\n");
        let mut store = MemoryStore::new()
            .with_enum(EnumField::Priority, &["a", "b"])
            .with_enum(EnumField::Severity, &["x"]);
        store.reject_removal(FieldName::Priority, "b");

        let err = Reconciler::new(&cfg)
            .reconcile(&mut store)
            .expect_err("must fail");
        assert!(matches!(
            err,
            ReconcileError::StoreRemovalFailed { field: FieldName::Priority, ref label, .. } if label == "b"
        ));
        // "a" was already removed and stays removed; severity never ran.
        assert_eq!(store.values(EnumField::Priority), ["b"]);
        assert_eq!(store.values(EnumField::Severity), ["x"]);
    }

    #[test]
    fn stray_store_value_is_an_internal_fault() {
        let mut store = MemoryStore::new().with_enum(EnumField::Priority, &["a", "stray"]);
        let desired = vec!["a".to_string()];
        let err = apply_positions(&mut store, EnumField::Priority, &desired).expect_err("must fail");
        assert!(matches!(
            err,
            ReconcileError::ItemNotInDesiredOrder { ref label, .. } if label == "stray"
        ));
    }

    #[test]
    fn gapped_positions_are_compacted_silently() {
        let cfg = config("priority = \"a,b\"\n");
        let mut store =
            MemoryStore::new().with_positions(EnumField::Priority, &[("a", 4), ("b", 9)]);

        let report = Reconciler::new(&cfg).reconcile(&mut store).expect("reconcile");
        assert!(!report.changed);
        let positions: Vec<u32> = store
            .entries(EnumField::Priority)
            .iter()
            .map(|e| e.position)
            .collect();
        assert_eq!(positions, [1, 2]);
    }

    #[test]
    fn first_duplicate_finds_repeat() {
        let values: Vec<String> = ["a", "b", "a"].iter().map(ToString::to_string).collect();
        assert_eq!(first_duplicate(&values), Some("a"));
        assert_eq!(first_duplicate(&values[..2]), None);
    }
}
