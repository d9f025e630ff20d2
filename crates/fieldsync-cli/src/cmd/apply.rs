//! `fieldsync apply`: bring the store in line with the configured values.

use std::io::{self, Write};

use anyhow::Result;
use clap::Args;

use fieldsync_core::config::TomlConfig;
use fieldsync_core::{ChangeRecord, ReconcileReport, Reconciler};

use super::{Context, FieldSelection};
use crate::output::{pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub selection: FieldSelection,
}

/// Build a reconciler honouring `--field` and `--section`.
#[must_use]
pub fn reconciler<'a>(
    config: &'a TomlConfig,
    selection: &FieldSelection,
) -> Reconciler<'a, TomlConfig> {
    let mut reconciler = Reconciler::new(config);
    if let Some(section) = &selection.section {
        reconciler = reconciler.with_section(section.clone());
    }
    if !selection.fields.is_empty() {
        reconciler = reconciler.with_fields(selection.fields.iter().copied());
    }
    reconciler
}

/// Execute `fieldsync apply`.
///
/// Prints the report only when something changed. In human modes an
/// unchanged run prints `no changes` unless `--quiet` is set; in JSON mode it
/// prints nothing.
///
/// # Errors
///
/// Returns an error if the config is invalid, if the store cannot be
/// opened, or if the run fails. Config errors are reported before the store
/// is opened. A failed run may leave earlier changes applied.
pub fn run_apply(args: &ApplyArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_fields()?;
    let reconciler = reconciler(&config, &args.selection);
    reconciler.validate()?;
    let mut store = ctx.open_store()?;

    let report = reconciler.reconcile(&mut store)?;

    if !report.changed {
        if !ctx.quiet && !ctx.output.is_json() {
            println!("no changes");
        }
        return Ok(());
    }

    render_report(ctx, &report)
}

/// Render a report in the active output mode.
pub fn render_report(ctx: &Context, report: &ReconcileReport) -> Result<()> {
    render_mode(ctx.output, report, write_text, write_pretty)
}

fn join(labels: &[String]) -> String {
    labels.join(", ")
}

/// One row per change: `field<TAB>kind<TAB>detail`.
fn write_text(report: &ReconcileReport, w: &mut dyn Write) -> io::Result<()> {
    for (field, record) in &report.fields {
        for label in &record.removed {
            writeln!(w, "{field}\tremoved\t{label}")?;
        }
        for label in &record.added {
            writeln!(w, "{field}\tadded\t{label}")?;
        }
        for mismatch in &record.reordered {
            writeln!(
                w,
                "{field}\treordered\t{}\t{}\t{}",
                mismatch.position, mismatch.current, mismatch.desired
            )?;
        }
    }
    Ok(())
}

fn write_pretty(report: &ReconcileReport, w: &mut dyn Write) -> io::Result<()> {
    for (field, record) in &report.fields {
        pretty_section(w, field.as_str())?;
        write_record(record, w)?;
        writeln!(w)?;
    }
    Ok(())
}

fn write_record(record: &ChangeRecord, w: &mut dyn Write) -> io::Result<()> {
    if !record.removed.is_empty() {
        pretty_kv(w, "removed", join(&record.removed))?;
    }
    if !record.added.is_empty() {
        pretty_kv(w, "added", join(&record.added))?;
    }
    for mismatch in &record.reordered {
        pretty_kv(
            w,
            "reordered",
            format!(
                "{}: {} -> {}",
                mismatch.position, mismatch.current, mismatch.desired
            ),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use fieldsync_core::FieldName;
    use fieldsync_core::diff::diff_field;
    use std::collections::BTreeMap;

    fn sample_report() -> ReconcileReport {
        let current: Vec<String> = ["a", "b", "old"].iter().map(ToString::to_string).collect();
        let desired: Vec<String> = ["b", "a", "new"].iter().map(ToString::to_string).collect();
        ReconcileReport {
            changed: true,
            fields: BTreeMap::from([(
                FieldName::Priority,
                diff_field(FieldName::Priority.into(), &current, &desired),
            )]),
        }
    }

    #[test]
    fn text_rows_are_tab_separated() {
        let mut buf = Vec::new();
        write_text(&sample_report(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0], "priority\tremoved\told");
        assert_eq!(rows[1], "priority\tadded\tnew");
        assert_eq!(rows[2], "priority\treordered\t1\ta\tb");
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn pretty_output_shows_order_changes() {
        let mut buf = Vec::new();
        write_pretty(&sample_report(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("priority\n"));
        assert!(text.contains("1: a -> b"));
        assert!(text.contains("added:"));
    }

    #[test]
    fn apply_args_accept_section_override() {
        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ApplyArgs,
        }

        let w = Wrapper::parse_from(["test", "--section", "set-from-config-plugin"]);
        assert_eq!(
            w.args.selection.section.as_deref(),
            Some("set-from-config-plugin")
        );
    }
}
