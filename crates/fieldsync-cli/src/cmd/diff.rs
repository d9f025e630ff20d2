//! `fieldsync diff`: preview what `apply` would change.

use anyhow::Result;
use clap::Args;

use super::apply::{reconciler, render_report};
use super::{Context, FieldSelection};

#[derive(Args, Debug, Default)]
pub struct DiffArgs {
    #[command(flatten)]
    pub selection: FieldSelection,

    /// Exit with status 2 when changes are pending.
    #[arg(long)]
    pub exit_code: bool,
}

/// Outcome of a dry run, for the caller to map onto a process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffStatus {
    Clean,
    Pending,
}

/// Execute `fieldsync diff`. Never writes to the store.
///
/// JSON output always carries the full report, including
/// `{"changed": false, "comment": {}}` for a clean store.
///
/// # Errors
///
/// Returns an error if the config or store cannot be opened, or if
/// validation fails.
pub fn run_diff(args: &DiffArgs, ctx: &Context) -> Result<DiffStatus> {
    let config = ctx.load_fields()?;
    let reconciler = reconciler(&config, &args.selection);
    reconciler.validate()?;
    let store = ctx.open_store()?;

    let report = reconciler.plan(&store)?;

    if report.changed || ctx.output.is_json() {
        render_report(ctx, &report)?;
    } else if !ctx.quiet {
        println!("no changes");
    }

    Ok(if report.changed && args.exit_code {
        DiffStatus::Pending
    } else {
        DiffStatus::Clean
    })
}
