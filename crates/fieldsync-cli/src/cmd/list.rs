//! `fieldsync list <field>`: show the values currently stored for a field.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use fieldsync_core::store::{ComponentEntry, ComponentPanel, EnumEntry, EnumPanel};
use fieldsync_core::{FieldName, ManagedField};

use super::{Context, parse_field_name};
use crate::output::{pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Field to list: priority, severity, resolution, ticket_type, component.
    #[arg(value_parser = parse_field_name)]
    pub field: FieldName,
}

/// Stored values of one field.
///
/// Ordered fields serialize as a plain list of names in display order;
/// components serialize as `[{"name": .., "owner": ..}]`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Listing {
    Ordered(#[serde(serialize_with = "names_only")] Vec<EnumEntry>),
    Components(Vec<ComponentEntry>),
}

fn names_only<S: serde::Serializer>(
    entries: &[EnumEntry],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(entries.iter().map(|e| e.name.as_str()))
}

/// Execute `fieldsync list`.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or read.
pub fn run_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;

    let listing = match ManagedField::from(args.field) {
        ManagedField::Simple(field) => Listing::Ordered(store.list_enum(field)?),
        ManagedField::Component => Listing::Components(store.list_components()?),
    };

    let heading = args.field.as_str();
    render_mode(
        ctx.output,
        &listing,
        |value, w| match value {
            Listing::Ordered(entries) => {
                for entry in entries {
                    writeln!(w, "{}\t{}", entry.position, entry.name)?;
                }
                Ok(())
            }
            Listing::Components(entries) => {
                for entry in entries {
                    writeln!(w, "{}\t{}", entry.name, entry.owner)?;
                }
                Ok(())
            }
        },
        |value, w| {
            pretty_section(w, heading)?;
            match value {
                Listing::Ordered(entries) if entries.is_empty() => writeln!(w, "(no values)"),
                Listing::Components(entries) if entries.is_empty() => {
                    writeln!(w, "(no components)")
                }
                Listing::Ordered(entries) => {
                    for entry in entries {
                        writeln!(w, "{:>4}  {}", entry.position, entry.name)?;
                    }
                    Ok(())
                }
                Listing::Components(entries) => {
                    writeln!(w, "{:<32} {}", "NAME", "OWNER")?;
                    for entry in entries {
                        writeln!(w, "{:<32} {}", entry.name, entry.owner)?;
                    }
                    Ok(())
                }
            }
        },
    )
}
