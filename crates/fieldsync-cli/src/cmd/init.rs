use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use fieldsync_core::db::SqliteStore;

use super::Context;
use crate::output::{pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Create an empty store instead of writing the stock field values.
    #[arg(long)]
    pub empty: bool,
}

const CONFIG_TEMPLATE: &str = "# fieldsync configuration\n\
    #\n\
    # [store]\n\
    # path = \".fieldsync/fields.db\"\n\
    \n\
    # Desired values per field. Lists are comma-separated strings or arrays.\n\
    # Fields left out are not touched; an empty list removes every value.\n\
    #\n\
    # [ticket-field-config]\n\
    # priority = \"blocker, critical, major, minor, trivial\"\n\
    # severity = []\n\
    # resolution = [\"fixed\", \"invalid\", \"wontfix\", \"duplicate\", \"worksforme\"]\n\
    # ticket_type = \"defect, enhancement, task\"\n\
    # component = \"component1, component2\"\n\
    # component_owner = \"somebody\"\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    store: String,
    config: String,
    seeded: bool,
    config_created: bool,
}

/// Execute `fieldsync init`: create (or open) the store, seed stock values
/// into an empty store, and write a commented config template if none exists.
///
/// Re-running is safe: an existing store keeps its values and an existing
/// config file is never overwritten.
///
/// # Errors
///
/// Returns an error if the store or config file cannot be created.
pub fn run_init(args: &InitArgs, ctx: &Context) -> Result<()> {
    let mut store = SqliteStore::open(&ctx.store_path)?;
    let seeded = if args.empty {
        false
    } else {
        store
            .seed_defaults()
            .context("write default field values")?
    };

    let config_created = if ctx.config_path.exists() {
        false
    } else {
        if let Some(parent) = ctx.config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create config directory {}", parent.display()))?;
        }
        std::fs::write(&ctx.config_path, CONFIG_TEMPLATE)
            .with_context(|| format!("write {}", ctx.config_path.display()))?;
        true
    };

    info!(
        store = %ctx.store_path.display(),
        seeded,
        config_created,
        "store initialized"
    );

    let payload = InitOutput {
        store: ctx.store_path.display().to_string(),
        config: ctx.config_path.display().to_string(),
        seeded,
        config_created,
    };
    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }

    render_mode(
        ctx.output,
        &payload,
        |value, w| {
            writeln!(w, "store\t{}", value.store)?;
            writeln!(w, "config\t{}", value.config)?;
            writeln!(w, "seeded\t{}", value.seeded)
        },
        |value, w| {
            pretty_section(w, "Initialized field store")?;
            pretty_kv(w, "store", &value.store)?;
            pretty_kv(w, "config", &value.config)?;
            pretty_kv(
                w,
                "defaults",
                if value.seeded { "written" } else { "skipped" },
            )?;
            if value.config_created {
                writeln!(w, "\nEdit the config, then run `fieldsync diff` to preview.")?;
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputMode;
    use fieldsync_core::config::{ConfigSource, TomlConfig};

    #[test]
    fn template_parses_and_declares_no_section() {
        let cfg = TomlConfig::parse(CONFIG_TEMPLATE).expect("template is valid TOML");
        assert!(!cfg.has_section(fieldsync_core::config::SECTION_NAME));
    }

    #[test]
    fn init_seeds_once_and_keeps_config() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::resolve(dir.path(), None, None, OutputMode::Json, true).unwrap();

        run_init(&InitArgs::default(), &ctx).unwrap();
        std::fs::write(&ctx.config_path, "[ticket-field-config]\n").unwrap();
        run_init(&InitArgs::default(), &ctx).unwrap();

        let content = std::fs::read_to_string(&ctx.config_path).unwrap();
        assert_eq!(content, "[ticket-field-config]\n");
        assert!(ctx.store_path.exists());
    }
}
