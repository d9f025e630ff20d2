pub mod apply;
pub mod diff;
pub mod init;
pub mod list;

use std::path::{Path, PathBuf};

use anyhow::Result;
use fieldsync_core::config::{
    TomlConfig, default_config_path, load_field_config, load_project_config, resolve_store_path,
};
use fieldsync_core::db::SqliteStore;
use fieldsync_core::FieldName;

use crate::output::OutputMode;

/// Paths and flags shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: PathBuf,
    pub store_path: PathBuf,
    pub output: OutputMode,
    pub quiet: bool,
}

impl Context {
    /// Resolve config and store paths for `project_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn resolve(
        project_root: &Path,
        config_flag: Option<&Path>,
        db_flag: Option<&Path>,
        output: OutputMode,
        quiet: bool,
    ) -> Result<Self> {
        let config_path = config_flag.map_or_else(
            || default_config_path(project_root),
            |path| project_root.join(path),
        );
        let project = load_project_config(&config_path)?;
        let store_path = resolve_store_path(project_root, db_flag, &project);

        Ok(Self {
            config_path,
            store_path,
            output,
            quiet,
        })
    }

    /// Open the store created by `fieldsync init`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store does not exist or cannot be opened.
    pub fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open_existing(&self.store_path)?.ok_or_else(|| {
            anyhow::anyhow!(
                "field store not found at {}.\n  Run `fieldsync init` to create it.",
                self.store_path.display()
            )
        })
    }

    /// Load the field configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_fields(&self) -> Result<TomlConfig> {
        load_field_config(&self.config_path)
    }
}

/// Selection flags shared by `apply` and `diff`.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct FieldSelection {
    /// Only reconcile these fields (repeatable). Default: all fields.
    #[arg(long = "field", value_name = "FIELD", value_parser = parse_field_name)]
    pub fields: Vec<FieldName>,

    /// Config section holding the desired values.
    #[arg(long, value_name = "NAME")]
    pub section: Option<String>,
}

pub fn parse_field_name(raw: &str) -> Result<FieldName, String> {
    raw.parse::<FieldName>().map_err(|e| e.to_string())
}
