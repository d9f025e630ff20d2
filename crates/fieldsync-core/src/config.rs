use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// Section holding the desired field values.
pub const SECTION_NAME: &str = "ticket-field-config";

/// Option naming the owner given to every newly added component.
pub const COMPONENT_OWNER_OPTION: &str = "component_owner";

/// Project directory holding config and the default database.
pub const PROJECT_DIR: &str = ".fieldsync";

/// Source of desired field values.
///
/// Lists are already split into items; an absent option reads as an empty
/// list or empty string, so callers use [`ConfigSource::has_option`] to tell
/// "configured as empty" apart from "not configured".
pub trait ConfigSource {
    fn has_section(&self, section: &str) -> bool;

    fn has_option(&self, section: &str, option: &str) -> bool;

    /// # Errors
    ///
    /// Returns [`InvalidListOption`] when the option is present but does not
    /// hold a list of plain values.
    fn get_list(&self, section: &str, option: &str) -> Result<Vec<String>, InvalidListOption>;

    fn get_scalar(&self, section: &str, option: &str) -> String;

    /// Option names present in a section, in file order where known.
    fn options(&self, section: &str) -> Vec<String>;
}

/// A list option holding something other than plain values, such as a
/// table or a nested array.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{section}] {option} must be a string or an array of plain values, found {found}")]
pub struct InvalidListOption {
    pub section: String,
    pub option: String,
    pub found: &'static str,
}

/// [`ConfigSource`] backed by a parsed TOML document.
///
/// A list option may be a TOML array or a single comma-separated string:
///
/// ```toml
/// [ticket-field-config]
/// priority = "P1, P2, P3"
/// resolution = ["fixed", "wontfix", "invalid"]
/// component = "new/blog,new/site"
/// component_owner = "admin"
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TomlConfig {
    table: Table,
}

impl TomlConfig {
    #[must_use]
    pub const fn new(table: Table) -> Self {
        Self { table }
    }

    /// Parse configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML.
    pub fn parse(content: &str) -> Result<Self> {
        let table = toml::from_str::<Table>(content).context("parse field config")?;
        Ok(Self::new(table))
    }

    fn option(&self, section: &str, option: &str) -> Option<&Value> {
        self.table.get(section)?.as_table()?.get(option)
    }
}

impl ConfigSource for TomlConfig {
    fn has_section(&self, section: &str) -> bool {
        self.table.get(section).is_some_and(Value::is_table)
    }

    fn has_option(&self, section: &str, option: &str) -> bool {
        self.option(section, option).is_some()
    }

    fn get_list(&self, section: &str, option: &str) -> Result<Vec<String>, InvalidListOption> {
        let invalid = |value: &Value| InvalidListOption {
            section: section.to_string(),
            option: option.to_string(),
            found: value.type_str(),
        };

        match self.option(section, option) {
            None => Ok(Vec::new()),
            Some(Value::String(raw)) => Ok(split_list(raw)),
            Some(Value::Array(items)) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    let text = scalar_text(item).ok_or_else(|| invalid(item))?;
                    let text = text.trim();
                    if !text.is_empty() {
                        list.push(text.to_string());
                    }
                }
                Ok(list)
            }
            Some(other) => scalar_text(other)
                .map(|text| split_list(&text))
                .ok_or_else(|| invalid(other)),
        }
    }

    fn get_scalar(&self, section: &str, option: &str) -> String {
        self.option(section, option)
            .and_then(scalar_text)
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }

    fn options(&self, section: &str) -> Vec<String> {
        self.table
            .get(section)
            .and_then(Value::as_table)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => {
            Some(value.to_string())
        }
        Value::Array(_) | Value::Table(_) => None,
    }
}

/// Non-field project settings read from the same config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database path, relative to the project root unless absolute.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Default config file location under a project root.
#[must_use]
pub fn default_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_DIR).join("config.toml")
}

/// Default database location under a project root.
#[must_use]
pub fn default_store_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_DIR).join("fields.db")
}

/// Load the field configuration. A missing file loads as empty.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_field_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    TomlConfig::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load project settings. A missing file loads defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(path: &Path) -> Result<ProjectConfig> {
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the database path.
///
/// Precedence (highest wins):
/// 1. `--db` flag
/// 2. `FIELDSYNC_DB` env var
/// 3. `[store] path` in the project config
/// 4. `.fieldsync/fields.db`
#[must_use]
pub fn resolve_store_path(
    project_root: &Path,
    cli_db: Option<&Path>,
    project: &ProjectConfig,
) -> PathBuf {
    let env_db = std::env::var_os("FIELDSYNC_DB").map(PathBuf::from);
    resolve_store_path_inner(project_root, cli_db, env_db.as_deref(), project)
}

fn resolve_store_path_inner(
    project_root: &Path,
    cli_db: Option<&Path>,
    env_db: Option<&Path>,
    project: &ProjectConfig,
) -> PathBuf {
    if let Some(path) = cli_db.or(env_db) {
        return path.to_path_buf();
    }

    project.store.path.as_ref().map_or_else(
        || default_store_path(project_root),
        |path| project_root.join(path),
    )
}
