//! `dbsg.toml`: output location, plugins, naming rules and per-scheme settings.

pub mod abbreviations;

#[cfg(test)]
mod tests;

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use crate::generator::{
  appendix::AppendixRecord,
  errors::GenerationError,
  filters::SchemeFilter,
  naming::{AbbreviationTable, CasingEngine},
  orchestrator::Orchestrator,
  plugins::json,
  types::{GenericKind, TypeTable},
};

pub const DEFAULT_CONFIG_FILE: &str = "dbsg.toml";
pub const CONFIG_ENV_VAR: &str = "DBSG_CONF";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Root directory artifacts are written under.
  pub path: PathBuf,
  pub plugins: Vec<String>,
  pub abbreviation_files: Vec<PathBuf>,
  /// Inline `token` or `token=Literal` rules, applied after the files.
  pub abbreviations: Vec<String>,
  /// Native type name to generic kind, on top of the built-in table.
  pub type_mappings: BTreeMap<String, GenericKind>,
  /// Free-form tables handed to the plugin of the same name.
  pub plugin_options: BTreeMap<String, toml::Table>,
  /// Empty means every database and scheme of the dump, with default settings.
  pub databases: Vec<DatabaseConfig>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      path: PathBuf::from("stubs"),
      plugins: vec![json::NAME.to_string()],
      abbreviation_files: vec![],
      abbreviations: vec![],
      type_mappings: BTreeMap::new(),
      plugin_options: BTreeMap::new(),
      databases: vec![],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
  pub name: String,
  #[serde(default)]
  pub schemes: Vec<SchemeConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemeConfig {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub no_package_name: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub include_routines: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub exclude_routines: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub exclude_packages: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub introspection_appendix: Vec<AppendixRecord>,
}

impl SchemeConfig {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  pub fn filter(&self) -> Result<SchemeFilter, GenerationError> {
    SchemeFilter::new(
      &self.name,
      &self.include_routines,
      &self.exclude_routines,
      &self.exclude_packages,
    )
  }
}

impl Config {
  pub fn from_str(content: &str) -> anyhow::Result<Self> {
    let config: Self = toml::from_str(content).context("Failed to parse configuration")?;
    config.validate()?;
    Ok(config)
  }

  pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
    let content = tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("Failed to read configuration: {}", path.display()))?;
    Self::from_str(&content).with_context(|| format!("Invalid configuration file: {}", path.display()))
  }

  /// Loads the explicitly given file, else the one named by `DBSG_CONF`, else
  /// `dbsg.toml` when it exists, else the defaults.
  pub async fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
    if let Some(path) = explicit {
      return Self::from_file(path).await;
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|path| !path.is_empty()) {
      return Self::from_file(Path::new(&path)).await;
    }
    let default = Path::new(DEFAULT_CONFIG_FILE);
    if tokio::fs::try_exists(default).await.unwrap_or(false) {
      return Self::from_file(default).await;
    }
    tracing::debug!("no configuration file found, using defaults");
    Ok(Self::default())
  }

  pub fn validate(&self) -> anyhow::Result<()> {
    if self.plugins.is_empty() {
      bail!("`plugins` must name at least one plugin");
    }
    for (i, database) in self.databases.iter().enumerate() {
      if database.name.trim().is_empty() {
        bail!("databases[{i}].name must not be empty");
      }
      for (j, scheme) in database.schemes.iter().enumerate() {
        if scheme.name.trim().is_empty() {
          bail!("databases[{i}].schemes[{j}].name must not be empty");
        }
      }
    }
    Ok(())
  }

  pub fn type_table(&self) -> TypeTable {
    let mut table = TypeTable::default();
    for (native, kind) in &self.type_mappings {
      table.insert(native, *kind);
    }
    table
  }

  pub async fn abbreviation_table(&self) -> anyhow::Result<AbbreviationTable> {
    abbreviations::load(&self.abbreviation_files, &self.abbreviations).await
  }

  /// Wires everything the pipeline needs, taking the abbreviations separately
  /// because reading them is I/O.
  pub fn orchestrator(&self, abbreviations: AbbreviationTable) -> Orchestrator {
    Orchestrator::builder()
      .casing(CasingEngine::new(abbreviations))
      .types(self.type_table())
      .plugins(self.plugins.clone())
      .databases(self.databases.clone())
      .plugin_options(self.plugin_options.clone())
      .build()
  }
}
