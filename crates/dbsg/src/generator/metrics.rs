use indexmap::IndexMap;
use strum::Display;

use crate::generator::ir::{Database, Package};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationStats {
  pub databases_built: usize,
  pub schemes_built: usize,
  pub packages_built: usize,
  pub overload_sets_built: usize,
  pub routines_built: usize,
  pub arguments_built: usize,
  pub artifacts_rendered: IndexMap<String, usize>,
  pub warnings: Vec<GenerationWarning>,
}

impl GenerationStats {
  pub fn record_database(&mut self, database: &Database) {
    self.databases_built += 1;
    self.schemes_built += database.schemes.len();
    for package in database.schemes.iter().flat_map(|schema| &schema.packages) {
      self.record_package(package);
    }
  }

  fn record_package(&mut self, package: &Package) {
    self.packages_built += 1;
    self.overload_sets_built += package.overloads.len();
    for routine in package.routines() {
      self.routines_built += 1;
      self.arguments_built += routine.arguments.len();
    }
  }

  pub fn record_artifacts(&mut self, plugin: &str, count: usize) {
    *self.artifacts_rendered.entry(plugin.to_string()).or_default() += count;
  }

  pub fn total_artifacts(&self) -> usize {
    self.artifacts_rendered.values().sum()
  }

  pub fn record_warning(&mut self, warning: GenerationWarning) {
    tracing::warn!("{warning}");
    self.warnings.push(warning);
  }

  pub fn record_warnings(&mut self, warnings: impl IntoIterator<Item = GenerationWarning>) {
    for warning in warnings {
      self.record_warning(warning);
    }
  }
}

/// Non-fatal issues collected during a run and returned alongside the output.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GenerationWarning {
  #[strum(to_string = "{entity}: native type '{native_type}' has no generic mapping, using 'unknown'")]
  UnmappedType { entity: String, native_type: String },
  #[strum(to_string = "{entity}: function has no return argument in the catalog, using 'unknown'")]
  MissingReturnArgument { entity: String },
  #[strum(to_string = "{entity}: custom type '{reference}' names no type, falling back to the native type")]
  DanglingCustomType { entity: String, reference: String },
  #[strum(to_string = "[{plugin}] {entity}: {message}")]
  PluginPartialFailure {
    plugin: String,
    entity: String,
    message: String,
  },
  #[strum(to_string = "[{plugin}] plugin aborted, its output was discarded: {error}")]
  PluginFailed { plugin: String, error: String },
}

impl GenerationWarning {
  /// Whether the warning means some output is missing rather than degraded.
  pub fn is_skipped_item(&self) -> bool {
    matches!(self, Self::PluginFailed { .. })
  }
}
