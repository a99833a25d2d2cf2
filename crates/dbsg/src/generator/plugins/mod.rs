//! Output plugins.
//!
//! A plugin turns one built database into artifacts. It never touches the file
//! system; the caller decides where artifacts land. Plugins are looked up by
//! name in a [`PluginRegistry`] populated at start-up.

pub mod json;
pub mod raw_introspection;
pub mod rust;

use std::path::PathBuf;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::de::DeserializeOwned;

use crate::{
  generator::{errors::GenerationError, ir::Database},
  introspection::IntrospectionDatabase,
};

/// A generated output unit: a relative path hint plus content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  pub path: PathBuf,
  pub content: Vec<u8>,
}

impl Artifact {
  pub fn new(path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
    Self {
      path: path.into(),
      content: content.into(),
    }
  }

  #[cfg(test)]
  pub fn as_text(&self) -> Option<&str> {
    std::str::from_utf8(&self.content).ok()
  }
}

/// An entity the plugin rendered only partially.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRenderError {
  pub entity: String,
  pub message: String,
}

impl std::fmt::Display for PluginRenderError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: {}", self.entity, self.message)
  }
}

#[derive(Debug, Default)]
pub struct RenderOutput {
  pub artifacts: Vec<Artifact>,
  /// Best-effort degradations; the matching artifacts are still part of `artifacts`.
  pub failures: Vec<PluginRenderError>,
}

impl RenderOutput {
  pub fn push_failure(&mut self, entity: impl ToString, message: impl Into<String>) {
    self.failures.push(PluginRenderError {
      entity: entity.to_string(),
      message: message.into(),
    });
  }
}

/// Fatal to the plugin that raised it, harmless to every other plugin.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
  #[error("cannot render {entity}: {message}")]
  Render { entity: String, message: String },
  #[error("serialization failed: {0}")]
  Serialize(#[from] serde_json::Error),
  #[error("generated code does not parse: {0}")]
  Syntax(#[from] syn::Error),
  #[error("invalid plugin options: {0}")]
  Options(#[from] toml::de::Error),
}

/// Everything a plugin may look at. All of it is shared and read-only.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
  pub database: &'a Database,
  /// Patched rows of the database, before filtering.
  pub introspection: &'a IntrospectionDatabase,
  /// `plugin_options.<name>` from the configuration, empty when absent.
  pub options: &'a toml::Table,
}

impl RenderContext<'_> {
  /// Deserializes the plugin's options table into its typed form.
  pub fn options<T: DeserializeOwned>(&self) -> Result<T, PluginError> {
    Ok(toml::Value::Table(self.options.clone()).try_into()?)
  }
}

pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str;

  fn render(&self, context: &RenderContext<'_>) -> Result<RenderOutput, PluginError>;
}

pub type PluginFactory = fn() -> Box<dyn Plugin>;

/// Plugin identifiers mapped to factories.
#[derive(Clone)]
pub struct PluginRegistry {
  factories: IndexMap<&'static str, PluginFactory>,
}

impl std::fmt::Debug for PluginRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_list().entries(self.factories.keys()).finish()
  }
}

impl Default for PluginRegistry {
  fn default() -> Self {
    Self::builtin()
  }
}

impl PluginRegistry {
  pub fn empty() -> Self {
    Self {
      factories: IndexMap::new(),
    }
  }

  pub fn builtin() -> Self {
    let mut registry = Self::empty();
    registry.register(json::NAME, || Box::new(json::JsonPlugin));
    registry.register(raw_introspection::NAME, || {
      Box::new(raw_introspection::RawIntrospectionPlugin)
    });
    registry.register(rust::NAME, || Box::new(rust::RustPlugin));
    registry
  }

  /// Registers `factory` under `name`, replacing a previous registration.
  pub fn register(&mut self, name: &'static str, factory: PluginFactory) {
    if self.factories.insert(name, factory).is_some() {
      tracing::debug!(plugin = name, "plugin registration replaced");
    }
  }

  pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.factories.keys().copied()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.factories.contains_key(name)
  }

  /// Creates the plugins in the requested order, skipping repeated names.
  /// Any unknown name fails the whole request.
  pub fn instantiate<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Box<dyn Plugin>>, GenerationError> {
    let names: Vec<&str> = names.iter().map(|name| name.as_ref().trim()).unique().collect();
    if let Some(unknown) = names.iter().find(|name| !self.contains(name)) {
      return Err(GenerationError::configuration(
        format!("plugin '{unknown}'"),
        format!("not registered, available: {}", self.names().join(", ")),
      ));
    }
    Ok(
      names
        .into_iter()
        .filter_map(|name| self.factories.get(name))
        .map(|factory| factory())
        .collect(),
    )
  }
}
