//! The generation pipeline, from raw catalog rows to plugin artifacts.
//!
//! Every database is overlaid, filtered and built first. Only when all of them
//! built cleanly do the plugins run, each on its own thread, over the finished
//! read-only trees.

use std::{any::Any, collections::BTreeMap};

use crate::{
  config::{DatabaseConfig, SchemeConfig},
  generator::{
    appendix,
    builder::{IrBuilder, SchemeSource},
    errors::GenerationError,
    ir::Database,
    metrics::{GenerationStats, GenerationWarning},
    naming::CasingEngine,
    plugins::{Artifact, Plugin, PluginError, PluginRegistry, RenderContext, RenderOutput, json},
    types::TypeTable,
  },
  introspection::{Introspection, IntrospectionDatabase, IntrospectionSchema},
};

// Plugin panics are caught at `join`, which an aborting build never reaches.
#[cfg(not(panic = "unwind"))]
compile_error!("dbsg must be built with `panic = \"unwind\"` to isolate plugin panics");

#[derive(Debug, bon::Builder)]
pub struct Orchestrator {
  #[builder(default)]
  casing: CasingEngine,
  #[builder(default)]
  types: TypeTable,
  #[builder(default)]
  registry: PluginRegistry,
  #[builder(default = vec![json::NAME.to_string()])]
  plugins: Vec<String>,
  /// Empty means every database and scheme found in the dump.
  #[builder(default)]
  databases: Vec<DatabaseConfig>,
  #[builder(default)]
  plugin_options: BTreeMap<String, toml::Table>,
}

/// Everything a successful run produced.
#[derive(Debug)]
pub struct GeneratedOutput {
  pub databases: Vec<Database>,
  /// `(plugin name, artifact)` pairs in plugin order.
  pub artifacts: Vec<(String, Artifact)>,
  pub stats: GenerationStats,
}

/// A built database next to the patched rows it came from.
struct PreparedDatabase {
  database: Database,
  introspection: IntrospectionDatabase,
}

impl Orchestrator {
  /// Runs the pipeline over `dump`.
  ///
  /// # Errors
  ///
  /// Unknown plugins, dangling appendix records, malformed filters and
  /// structural catalog problems abort the run before any plugin is invoked.
  /// Plugin failures never do; they become warnings in the returned stats.
  pub fn run(&self, dump: &Introspection) -> Result<GeneratedOutput, GenerationError> {
    let plugins = self.registry.instantiate(&self.plugins)?;

    let mut stats = GenerationStats::default();
    let mut prepared = Vec::new();
    for target in self.targets(dump)? {
      let (database, warnings) = self.prepare(dump, &target)?;
      stats.record_database(&database.database);
      stats.record_warnings(warnings);
      prepared.push(database);
    }

    let artifacts = self.render_all(&plugins, &prepared, &mut stats);

    Ok(GeneratedOutput {
      databases: prepared.into_iter().map(|prepared| prepared.database).collect(),
      artifacts,
      stats,
    })
  }

  /// Configured databases, or one default entry per database and scheme of the dump.
  fn targets(&self, dump: &Introspection) -> Result<Vec<DatabaseConfig>, GenerationError> {
    if !self.databases.is_empty() {
      return Ok(self.databases.clone());
    }
    if dump.databases.is_empty() {
      tracing::debug!("introspection dump holds no databases");
    }
    Ok(
      dump
        .databases
        .iter()
        .map(|database| DatabaseConfig {
          name: database.name.clone(),
          schemes: database
            .schemes
            .iter()
            .map(|scheme| SchemeConfig::named(&scheme.name))
            .collect(),
        })
        .collect(),
    )
  }

  fn prepare(
    &self,
    dump: &Introspection,
    target: &DatabaseConfig,
  ) -> Result<(PreparedDatabase, Vec<GenerationWarning>), GenerationError> {
    let raw = dump
      .database(&target.name)
      .ok_or_else(|| GenerationError::configuration(&target.name, "database not found in the introspection dump"))?;

    let mut introspection = IntrospectionDatabase {
      name: raw.name.to_lowercase(),
      schemes: Vec::with_capacity(target.schemes.len()),
    };
    let mut filters = Vec::with_capacity(target.schemes.len());

    for scheme in &target.schemes {
      let rows = raw.scheme(&scheme.name).ok_or_else(|| {
        GenerationError::configuration(
          format!("{}.{}", target.name, scheme.name),
          "scheme not found in the introspection dump",
        )
      })?;
      let filter = scheme.filter()?;
      let patched = appendix::merge(&scheme.name, &rows.rows, &scheme.introspection_appendix)?;
      introspection.schemes.push(IntrospectionSchema {
        name: scheme.name.to_lowercase(),
        rows: patched,
      });
      filters.push(filter);
    }

    let sources: Vec<SchemeSource<'_>> = target
      .schemes
      .iter()
      .zip(&introspection.schemes)
      .zip(&filters)
      .map(|((scheme, patched), filter)| SchemeSource {
        name: &scheme.name,
        no_package_name: scheme.no_package_name.as_deref(),
        rows: &patched.rows,
        filter,
      })
      .collect();

    tracing::debug!(database = %target.name, schemes = sources.len(), "building database");
    let built = IrBuilder::new(&self.casing, &self.types).build(&target.name, &sources)?;

    Ok((
      PreparedDatabase {
        database: built.database,
        introspection,
      },
      built.warnings,
    ))
  }

  /// One thread per plugin. A plugin that errors or panics loses all of its
  /// artifacts; its siblings are unaffected.
  fn render_all(
    &self,
    plugins: &[Box<dyn Plugin>],
    prepared: &[PreparedDatabase],
    stats: &mut GenerationStats,
  ) -> Vec<(String, Artifact)> {
    let empty_options = toml::Table::new();

    let results: Vec<_> = std::thread::scope(|scope| {
      let handles: Vec<_> = plugins
        .iter()
        .map(|plugin| {
          let options = self.plugin_options.get(plugin.name()).unwrap_or(&empty_options);
          let handle = scope.spawn(move || render_plugin(plugin.as_ref(), prepared, options));
          (plugin.name(), handle)
        })
        .collect();

      handles
        .into_iter()
        .map(|(name, handle)| {
          let result = handle.join().unwrap_or_else(|panic| {
            Err(PluginError::Render {
              entity: name.to_string(),
              message: format!("plugin panicked: {}", panic_message(panic.as_ref())),
            })
          });
          (name, result)
        })
        .collect()
    });

    let mut artifacts = Vec::new();
    for (name, result) in results {
      match result {
        Ok(output) => {
          stats.record_artifacts(name, output.artifacts.len());
          stats.record_warnings(output.failures.into_iter().map(|failure| {
            GenerationWarning::PluginPartialFailure {
              plugin: name.to_string(),
              entity: failure.entity,
              message: failure.message,
            }
          }));
          tracing::info!(plugin = name, artifacts = output.artifacts.len(), "plugin finished");
          artifacts.extend(
            output
              .artifacts
              .into_iter()
              .map(|artifact| (name.to_string(), artifact)),
          );
        }
        Err(error) => {
          stats.record_artifacts(name, 0);
          stats.record_warning(GenerationWarning::PluginFailed {
            plugin: name.to_string(),
            error: error.to_string(),
          });
        }
      }
    }
    artifacts
  }
}

/// Renders every database with one plugin, merging the outputs.
fn render_plugin(
  plugin: &dyn Plugin,
  prepared: &[PreparedDatabase],
  options: &toml::Table,
) -> Result<RenderOutput, PluginError> {
  let mut merged = RenderOutput::default();
  for database in prepared {
    let context = RenderContext {
      database: &database.database,
      introspection: &database.introspection,
      options,
    };
    let output = plugin.render(&context)?;
    merged.artifacts.extend(output.artifacts);
    merged.failures.extend(output.failures);
  }
  Ok(merged)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
  payload
    .downcast_ref::<&str>()
    .copied()
    .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
    .unwrap_or("unknown panic")
}
