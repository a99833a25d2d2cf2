use std::sync::atomic::{AtomicBool, Ordering};

use super::support::{BILLING_ID, SCHEME, billing_rows, dump};
use crate::{
  config::{DatabaseConfig, SchemeConfig},
  generator::{
    appendix::AppendixRecord,
    errors::GenerationError,
    metrics::GenerationWarning,
    orchestrator::Orchestrator,
    plugins::{Artifact, Plugin, PluginError, PluginRegistry, RenderContext, RenderOutput},
  },
  introspection::Introspection,
};

/// One artifact per routine; `ping` is only partially rendered.
struct Flaky;

impl Plugin for Flaky {
  fn name(&self) -> &'static str {
    "flaky"
  }

  fn render(&self, context: &RenderContext<'_>) -> Result<RenderOutput, PluginError> {
    let mut output = RenderOutput::default();
    for (_, _, routine) in context.database.routines() {
      output.artifacts.push(Artifact::new(
        format!("flaky/{}.txt", routine.call_name.to_lowercase()),
        routine.call_name.clone(),
      ));
      if routine.name == "ping" {
        output.push_failure(&routine.call_name, "no arguments to describe");
      }
    }
    Ok(output)
  }
}

struct Broken;

impl Plugin for Broken {
  fn name(&self) -> &'static str {
    "broken"
  }

  fn render(&self, context: &RenderContext<'_>) -> Result<RenderOutput, PluginError> {
    Err(PluginError::Render {
      entity: context.database.name.clone(),
      message: "template missing".to_string(),
    })
  }
}

struct Panicky;

impl Plugin for Panicky {
  fn name(&self) -> &'static str {
    "panicky"
  }

  fn render(&self, _context: &RenderContext<'_>) -> Result<RenderOutput, PluginError> {
    panic!("index out of range")
  }
}

static TRIPWIRE_RENDERED: AtomicBool = AtomicBool::new(false);

struct Tripwire;

impl Plugin for Tripwire {
  fn name(&self) -> &'static str {
    "tripwire"
  }

  fn render(&self, _context: &RenderContext<'_>) -> Result<RenderOutput, PluginError> {
    TRIPWIRE_RENDERED.store(true, Ordering::SeqCst);
    Ok(RenderOutput::default())
  }
}

fn registry() -> PluginRegistry {
  let mut registry = PluginRegistry::builtin();
  registry.register("flaky", || Box::new(Flaky));
  registry.register("broken", || Box::new(Broken));
  registry.register("panicky", || Box::new(Panicky));
  registry.register("tripwire", || Box::new(Tripwire));
  registry
}

fn plugins(names: &[&str]) -> Vec<String> {
  names.iter().map(ToString::to_string).collect()
}

fn billing_dump() -> Introspection {
  dump(billing_rows())
}

fn configured(scheme: SchemeConfig) -> Vec<DatabaseConfig> {
  vec![DatabaseConfig {
    name: "db".to_string(),
    schemes: vec![scheme],
  }]
}

#[test]
fn test_defaults_process_the_whole_dump() {
  let output = Orchestrator::builder().build().run(&billing_dump()).unwrap();

  assert_eq!(output.databases.len(), 1);
  assert_eq!(output.databases[0].name, "db");
  assert_eq!(output.databases[0].schemes[0].name, SCHEME);
  assert_eq!(output.artifacts.len(), 1);

  let (plugin, artifact) = &output.artifacts[0];
  assert_eq!(plugin, "json");
  assert_eq!(artifact.path.to_str(), Some("db/db.json"));
}

#[test]
fn test_stats_count_the_tree() {
  let output = Orchestrator::builder()
    .plugins(plugins(&["json", "rust"]))
    .build()
    .run(&billing_dump())
    .unwrap();
  let stats = &output.stats;

  assert_eq!(stats.databases_built, 1);
  assert_eq!(stats.schemes_built, 1);
  assert_eq!(stats.packages_built, 2);
  assert_eq!(stats.overload_sets_built, 5);
  assert_eq!(stats.routines_built, 6);
  assert_eq!(stats.arguments_built, 8);
  assert_eq!(stats.artifacts_rendered.get("json"), Some(&1));
  // Two package files, the scheme module and the database module.
  assert_eq!(stats.artifacts_rendered.get("rust"), Some(&4));
  assert_eq!(stats.total_artifacts(), 5);

  // The record argument of `payroll` has no type name.
  assert_eq!(stats.warnings.len(), 1);
  assert!(matches!(
    &stats.warnings[0],
    GenerationWarning::PluginPartialFailure { plugin, entity, .. }
      if plugin == "rust" && entity == "bills.billing.payroll.p_rec"
  ));
}

#[test]
fn test_release_profile_unwinds_plugin_panics() {
  let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../Cargo.toml");
  let manifest: toml::Table = std::fs::read_to_string(&manifest).unwrap().parse().unwrap();

  for profile in ["release", "dev"] {
    let panic = manifest["profile"][profile].get("panic").and_then(toml::Value::as_str);
    assert!(matches!(panic, None | Some("unwind")), "profile.{profile} sets panic = {panic:?}");
  }
}

#[test]
fn test_plugin_failures_are_isolated() {
  let output = Orchestrator::builder()
    .registry(registry())
    .plugins(plugins(&["json", "flaky", "broken", "panicky"]))
    .build()
    .run(&billing_dump())
    .unwrap();

  let per_plugin = |name: &str| output.artifacts.iter().filter(|(plugin, _)| plugin == name).count();
  assert_eq!(per_plugin("json"), 1);
  assert_eq!(per_plugin("flaky"), 6);
  assert_eq!(per_plugin("broken"), 0);
  assert_eq!(per_plugin("panicky"), 0);
  assert_eq!(output.artifacts[0].0, "json");

  let stats = &output.stats;
  assert_eq!(stats.artifacts_rendered.get("broken"), Some(&0));
  assert_eq!(stats.artifacts_rendered.get("panicky"), Some(&0));

  let partial: Vec<_> = stats
    .warnings
    .iter()
    .filter_map(|warning| match warning {
      GenerationWarning::PluginPartialFailure { plugin, entity, .. } => Some((plugin.as_str(), entity.as_str())),
      _ => None,
    })
    .collect();
  assert_eq!(partial, vec![("flaky", "BILLS.PING")]);

  let failed: Vec<_> = stats
    .warnings
    .iter()
    .filter_map(|warning| match warning {
      GenerationWarning::PluginFailed { plugin, error } => Some((plugin.as_str(), error.as_str())),
      _ => None,
    })
    .collect();
  assert_eq!(failed.len(), 2);
  assert_eq!(failed[0].0, "broken");
  assert!(failed[0].1.contains("template missing"));
  assert_eq!(failed[1].0, "panicky");
  assert!(failed[1].1.contains("index out of range"), "{}", failed[1].1);
  assert!(stats.warnings.iter().filter(|w| w.is_skipped_item()).count() == 2);
}

#[test]
fn test_dangling_appendix_record_aborts_before_rendering() {
  let scheme = SchemeConfig {
    introspection_appendix: vec![AppendixRecord {
      object_id: 999,
      subprogram_id: 1,
      ..AppendixRecord::default()
    }],
    ..SchemeConfig::named(SCHEME)
  };

  let result = Orchestrator::builder()
    .registry(registry())
    .plugins(plugins(&["tripwire"]))
    .databases(configured(scheme))
    .build()
    .run(&billing_dump());

  let error = result.unwrap_err();
  assert!(matches!(&error, GenerationError::Configuration { message, .. } if message.contains("object_id=999")));
  assert!(!TRIPWIRE_RENDERED.load(Ordering::SeqCst));
}

#[test]
fn test_unknown_plugin_is_a_configuration_error() {
  let error = Orchestrator::builder()
    .plugins(plugins(&["json", "graphviz"]))
    .build()
    .run(&billing_dump())
    .unwrap_err();

  assert_eq!(error.entity(), "plugin 'graphviz'");
  assert!(error.to_string().contains("json, raw-introspection, rust"), "{error}");
}

#[test]
fn test_missing_database_and_scheme_are_configuration_errors() {
  let missing_scheme = Orchestrator::builder()
    .databases(configured(SchemeConfig::named("ledger")))
    .build()
    .run(&billing_dump())
    .unwrap_err();
  assert!(matches!(&missing_scheme, GenerationError::Configuration { entity, .. } if entity == "db.ledger"));

  let missing_database = Orchestrator::builder()
    .databases(vec![DatabaseConfig {
      name: "warehouse".to_string(),
      schemes: vec![],
    }])
    .build()
    .run(&billing_dump())
    .unwrap_err();
  assert!(matches!(&missing_database, GenerationError::Configuration { entity, .. } if entity == "warehouse"));
}

#[test]
fn test_configured_scheme_settings_are_applied() {
  let scheme = SchemeConfig {
    no_package_name: Some("standalone".to_string()),
    exclude_packages: vec!["billing".to_string()],
    ..SchemeConfig::named("BILLS")
  };
  let output = Orchestrator::builder()
    .databases(configured(scheme))
    .build()
    .run(&billing_dump())
    .unwrap();

  let packages: Vec<_> = output.databases[0].schemes[0]
    .packages
    .iter()
    .map(|package| (package.name.as_str(), package.display_name.as_str()))
    .collect();
  assert_eq!(packages, vec![("standalone", "Standalone")]);
}

#[test]
fn test_raw_introspection_sees_patched_rows() {
  let scheme = SchemeConfig {
    introspection_appendix: vec![AppendixRecord {
      native_type: Some("CHAR".to_string()),
      ..AppendixRecord {
        object_id: BILLING_ID,
        subprogram_id: 1,
        position: Some(2),
        ..AppendixRecord::default()
      }
    }],
    ..SchemeConfig::named(SCHEME)
  };
  let output = Orchestrator::builder()
    .plugins(plugins(&["raw-introspection"]))
    .databases(configured(scheme))
    .build()
    .run(&billing_dump())
    .unwrap();

  let (_, artifact) = &output.artifacts[0];
  assert_eq!(artifact.path.to_str(), Some("db/db_raw.json"));

  let replayed = Introspection::from_json(artifact.as_text().unwrap()).unwrap();
  let rows = &replayed.database("db").unwrap().scheme(SCHEME).unwrap().rows;
  assert_eq!(rows.len(), billing_rows().len());
  let currency = rows
    .iter()
    .find(|row| row.object_id == BILLING_ID && row.subprogram_id == 1 && row.position == 2)
    .unwrap();
  assert_eq!(currency.native_type.as_deref(), Some("CHAR"));
}

#[test]
fn test_empty_dump_renders_nothing() {
  let output = Orchestrator::builder().build().run(&Introspection::default()).unwrap();
  assert!(output.databases.is_empty());
  assert!(output.artifacts.is_empty());
  assert_eq!(output.stats.artifacts_rendered.get("json"), Some(&0));
}
