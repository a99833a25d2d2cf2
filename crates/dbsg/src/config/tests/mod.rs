use std::{io::Write, path::PathBuf};

use super::{Config, SchemeConfig, abbreviations};
use crate::{
  generator::{
    naming::{AbbreviationTable, CasingEngine, casing::AbbreviationRule},
    types::{CustomTypeRef, GenericKind, GenericType, Resolution},
  },
  introspection::{Direction, Introspection},
};

const FULL_CONFIG: &str = r#"
path = "generated"
plugins = ["json", "rust"]
abbreviations = ["http", "oauth=OAuth"]

[type_mappings]
"XMLTYPE" = "string"
"sdo_geometry" = "object"

[plugin_options.rust]
support_crate = "crate::support"

[[databases]]
name = "PROD"

[[databases.schemes]]
name = "BILLS"
no_package_name = "standalone"
exclude_packages = ["legacy_pkg"]
exclude_routines = ["billing.purge"]

[[databases.schemes.introspection_appendix]]
object_id = 180000
subprogram_id = 2
position = 1
direction = "IN OUT"
"#;

#[test]
fn test_defaults() {
  let config = Config::from_str("").unwrap();
  assert_eq!(config, Config::default());
  assert_eq!(config.path, PathBuf::from("stubs"));
  assert_eq!(config.plugins, vec!["json".to_string()]);
  assert!(config.databases.is_empty());
}

#[test]
fn test_full_config() {
  let config = Config::from_str(FULL_CONFIG).unwrap();

  assert_eq!(config.path, PathBuf::from("generated"));
  assert_eq!(config.plugins, vec!["json".to_string(), "rust".to_string()]);
  assert_eq!(config.type_mappings.get("XMLTYPE"), Some(&GenericKind::String));
  assert_eq!(
    config.plugin_options["rust"].get("support_crate").and_then(toml::Value::as_str),
    Some("crate::support")
  );

  let scheme = &config.databases[0].schemes[0];
  assert_eq!(config.databases[0].name, "PROD");
  assert_eq!(scheme.no_package_name.as_deref(), Some("standalone"));
  assert_eq!(scheme.introspection_appendix.len(), 1);
  assert_eq!(scheme.introspection_appendix[0].direction, Some(Direction::InOut));

  let filter = scheme.filter().unwrap();
  assert!(!filter.admits(Some("legacy_pkg"), "anything"));
  assert!(!filter.admits(Some("billing"), "purge"));
  assert!(filter.admits(Some("billing"), "charge"));
}

#[test]
fn test_type_mappings_extend_the_builtin_table() {
  let config = Config::from_str(FULL_CONFIG).unwrap();
  let table = config.type_table();
  let no_custom = CustomTypeRef::default();

  assert_eq!(
    table.resolve(Some("xmltype"), &no_custom),
    Resolution::Mapped(GenericType::String)
  );
  assert_eq!(
    table.resolve(Some("SDO_GEOMETRY"), &no_custom),
    Resolution::Mapped(GenericType::Object)
  );
  assert_eq!(
    table.resolve(Some("VARCHAR2(30)"), &no_custom),
    Resolution::Mapped(GenericType::String)
  );
}

#[test]
fn test_rejects_unknown_keys_and_kinds() {
  assert!(Config::from_str("plugin = [\"json\"]").is_err());
  assert!(Config::from_str("[type_mappings]\nxmltype = \"document\"").is_err());
  assert!(Config::from_str("[[databases]]\nname = \"db\"\n[[databases.schemes]]\nname = \"s\"\nexclude = []").is_err());
}

#[test]
fn test_validation() {
  assert!(Config::from_str("plugins = []").is_err());
  assert!(Config::from_str("[[databases]]\nname = \" \"").is_err());
  assert!(Config::from_str("[[databases]]\nname = \"db\"\n[[databases.schemes]]\nname = \"\"").is_err());
}

#[test]
fn test_malformed_filter_surfaces_from_the_scheme() {
  let scheme = SchemeConfig {
    include_routines: vec!["a.b.c.d".to_string()],
    ..SchemeConfig::named("bills")
  };
  assert!(scheme.filter().is_err());
}

#[tokio::test]
async fn test_from_file_and_explicit_load() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  file.write_all(FULL_CONFIG.as_bytes()).unwrap();

  let config = Config::from_file(file.path()).await.unwrap();
  assert_eq!(config.databases[0].schemes[0].name, "BILLS");
  assert_eq!(Config::load(Some(file.path())).await.unwrap(), config);

  let missing = file.path().with_extension("missing");
  let error = Config::from_file(&missing).await.unwrap_err();
  assert!(error.to_string().contains("Failed to read configuration"), "{error:#}");
}

#[test]
fn test_abbreviation_file_format() {
  let mut table = AbbreviationTable::new();
  abbreviations::parse_into(
    &mut table,
    "# acronyms\n\
     http\n\
     \n\
     oauth=OAuth   # mixed case\n\
     id\n",
  );

  assert_eq!(table.len(), 3);
  assert_eq!(table.lookup("http"), Some(&AbbreviationRule::Upper));
  assert_eq!(table.lookup("oauth"), Some(&AbbreviationRule::Literal("OAuth".to_string())));

  let casing = CasingEngine::new(table);
  assert_eq!(casing.to_identifier("http_oauth_client_id").unwrap(), "HTTPOAuthClientID");
}

#[tokio::test]
async fn test_abbreviation_files_then_inline_declarations() {
  let dir = tempfile::tempdir().unwrap();
  let first = dir.path().join("common.abbr");
  let second = dir.path().join("project.abbr");
  tokio::fs::write(&first, "api\nsql=Sql\n").await.unwrap();
  tokio::fs::write(&second, "sql\n").await.unwrap();

  let table = abbreviations::load(&[&first, &second], &["api=Api".to_string()])
    .await
    .unwrap();
  let casing = CasingEngine::new(table);
  assert_eq!(casing.to_identifier("run_sql_api").unwrap(), "RunSQLApi");

  assert!(
    abbreviations::load(&[dir.path().join("absent.abbr")], &[])
      .await
      .is_err()
  );
}

#[tokio::test]
async fn test_config_wires_the_orchestrator() {
  let config = Config::from_str(
    r#"
      plugins = ["json"]
      abbreviations = ["bills"]

      [[databases]]
      name = "db"

      [[databases.schemes]]
      name = "bills"
    "#,
  )
  .unwrap();
  let orchestrator = config.orchestrator(config.abbreviation_table().await.unwrap());
  let dump = Introspection::from_json(
    r#"{"databases": [{"name": "DB", "schemes": [{"name": "BILLS", "rows": [{
      "object_id": 7, "subprogram_id": 1, "routine_name": "PING", "kind": "PROCEDURE",
      "position": 1, "direction": "IN"
    }]}]}]}"#,
  )
  .unwrap();

  let output = orchestrator.run(&dump).unwrap();
  assert_eq!(output.databases[0].schemes[0].packages[0].display_name, "BILLSNoPkg");
}
