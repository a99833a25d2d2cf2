//! Raw catalog metadata as delivered by the metadata adapter.
//!
//! Rows are flat: one row per routine argument (or one placeholder row for a
//! routine without arguments). The generator never queries a catalog itself;
//! the CLI reads a JSON dump with the shape of [`Introspection`].

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoutineKind {
  #[serde(alias = "PROCEDURE")]
  Procedure,
  #[serde(alias = "FUNCTION")]
  Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
  #[serde(alias = "IN")]
  In,
  #[serde(alias = "OUT")]
  Out,
  #[serde(alias = "IN/OUT", alias = "in/out", alias = "IN_OUT", alias = "IN OUT", alias = "in out")]
  InOut,
}

impl Direction {
  pub fn is_input(self) -> bool {
    matches!(self, Self::In | Self::InOut)
  }
}

/// Identifies one routine in the catalog. Package members share an `object_id`
/// and differ by `subprogram_id`; standalone routines have their own `object_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoutineKey {
  pub object_id: i64,
  pub subprogram_id: i64,
}

impl std::fmt::Display for RoutineKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "object_id={}, subprogram_id={}", self.object_id, self.subprogram_id)
  }
}

const fn default_nullable() -> bool {
  true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntrospectionRow {
  pub object_id: i64,
  pub subprogram_id: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub package_name: Option<String>,
  pub routine_name: String,
  pub kind: RoutineKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub overload: Option<u32>,
  pub position: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sequence: Option<u32>,
  #[serde(default)]
  pub data_level: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub argument_name: Option<String>,
  pub direction: Direction,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub native_type: Option<String>,
  #[serde(default = "default_nullable")]
  pub nullable: bool,
  #[serde(default)]
  pub has_default: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub custom_type_schema: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub custom_type_package: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub custom_type: Option<String>,
}

impl IntrospectionRow {
  pub fn key(&self) -> RoutineKey {
    RoutineKey {
      object_id: self.object_id,
      subprogram_id: self.subprogram_id,
    }
  }

  /// A row describing a routine that has no arguments at all.
  pub fn is_placeholder(&self) -> bool {
    self.argument_name.is_none() && self.native_type.is_none()
  }

  /// Catalog ordering key of the argument within its routine.
  pub fn sequence_key(&self) -> (u32, u32, u32) {
    (self.sequence.unwrap_or(self.position), self.data_level, self.position)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionSchema {
  pub name: String,
  #[serde(default)]
  pub rows: Vec<IntrospectionRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionDatabase {
  pub name: String,
  #[serde(default)]
  pub schemes: Vec<IntrospectionSchema>,
}

impl IntrospectionDatabase {
  pub fn scheme(&self, name: &str) -> Option<&IntrospectionSchema> {
    self.schemes.iter().find(|scheme| scheme.name.eq_ignore_ascii_case(name))
  }
}

/// A whole dump: every database with every scheme's rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Introspection {
  #[serde(default)]
  pub databases: Vec<IntrospectionDatabase>,
}

impl Introspection {
  pub fn from_json(content: &str) -> anyhow::Result<Self> {
    serde_json::from_str(content).context("Failed to parse introspection dump")
  }

  pub async fn load(path: &Path) -> anyhow::Result<Self> {
    let content = tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("Failed to read introspection dump: {}", path.display()))?;
    Self::from_json(&content)
  }

  pub fn database(&self, name: &str) -> Option<&IntrospectionDatabase> {
    self.databases.iter().find(|db| db.name.eq_ignore_ascii_case(name))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parses_catalog_spellings() {
    let json = r#"{
      "databases": [{
        "name": "DB_NAME",
        "schemes": [{
          "name": "BILLS",
          "rows": [{
            "object_id": 180000,
            "subprogram_id": 1,
            "package_name": "BILL_UTILS_PKG",
            "routine_name": "PAYROLL",
            "kind": "PROCEDURE",
            "position": 1,
            "argument_name": "OUT_PAYROLL_ID",
            "direction": "OUT",
            "native_type": "NUMBER"
          }, {
            "object_id": 180000,
            "subprogram_id": 2,
            "package_name": "BILL_UTILS_PKG",
            "routine_name": "RECALC",
            "kind": "procedure",
            "position": 1,
            "direction": "IN/OUT",
            "argument_name": "P_AMOUNT",
            "native_type": "NUMBER",
            "nullable": false,
            "has_default": true
          }]
        }]
      }]
    }"#;

    let dump = Introspection::from_json(json).unwrap();
    let scheme = dump.database("db_name").unwrap().scheme("bills").unwrap();

    assert_eq!(scheme.rows.len(), 2);
    assert_eq!(scheme.rows[0].kind, RoutineKind::Procedure);
    assert_eq!(scheme.rows[0].direction, Direction::Out);
    assert!(scheme.rows[0].nullable);
    assert_eq!(scheme.rows[1].direction, Direction::InOut);
    assert!(scheme.rows[1].has_default);
    assert!(!scheme.rows[1].nullable);
  }

  #[test]
  fn test_rejects_unknown_row_fields() {
    let json = r#"{"databases": [{"name": "db", "schemes": [{"name": "s", "rows": [{
      "object_id": 1, "subprogram_id": 1, "routine_name": "r", "kind": "function",
      "position": 0, "direction": "out", "native_type": "number", "typo": true
    }]}]}]}"#;

    assert!(Introspection::from_json(json).is_err());
  }

  #[test]
  fn test_placeholder_row() {
    let row = IntrospectionRow {
      object_id: 1,
      subprogram_id: 1,
      package_name: None,
      routine_name: "noop".to_string(),
      kind: RoutineKind::Procedure,
      overload: None,
      position: 1,
      sequence: None,
      data_level: 0,
      argument_name: None,
      direction: Direction::In,
      native_type: None,
      nullable: true,
      has_default: false,
      custom_type_schema: None,
      custom_type_package: None,
      custom_type: None,
    };

    assert!(row.is_placeholder());
    assert_eq!(row.sequence_key(), (1, 0, 1));
    assert_eq!(Direction::InOut.to_string(), "IN_OUT");
    assert_eq!(RoutineKind::Function.to_string(), "function");
  }
}
