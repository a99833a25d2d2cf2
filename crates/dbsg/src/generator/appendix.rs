//! User-declared patches layered onto raw catalog rows before the IR is built.

use std::{
  collections::{HashMap, HashSet},
  fmt::Display,
};

use serde::{Deserialize, Serialize};

use crate::{
  generator::errors::GenerationError,
  introspection::{Direction, IntrospectionRow, RoutineKey, RoutineKind},
};

/// One appendix entry. Without `position` it patches every row of the routine,
/// with `position` it patches the single top-level argument at that position.
///
/// Every field other than the key is optional; only present fields override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendixRecord {
  pub object_id: i64,
  pub subprogram_id: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub position: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub routine_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<RoutineKind>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub argument_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub native_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub direction: Option<Direction>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub nullable: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub has_default: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub custom_type_schema: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub custom_type_package: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub custom_type: Option<String>,
  /// Free text for the people maintaining the appendix. Never applied.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AppendixKey {
  Routine(RoutineKey),
  Argument(RoutineKey, u32),
}

impl Display for AppendixKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Routine(key) => write!(f, "appendix record ({key})"),
      Self::Argument(key, position) => write!(f, "appendix record ({key}, position={position})"),
    }
  }
}

impl AppendixRecord {
  pub fn routine_key(&self) -> RoutineKey {
    RoutineKey {
      object_id: self.object_id,
      subprogram_id: self.subprogram_id,
    }
  }

  pub fn key(&self) -> AppendixKey {
    match self.position {
      Some(position) => AppendixKey::Argument(self.routine_key(), position),
      None => AppendixKey::Routine(self.routine_key()),
    }
  }

  /// Overwrites the fields this record sets. Applying a record twice is the
  /// same as applying it once.
  pub fn apply(&self, row: &mut IntrospectionRow) {
    overwrite(&mut row.routine_name, self.routine_name.as_ref());
    overwrite(&mut row.kind, self.kind.as_ref());
    overwrite(&mut row.direction, self.direction.as_ref());
    overwrite(&mut row.nullable, self.nullable.as_ref());
    overwrite(&mut row.has_default, self.has_default.as_ref());
    overwrite_optional(&mut row.argument_name, self.argument_name.as_ref());
    overwrite_optional(&mut row.native_type, self.native_type.as_ref());
    overwrite_optional(&mut row.custom_type_schema, self.custom_type_schema.as_ref());
    overwrite_optional(&mut row.custom_type_package, self.custom_type_package.as_ref());
    overwrite_optional(&mut row.custom_type, self.custom_type.as_ref());
  }
}

fn overwrite<T: Clone>(target: &mut T, value: Option<&T>) {
  if let Some(value) = value {
    target.clone_from(value);
  }
}

fn overwrite_optional<T: Clone>(target: &mut Option<T>, value: Option<&T>) {
  if let Some(value) = value {
    *target = Some(value.clone());
  }
}

/// Appendix records of one scheme, indexed by key.
#[derive(Debug, Clone, Default)]
pub struct Appendix<'a> {
  records: HashMap<AppendixKey, &'a AppendixRecord>,
}

impl<'a> Appendix<'a> {
  /// Indexes the records. Two records with the same key are a configuration error.
  pub fn new(scheme: &str, records: &'a [AppendixRecord]) -> Result<Self, GenerationError> {
    let mut indexed = HashMap::with_capacity(records.len());
    for record in records {
      let key = record.key();
      if indexed.insert(key, record).is_some() {
        return Err(GenerationError::configuration(
          format!("{scheme}: {key}"),
          "declared more than once",
        ));
      }
    }
    Ok(Self { records: indexed })
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Returns patched copies of `rows`; the input is never modified.
  ///
  /// The routine-level record is applied before the position-level one, so a
  /// field set by both ends up with the position-level value. Position keys
  /// match top-level rows only. Records matching no row fail the merge.
  pub fn merge(&self, scheme: &str, rows: &[IntrospectionRow]) -> Result<Vec<IntrospectionRow>, GenerationError> {
    if self.is_empty() {
      return Ok(rows.to_vec());
    }

    let mut matched = HashSet::with_capacity(self.len());
    let mut patched = Vec::with_capacity(rows.len());

    for row in rows {
      let mut row = row.clone();
      let routine_key = AppendixKey::Routine(row.key());
      let argument_key = AppendixKey::Argument(row.key(), row.position);

      if let Some(record) = self.records.get(&routine_key) {
        record.apply(&mut row);
        matched.insert(routine_key);
      }
      if row.data_level == 0
        && let Some(record) = self.records.get(&argument_key)
      {
        record.apply(&mut row);
        matched.insert(argument_key);
      }
      patched.push(row);
    }

    let mut dangling: Vec<_> = self.records.keys().filter(|key| !matched.contains(key)).collect();
    if !dangling.is_empty() {
      dangling.sort();
      let listed = dangling.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
      return Err(GenerationError::configuration(
        scheme,
        format!("appendix references routines or arguments missing from the catalog: {listed}"),
      ));
    }

    tracing::debug!(scheme, records = self.len(), rows = patched.len(), "appendix applied");
    Ok(patched)
  }
}

/// Applies `records` to `rows` in one step. See [`Appendix::merge`].
pub fn merge(
  scheme: &str,
  rows: &[IntrospectionRow],
  records: &[AppendixRecord],
) -> Result<Vec<IntrospectionRow>, GenerationError> {
  Appendix::new(scheme, records)?.merge(scheme, rows)
}
