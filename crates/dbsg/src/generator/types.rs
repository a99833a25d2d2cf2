//! Mapping from native catalog type names to the generic type vocabulary.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The closed set of generic kinds every plugin understands.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GenericKind {
  String,
  Number,
  Boolean,
  Datetime,
  Binary,
  CursorResultSet,
  Object,
  Unknown,
}

/// A resolved argument type: one of the generic kinds, or an opaque custom type
/// carrying its qualified catalog name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenericType {
  String,
  Number,
  Boolean,
  Datetime,
  Binary,
  CursorResultSet,
  Object,
  Unknown,
  Custom { name: String },
}

impl From<GenericKind> for GenericType {
  fn from(kind: GenericKind) -> Self {
    match kind {
      GenericKind::String => Self::String,
      GenericKind::Number => Self::Number,
      GenericKind::Boolean => Self::Boolean,
      GenericKind::Datetime => Self::Datetime,
      GenericKind::Binary => Self::Binary,
      GenericKind::CursorResultSet => Self::CursorResultSet,
      GenericKind::Object => Self::Object,
      GenericKind::Unknown => Self::Unknown,
    }
  }
}

impl std::fmt::Display for GenericType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Custom { name } => write!(f, "custom({name})"),
      Self::String => f.write_str("string"),
      Self::Number => f.write_str("number"),
      Self::Boolean => f.write_str("boolean"),
      Self::Datetime => f.write_str("datetime"),
      Self::Binary => f.write_str("binary"),
      Self::CursorResultSet => f.write_str("cursor_result_set"),
      Self::Object => f.write_str("object"),
      Self::Unknown => f.write_str("unknown"),
    }
  }
}

/// Schema-qualified reference to a user-defined catalog type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomTypeRef<'a> {
  pub schema: Option<&'a str>,
  pub package: Option<&'a str>,
  pub name: Option<&'a str>,
}

impl CustomTypeRef<'_> {
  pub fn is_empty(&self) -> bool {
    [self.schema, self.package, self.name]
      .into_iter()
      .flatten()
      .all(|part| part.trim().is_empty())
  }

  /// A reference with schema or package components but no type name.
  pub fn is_dangling(&self) -> bool {
    !self.is_empty() && self.name.is_none_or(|name| name.trim().is_empty())
  }

  /// `schema.package.type`, skipping absent components, lowercased.
  pub fn qualified_name(&self) -> String {
    [self.schema, self.package, self.name]
      .into_iter()
      .flatten()
      .map(str::trim)
      .filter(|part| !part.is_empty())
      .map(str::to_lowercase)
      .collect::<Vec<_>>()
      .join(".")
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  Mapped(GenericType),
  /// No table entry; the argument gets [`GenericType::Unknown`].
  Unmapped,
}

impl Resolution {
  pub fn generic_type(self) -> GenericType {
    match self {
      Self::Mapped(generic) => generic,
      Self::Unmapped => GenericType::Unknown,
    }
  }
}

static BUILTIN_MAPPINGS: &[(&str, GenericKind)] = &[
  ("varchar2", GenericKind::String),
  ("nvarchar2", GenericKind::String),
  ("varchar", GenericKind::String),
  ("char", GenericKind::String),
  ("nchar", GenericKind::String),
  ("character varying", GenericKind::String),
  ("text", GenericKind::String),
  ("clob", GenericKind::String),
  ("nclob", GenericKind::String),
  ("long", GenericKind::String),
  ("rowid", GenericKind::String),
  ("urowid", GenericKind::String),
  ("interval year to month", GenericKind::String),
  ("interval day to second", GenericKind::String),
  ("json", GenericKind::String),
  ("number", GenericKind::Number),
  ("integer", GenericKind::Number),
  ("float", GenericKind::Number),
  ("binary_integer", GenericKind::Number),
  ("pls_integer", GenericKind::Number),
  ("binary_float", GenericKind::Number),
  ("binary_double", GenericKind::Number),
  ("natural", GenericKind::Number),
  ("positive", GenericKind::Number),
  ("smallint", GenericKind::Number),
  ("bigint", GenericKind::Number),
  ("numeric", GenericKind::Number),
  ("real", GenericKind::Number),
  ("double precision", GenericKind::Number),
  ("pl/sql boolean", GenericKind::Boolean),
  ("boolean", GenericKind::Boolean),
  ("date", GenericKind::Datetime),
  ("timestamp", GenericKind::Datetime),
  ("timestamp with time zone", GenericKind::Datetime),
  ("timestamp with local time zone", GenericKind::Datetime),
  ("timestamptz", GenericKind::Datetime),
  ("blob", GenericKind::Binary),
  ("raw", GenericKind::Binary),
  ("long raw", GenericKind::Binary),
  ("bfile", GenericKind::Binary),
  ("bytea", GenericKind::Binary),
  ("ref cursor", GenericKind::CursorResultSet),
  ("refcursor", GenericKind::CursorResultSet),
  ("object", GenericKind::Object),
  ("varray", GenericKind::Object),
  ("table", GenericKind::Object),
  ("record", GenericKind::Object),
  ("pl/sql table", GenericKind::Object),
  ("pl/sql record", GenericKind::Object),
];

/// Native types whose arguments may carry nested member rows.
static COMPOSITE_NATIVE_TYPES: &[&str] = &[
  "ref cursor",
  "object",
  "varray",
  "table",
  "record",
  "pl/sql table",
  "pl/sql record",
];

static PRECISION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\([^)]*\)").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Lowercases, drops precision/scale suffixes and collapses whitespace:
/// `TIMESTAMP(6)  WITH TIME ZONE` becomes `timestamp with time zone`.
pub fn normalize_native_type(native: &str) -> String {
  let without_precision = PRECISION_RE.replace_all(native.trim(), "");
  WHITESPACE_RE
    .replace_all(without_precision.trim(), " ")
    .to_lowercase()
}

pub fn is_composite_native_type(native: &str) -> bool {
  COMPOSITE_NATIVE_TYPES.contains(&normalize_native_type(native).as_str())
}

/// Native type name to generic kind table. Built once, then shared read-only.
#[derive(Debug, Clone)]
pub struct TypeTable {
  mappings: HashMap<String, GenericKind>,
}

impl Default for TypeTable {
  fn default() -> Self {
    Self {
      mappings: BUILTIN_MAPPINGS
        .iter()
        .map(|(native, kind)| ((*native).to_string(), *kind))
        .collect(),
    }
  }
}

impl TypeTable {
  pub fn insert(&mut self, native: &str, kind: GenericKind) {
    self.mappings.insert(normalize_native_type(native), kind);
  }

  /// A custom type with a type name wins over the native type unconditionally.
  pub fn resolve(&self, native: Option<&str>, custom: &CustomTypeRef<'_>) -> Resolution {
    if !custom.is_empty() && !custom.is_dangling() {
      return Resolution::Mapped(GenericType::Custom {
        name: custom.qualified_name(),
      });
    }

    native
      .map(normalize_native_type)
      .and_then(|native| self.mappings.get(&native).copied())
      .map_or(Resolution::Unmapped, |kind| Resolution::Mapped(kind.into()))
  }
}
