//! Per-scheme routine selection.

use std::{collections::BTreeSet, fmt::Display};

use crate::{generator::errors::GenerationError, introspection::IntrospectionRow};

/// A filter entry normalized to the catalog's own qualification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutinePath {
  pub schema: String,
  /// `None` for standalone routines.
  pub package: Option<String>,
  pub routine: String,
}

impl RoutinePath {
  /// Normalizes `schema.package.routine`, `package.routine`, `schema.routine`
  /// (first segment equal to `scheme`) or a bare `routine`.
  ///
  /// A bare routine name refers to a standalone routine, never a package member.
  pub fn parse(scheme: &str, entry: &str) -> Result<Self, GenerationError> {
    let scheme = scheme.to_lowercase();
    let mut segments: Vec<String> = entry.trim().split('.').map(|s| s.trim().to_lowercase()).collect();

    if segments.iter().any(String::is_empty) {
      return Err(filter_error(&scheme, entry, "empty name segment"));
    }
    if segments.len() == 1 || segments[0] != scheme {
      segments.insert(0, scheme.clone());
    }
    if segments.len() == 2 {
      segments.insert(1, String::new());
    }

    match <[String; 3]>::try_from(segments) {
      Ok([schema, package, routine]) => Ok(Self {
        schema,
        package: Some(package).filter(|package| !package.is_empty()),
        routine,
      }),
      Err(_) => Err(filter_error(
        &scheme,
        entry,
        "expected `routine`, `package.routine` or `schema.package.routine`",
      )),
    }
  }
}

impl Display for RoutinePath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.package {
      Some(package) => write!(f, "{}.{package}.{}", self.schema, self.routine),
      None => write!(f, "{}.{}", self.schema, self.routine),
    }
  }
}

fn filter_error(scheme: &str, entry: &str, message: &str) -> GenerationError {
  GenerationError::configuration(format!("{scheme}: filter entry '{entry}'"), message)
}

/// Inclusion and exclusion lists of one scheme, already normalized.
///
/// A non-empty include list is authoritative: the exclude lists are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemeFilter {
  schema: String,
  include_routines: BTreeSet<RoutinePath>,
  exclude_packages: BTreeSet<String>,
  exclude_routines: BTreeSet<RoutinePath>,
}

impl SchemeFilter {
  pub fn new<S: AsRef<str>>(
    scheme: &str,
    include_routines: &[S],
    exclude_routines: &[S],
    exclude_packages: &[S],
  ) -> Result<Self, GenerationError> {
    let schema = scheme.to_lowercase();
    let parse_all = |entries: &[S]| {
      entries
        .iter()
        .map(|entry| RoutinePath::parse(&schema, entry.as_ref()))
        .collect::<Result<BTreeSet<_>, _>>()
    };

    let include_routines = parse_all(include_routines)?;
    let exclude_routines = parse_all(exclude_routines)?;
    let exclude_packages = exclude_packages
      .iter()
      .map(|entry| parse_package(&schema, entry.as_ref()))
      .collect::<Result<BTreeSet<_>, _>>()?;

    if !include_routines.is_empty() && !(exclude_routines.is_empty() && exclude_packages.is_empty()) {
      tracing::debug!(scheme = %schema, "include_routines given, exclude lists are ignored");
    }

    Ok(Self {
      schema,
      include_routines,
      exclude_packages,
      exclude_routines,
    })
  }

  /// Lets every routine through.
  pub fn allow_all(scheme: &str) -> Self {
    Self {
      schema: scheme.to_lowercase(),
      ..Self::default()
    }
  }

  pub fn is_include_only(&self) -> bool {
    !self.include_routines.is_empty()
  }

  /// Decides on lowercased names; `package` is `None` for standalone routines.
  pub fn admits(&self, package: Option<&str>, routine: &str) -> bool {
    let path = RoutinePath {
      schema: self.schema.clone(),
      package: package.map(str::to_lowercase),
      routine: routine.to_lowercase(),
    };

    if self.is_include_only() {
      return self.include_routines.contains(&path);
    }
    if let Some(package) = &path.package
      && self.exclude_packages.contains(package)
    {
      return false;
    }
    !self.exclude_routines.contains(&path)
  }

  pub fn admits_row(&self, row: &IntrospectionRow) -> bool {
    let package = row.package_name.as_deref().filter(|package| !package.trim().is_empty());
    self.admits(package, &row.routine_name)
  }
}

/// `package` or `schema.package`.
fn parse_package(schema: &str, entry: &str) -> Result<String, GenerationError> {
  let segments: Vec<String> = entry.trim().split('.').map(|s| s.trim().to_lowercase()).collect();
  match segments.as_slice() {
    [package] if !package.is_empty() => Ok(package.clone()),
    [owner, package] if owner == schema && !package.is_empty() => Ok(package.clone()),
    _ => Err(filter_error(schema, entry, "expected `package` or `schema.package`")),
  }
}
