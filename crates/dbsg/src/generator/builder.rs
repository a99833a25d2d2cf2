//! Assembles patched catalog rows into the IR tree.
//!
//! Building is a pure function of the rows, the filters, the casing engine and
//! the type table. Input row order does not matter: packages are ordered by
//! name, routines by catalog identifiers and arguments by catalog sequence.
//! The one exception is a routine with nested rows but incomplete sequence
//! numbers, whose rows keep their dump order.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use crate::{
  generator::{
    errors::GenerationError,
    filters::SchemeFilter,
    ir::{Argument, Database, OverloadSet, Package, QualifiedName, RETURN_ARGUMENT_NAME, Routine, Schema},
    metrics::GenerationWarning,
    naming::CasingEngine,
    types::{CustomTypeRef, GenericType, Resolution, TypeTable, normalize_native_type},
  },
  introspection::{Direction, IntrospectionRow, RoutineKey, RoutineKind},
};

/// Name given to unnamed members of a composite argument, such as the element
/// of a collection type.
pub const NESTED_ITEM_NAME: &str = "item";

/// One scheme's patched rows together with its selection settings.
#[derive(Debug, Clone, Copy)]
pub struct SchemeSource<'a> {
  pub name: &'a str,
  pub no_package_name: Option<&'a str>,
  pub rows: &'a [IntrospectionRow],
  pub filter: &'a SchemeFilter,
}

impl SchemeSource<'_> {
  /// Raw name of the package holding standalone routines, `<scheme>_no_pkg` by default.
  pub fn no_package_name(&self) -> String {
    self
      .no_package_name
      .map(|name| name.trim().to_lowercase())
      .filter(|name| !name.is_empty())
      .unwrap_or_else(|| format!("{}_no_pkg", self.name.trim().to_lowercase()))
  }
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
  pub database: Database,
  pub warnings: Vec<GenerationWarning>,
}

#[derive(Debug, Clone, Copy)]
pub struct IrBuilder<'a> {
  casing: &'a CasingEngine,
  types: &'a TypeTable,
}

type RoutineRows<'r> = BTreeMap<RoutineKey, Vec<&'r IntrospectionRow>>;

impl<'a> IrBuilder<'a> {
  pub fn new(casing: &'a CasingEngine, types: &'a TypeTable) -> Self {
    Self { casing, types }
  }

  /// Builds one database. Fails on the first fatal problem; non-fatal ones are
  /// returned as warnings next to the tree.
  pub fn build(&self, database: &str, schemes: &[SchemeSource<'_>]) -> Result<BuildOutput, GenerationError> {
    let database = database.trim().to_lowercase();
    let mut warnings = Vec::new();
    let mut built = Vec::with_capacity(schemes.len());

    for source in schemes {
      let schema = self.build_schema(source, &mut warnings)?;
      if built.iter().any(|other: &Schema| other.name == schema.name) {
        return Err(GenerationError::configuration(
          format!("{database}.{}", schema.name),
          "scheme is configured more than once",
        ));
      }
      built.push(schema);
    }

    tracing::debug!(database = %database, schemes = built.len(), warnings = warnings.len(), "database built");
    Ok(BuildOutput {
      database: Database {
        name: database,
        schemes: built,
      },
      warnings,
    })
  }

  pub fn build_schema(
    &self,
    source: &SchemeSource<'_>,
    warnings: &mut Vec<GenerationWarning>,
  ) -> Result<Schema, GenerationError> {
    let schema = source.name.trim().to_lowercase();
    let no_package_name = source.no_package_name();

    let mut grouped: BTreeMap<Option<String>, RoutineRows<'_>> = BTreeMap::new();
    let mut excluded = 0usize;
    for row in source.rows {
      if !source.filter.admits_row(row) {
        excluded += 1;
        continue;
      }
      let package = row
        .package_name
        .as_deref()
        .map(|package| package.trim().to_lowercase())
        .filter(|package| !package.is_empty());
      grouped
        .entry(package)
        .or_default()
        .entry(row.key())
        .or_default()
        .push(row);
    }
    tracing::debug!(scheme = %schema, excluded_rows = excluded, packages = grouped.len(), "rows filtered");

    let mut packages = Vec::with_capacity(grouped.len());
    for (package, routines) in grouped {
      packages.push(self.build_package(&schema, package, &no_package_name, &routines, warnings)?);
    }

    ensure_distinct_display_names(
      packages.iter().map(|package| (package.display_name.as_str(), package.name.as_str())),
      &QualifiedName::schema(&schema),
      "package",
    )?;

    Ok(Schema {
      name: schema,
      packages,
    })
  }

  fn build_package(
    &self,
    schema: &str,
    package: Option<String>,
    no_package_name: &str,
    routines: &RoutineRows<'_>,
    warnings: &mut Vec<GenerationWarning>,
  ) -> Result<Package, GenerationError> {
    let is_package = package.is_some();
    let name = package.unwrap_or_else(|| no_package_name.to_string());
    let display_name = self.display_name(&name, &QualifiedName::schema(schema).with_package(Some(&name)))?;
    let parent = QualifiedName::schema(schema).with_package(is_package.then_some(name.as_str()));

    // Sets keep the position of their lowest routine key.
    let mut sets: IndexMap<String, Vec<Routine>> = IndexMap::new();
    for (key, rows) in routines {
      let routine = self.build_routine(&parent, *key, rows, warnings)?;
      sets.entry(routine.name.clone()).or_default().push(routine);
    }

    let mut overloads = Vec::with_capacity(sets.len());
    for (routine_name, mut members) in sets {
      members.sort_by_key(|routine| (routine.overload.unwrap_or(0), routine.object_id, routine.subprogram_id));
      ensure_distinct_signatures(&parent.clone().with_routine(&routine_name), &members)?;
      let display_name = members
        .first()
        .map(|routine| routine.display_name.clone())
        .unwrap_or_default();
      overloads.push(OverloadSet {
        name: routine_name,
        display_name,
        routines: members,
      });
    }

    ensure_distinct_display_names(
      overloads.iter().map(|set| (set.display_name.as_str(), set.name.as_str())),
      &parent,
      "routine",
    )?;

    Ok(
      Package::builder()
        .name(name)
        .display_name(display_name)
        .is_package(is_package)
        .overloads(overloads)
        .build(),
    )
  }

  fn build_routine(
    &self,
    parent: &QualifiedName,
    key: RoutineKey,
    rows: &[&IntrospectionRow],
    warnings: &mut Vec<GenerationWarning>,
  ) -> Result<Routine, GenerationError> {
    let mut rows = rows.to_vec();
    sort_catalog_rows(&mut rows);

    let first = rows
      .first()
      .ok_or_else(|| GenerationError::schema_integrity(key, "routine has no catalog rows"))?;
    let name = first.routine_name.trim().to_lowercase();
    let kind = first.kind;
    let overload = first.overload;
    let entity = parent.clone().with_routine(&name);

    if let Some(row) = rows
      .iter()
      .find(|row| row.routine_name.trim().to_lowercase() != name || row.kind != kind)
    {
      return Err(GenerationError::schema_integrity(
        &entity,
        format!(
          "rows of {key} disagree on the routine: '{name}' {kind} vs '{}' {}",
          row.routine_name, row.kind
        ),
      ));
    }

    let display_name = self.display_name(&name, &entity)?;
    let arguments = self.build_arguments(&entity, kind, &rows, warnings)?;

    Ok(
      Routine::builder()
        .kind(kind)
        .name(name)
        .display_name(display_name)
        .object_id(key.object_id)
        .subprogram_id(key.subprogram_id)
        .maybe_overload(overload)
        .call_name(entity.call_name())
        .arguments(arguments)
        .build(),
    )
  }

  /// Rows must already be in catalog sequence order. Nested rows attach to the
  /// most recent argument one data level above them.
  fn build_arguments(
    &self,
    routine: &QualifiedName,
    kind: RoutineKind,
    rows: &[&IntrospectionRow],
    warnings: &mut Vec<GenerationWarning>,
  ) -> Result<Vec<Argument>, GenerationError> {
    let mut top_level = Vec::new();
    let mut open: Vec<Argument> = Vec::new();

    for row in rows.iter().filter(|row| !row.is_placeholder()) {
      let level = row.data_level as usize;
      if level > open.len() {
        return Err(GenerationError::schema_integrity(
          routine,
          format!(
            "argument at position {} and data level {level} has no enclosing composite argument",
            row.position
          ),
        ));
      }
      close_open_arguments(&mut open, &mut top_level, level);
      if let Some(parent) = open.last().filter(|parent| !parent.is_composite()) {
        return Err(GenerationError::schema_integrity(
          routine.clone().with_argument(&parent.name),
          format!(
            "argument at position {} and data level {level} is nested under '{}', which is not a composite type",
            row.position, parent.name
          ),
        ));
      }
      open.push(self.build_argument(routine, kind, row, warnings)?);
    }
    close_open_arguments(&mut open, &mut top_level, 0);

    if kind == RoutineKind::Function && !top_level.iter().any(|argument| argument.is_return) {
      warnings.push(GenerationWarning::MissingReturnArgument {
        entity: routine.to_string(),
      });
      let entity = routine.clone().with_argument(RETURN_ARGUMENT_NAME);
      top_level.insert(
        0,
        Argument::builder()
          .name(RETURN_ARGUMENT_NAME)
          .display_name(self.display_name(RETURN_ARGUMENT_NAME, &entity)?)
          .position(0)
          .direction(Direction::Out)
          .generic_type(GenericType::Unknown)
          .is_return(true)
          .build(),
      );
    }

    top_level.sort_by_key(|argument| argument.position);
    ensure_contiguous_positions(routine, kind, &top_level)?;
    ensure_distinct_display_names(
      top_level
        .iter()
        .map(|argument| (argument.display_name.as_str(), argument.name.as_str())),
      routine,
      "argument",
    )?;

    Ok(top_level)
  }

  fn build_argument(
    &self,
    routine: &QualifiedName,
    kind: RoutineKind,
    row: &IntrospectionRow,
    warnings: &mut Vec<GenerationWarning>,
  ) -> Result<Argument, GenerationError> {
    let is_return = kind == RoutineKind::Function && row.data_level == 0 && row.position == 0;
    let declared = row
      .argument_name
      .as_deref()
      .map(str::trim)
      .filter(|name| !name.is_empty())
      .map(str::to_lowercase);

    let name = match declared {
      _ if is_return => RETURN_ARGUMENT_NAME.to_string(),
      Some(name) => name,
      None if row.data_level > 0 => NESTED_ITEM_NAME.to_string(),
      None => {
        return Err(GenerationError::schema_integrity(
          routine,
          format!("argument at position {} has no name", row.position),
        ));
      }
    };

    let entity = routine.clone().with_argument(&name);
    let display_name = self.display_name(&name, &entity)?;
    let native_type = row
      .native_type
      .as_deref()
      .map(str::trim)
      .filter(|native| !native.is_empty())
      .map(str::to_lowercase);

    let custom = CustomTypeRef {
      schema: row.custom_type_schema.as_deref(),
      package: row.custom_type_package.as_deref(),
      name: row.custom_type.as_deref(),
    };
    if custom.is_dangling() {
      warnings.push(GenerationWarning::DanglingCustomType {
        entity: entity.to_string(),
        reference: custom.qualified_name(),
      });
    }

    let resolution = self.types.resolve(native_type.as_deref(), &custom);
    if resolution == Resolution::Unmapped {
      warnings.push(GenerationWarning::UnmappedType {
        entity: entity.to_string(),
        native_type: native_type.clone().unwrap_or_default(),
      });
    }
    let generic_type = resolution.generic_type();
    let custom_type = match &generic_type {
      GenericType::Custom { name } => Some(name.clone()),
      _ => None,
    };

    Ok(
      Argument::builder()
        .name(name)
        .display_name(display_name)
        .position(row.position)
        .direction(if is_return { Direction::Out } else { row.direction })
        .maybe_native_type(native_type)
        .nullable(row.nullable)
        .has_default(row.has_default)
        .generic_type(generic_type)
        .maybe_custom_type(custom_type)
        .is_return(is_return)
        .build(),
    )
  }

  fn display_name(&self, name: &str, entity: &QualifiedName) -> Result<String, GenerationError> {
    self
      .casing
      .to_identifier(name)
      .map_err(|error| GenerationError::Naming {
        entity: entity.to_string(),
        identifier: error.identifier,
      })
  }
}

/// Orders one routine's rows. Sequence numbers are only comparable when every
/// row has one; otherwise flat routines fall back to positions and routines
/// with nested rows keep dump order, which is the catalog's own order.
fn sort_catalog_rows(rows: &mut [&IntrospectionRow]) {
  let sequenced = rows
    .iter()
    .filter(|row| !row.is_placeholder())
    .all(|row| row.sequence.is_some());
  if sequenced {
    rows.sort_by_key(|row| row.sequence_key());
  } else if rows.iter().all(|row| row.data_level == 0) {
    rows.sort_by_key(|row| row.position);
  }
}

/// Pops open arguments deeper than `level` into their parents.
fn close_open_arguments(open: &mut Vec<Argument>, top_level: &mut Vec<Argument>, level: usize) {
  while open.len() > level {
    let Some(done) = open.pop() else { break };
    match open.last_mut() {
      Some(parent) => parent.fields.push(done),
      None => top_level.push(done),
    }
  }
}

/// Functions count from the result at 0, procedures from 1 (or 0 when the
/// catalog starts there). Arguments must be sorted by position.
fn ensure_contiguous_positions(
  routine: &QualifiedName,
  kind: RoutineKind,
  arguments: &[Argument],
) -> Result<(), GenerationError> {
  let start = match arguments.first() {
    None => return Ok(()),
    Some(first) if kind == RoutineKind::Function || first.position == 0 => 0,
    Some(_) => 1,
  };

  for (expected, argument) in (start..).zip(arguments) {
    if argument.position != expected {
      return Err(GenerationError::schema_integrity(
        routine.clone().with_argument(&argument.name),
        format!(
          "argument positions must be unique and contiguous from {start}: found {} where {expected} was expected",
          argument.position
        ),
      ));
    }
  }
  Ok(())
}

fn ensure_distinct_display_names<'n>(
  names: impl IntoIterator<Item = (&'n str, &'n str)>,
  parent: &QualifiedName,
  what: &str,
) -> Result<(), GenerationError> {
  let mut seen: HashMap<&str, &str> = HashMap::new();
  for (display_name, raw_name) in names {
    if let Some(previous) = seen.insert(display_name, raw_name) {
      return Err(GenerationError::schema_integrity(
        parent,
        format!("{what}s '{previous}' and '{raw_name}' both resolve to the name '{display_name}'"),
      ));
    }
  }
  Ok(())
}

/// Overloads whose parameter lists match name for name, direction for
/// direction and type for type cannot be told apart by a caller.
fn ensure_distinct_signatures(set: &QualifiedName, routines: &[Routine]) -> Result<(), GenerationError> {
  let mut seen = HashMap::with_capacity(routines.len());
  for routine in routines {
    let signature: Vec<_> = routine
      .parameters()
      .map(|argument| {
        (
          argument.name.as_str(),
          argument.direction,
          argument.native_type.as_deref().map(normalize_native_type),
          argument.custom_type.as_deref(),
        )
      })
      .collect();
    let key = RoutineKey {
      object_id: routine.object_id,
      subprogram_id: routine.subprogram_id,
    };
    if let Some(previous) = seen.insert(signature, key) {
      return Err(GenerationError::schema_integrity(
        set,
        format!("overloads ({previous}) and ({key}) have identical signatures"),
      ));
    }
  }
  Ok(())
}
