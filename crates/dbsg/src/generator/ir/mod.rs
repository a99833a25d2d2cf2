//! Intermediate representation handed read-only to every plugin.
//!
//! `Database -> Schema -> Package -> OverloadSet -> Routine -> Argument`.
//! All raw names are lowercased catalog identifiers; display names come from
//! the casing engine and are not escaped for any target language.

mod qualified;


pub use qualified::QualifiedName;
use serde::Serialize;

pub use crate::introspection::{Direction, RoutineKind};
use crate::generator::types::{GenericType, is_composite_native_type};

/// Raw name of the implicit function result argument. It is a reserved word in
/// PL/SQL, so it never collides with a declared parameter.
pub const RETURN_ARGUMENT_NAME: &str = "return";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Database {
  pub name: String,
  pub schemes: Vec<Schema>,
}

impl Database {
  pub fn routines(&self) -> impl Iterator<Item = (&Schema, &Package, &Routine)> {
    self.schemes.iter().flat_map(|schema| {
      schema.packages.iter().flat_map(move |package| {
        package
          .routines()
          .map(move |routine| (schema, package, routine))
      })
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
  pub name: String,
  pub packages: Vec<Package>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
pub struct Package {
  #[builder(into)]
  pub name: String,
  #[builder(into)]
  pub display_name: String,
  /// `false` for the synthetic package holding standalone routines.
  pub is_package: bool,
  #[builder(default)]
  pub overloads: Vec<OverloadSet>,
}

impl Package {
  pub fn routines(&self) -> impl Iterator<Item = &Routine> {
    self.overloads.iter().flat_map(|set| &set.routines)
  }
}

/// Routines sharing one name within a package, in catalog declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverloadSet {
  pub name: String,
  pub display_name: String,
  pub routines: Vec<Routine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
pub struct Routine {
  pub kind: RoutineKind,
  #[builder(into)]
  pub name: String,
  #[builder(into)]
  pub display_name: String,
  pub object_id: i64,
  pub subprogram_id: i64,
  pub overload: Option<u32>,
  /// `SCHEMA.PACKAGE.ROUTINE`, or `SCHEMA.ROUTINE` for standalone routines.
  #[builder(into)]
  pub call_name: String,
  #[builder(default)]
  pub arguments: Vec<Argument>,
}

impl Routine {
  pub fn return_argument(&self) -> Option<&Argument> {
    self.arguments.iter().find(|argument| argument.is_return)
  }

  /// Declared parameters, without the function result.
  pub fn parameters(&self) -> impl Iterator<Item = &Argument> {
    self.arguments.iter().filter(|argument| !argument.is_return)
  }

  /// Declared parameters with defaulted ones moved behind the rest, keeping order otherwise.
  pub fn sorted_parameters(&self) -> Vec<&Argument> {
    let mut parameters: Vec<_> = self.parameters().collect();
    parameters.sort_by_key(|argument| argument.has_default);
    parameters
  }

  pub fn has_inputs(&self) -> bool {
    self.parameters().any(|argument| argument.direction.is_input())
  }

  pub fn has_outputs(&self) -> bool {
    self.parameters().any(|argument| argument.direction != Direction::In)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
pub struct Argument {
  #[builder(into)]
  pub name: String,
  #[builder(into)]
  pub display_name: String,
  pub position: u32,
  pub direction: Direction,
  pub native_type: Option<String>,
  #[builder(default = true)]
  pub nullable: bool,
  #[builder(default)]
  pub has_default: bool,
  pub generic_type: GenericType,
  /// Qualified custom type name, when the catalog or the appendix supplied one.
  pub custom_type: Option<String>,
  #[builder(default)]
  pub is_return: bool,
  /// Members of a composite argument (record fields, collection element).
  #[builder(default)]
  pub fields: Vec<Argument>,
}

impl Argument {
  /// Records, objects, collections and cursors; the only arguments nested rows
  /// may attach to.
  pub fn is_composite(&self) -> bool {
    matches!(self.generic_type, GenericType::Object | GenericType::Custom { .. })
      || self.native_type.as_deref().is_some_and(is_composite_native_type)
  }
}
