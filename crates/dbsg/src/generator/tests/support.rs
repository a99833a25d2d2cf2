use crate::{
  generator::{
    builder::{BuildOutput, IrBuilder, SchemeSource},
    errors::GenerationError,
    filters::SchemeFilter,
    naming::{AbbreviationTable, CasingEngine},
    types::TypeTable,
  },
  introspection::{Direction, Introspection, IntrospectionDatabase, IntrospectionRow, IntrospectionSchema, RoutineKind},
};

pub(super) const SCHEME: &str = "bills";
pub(super) const BILLING_ID: i64 = 100;

pub(super) struct RowBuilder(IntrospectionRow);

fn routine(object_id: i64, subprogram_id: i64, package: Option<&str>, name: &str, kind: RoutineKind) -> RowBuilder {
  RowBuilder(IntrospectionRow {
    object_id,
    subprogram_id,
    package_name: package.map(str::to_uppercase),
    routine_name: name.to_uppercase(),
    kind,
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
  })
}

pub(super) fn procedure(object_id: i64, subprogram_id: i64, package: Option<&str>, name: &str) -> RowBuilder {
  routine(object_id, subprogram_id, package, name, RoutineKind::Procedure)
}

pub(super) fn function(object_id: i64, subprogram_id: i64, package: Option<&str>, name: &str) -> RowBuilder {
  routine(object_id, subprogram_id, package, name, RoutineKind::Function)
}

impl RowBuilder {
  pub(super) fn arg(self, position: u32, name: &str, direction: Direction, native: &str) -> IntrospectionRow {
    IntrospectionRow {
      position,
      argument_name: Some(name.to_uppercase()),
      direction,
      native_type: Some(native.to_uppercase()),
      ..self.0
    }
  }

  pub(super) fn returns(self, native: &str) -> IntrospectionRow {
    IntrospectionRow {
      position: 0,
      direction: Direction::Out,
      native_type: Some(native.to_uppercase()),
      ..self.0
    }
  }

  /// A nested member of the composite argument declared just before it.
  pub(super) fn field(self, sequence: u32, position: u32, name: &str, native: &str) -> IntrospectionRow {
    IntrospectionRow {
      sequence: Some(sequence),
      data_level: 1,
      ..self.arg(position, name, Direction::In, native)
    }
  }

  pub(super) fn placeholder(self) -> IntrospectionRow {
    self.0
  }
}

/// Catalog rows of the `bills` scheme:
///
/// - package `billing`: overloaded `charge` (two signatures), function
///   `get_rate`, procedure `payroll` with a record argument
/// - standalone procedure `ping` without arguments, standalone function `now`
pub(super) fn billing_rows() -> Vec<IntrospectionRow> {
  let billing = Some("billing");
  vec![
    procedure(BILLING_ID, 1, billing, "charge").arg(1, "p_amount", Direction::In, "number"),
    IntrospectionRow {
      has_default: true,
      ..procedure(BILLING_ID, 1, billing, "charge").arg(2, "p_currency", Direction::In, "varchar2")
    },
    procedure(BILLING_ID, 2, billing, "charge").arg(1, "p_amount", Direction::In, "number"),
    function(BILLING_ID, 3, billing, "get_rate").returns("number"),
    function(BILLING_ID, 3, billing, "get_rate").arg(1, "p_currency", Direction::In, "varchar2"),
    IntrospectionRow {
      sequence: Some(1),
      ..procedure(BILLING_ID, 4, billing, "payroll").arg(1, "out_payroll_id", Direction::Out, "number")
    },
    IntrospectionRow {
      sequence: Some(2),
      ..procedure(BILLING_ID, 4, billing, "payroll").arg(2, "p_rec", Direction::In, "pl/sql record")
    },
    procedure(BILLING_ID, 4, billing, "payroll").field(3, 1, "id", "number"),
    procedure(BILLING_ID, 4, billing, "payroll").field(4, 2, "name", "varchar2"),
    procedure(200, 1, None, "ping").placeholder(),
    function(201, 1, None, "now").returns("date"),
  ]
}

pub(super) fn default_casing() -> CasingEngine {
  CasingEngine::new(AbbreviationTable::new())
}

pub(super) fn build_with(
  casing: &CasingEngine,
  rows: &[IntrospectionRow],
  filter: &SchemeFilter,
  no_package_name: Option<&str>,
) -> Result<BuildOutput, GenerationError> {
  let types = TypeTable::default();
  let source = SchemeSource {
    name: SCHEME,
    no_package_name,
    rows,
    filter,
  };
  IrBuilder::new(casing, &types).build("db", &[source])
}

pub(super) fn build(rows: &[IntrospectionRow]) -> Result<BuildOutput, GenerationError> {
  build_with(&default_casing(), rows, &SchemeFilter::allow_all(SCHEME), None)
}

pub(super) fn dump(rows: Vec<IntrospectionRow>) -> Introspection {
  Introspection {
    databases: vec![IntrospectionDatabase {
      name: "DB".to_string(),
      schemes: vec![IntrospectionSchema {
        name: SCHEME.to_uppercase(),
        rows,
      }],
    }],
  }
}
