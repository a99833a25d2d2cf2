use std::path::Path;

use anyhow::Context;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Row, Table};

use crate::{
  generator::{
    builder::{IrBuilder, SchemeSource},
    filters::SchemeFilter,
    ir::Database,
    naming::CasingEngine,
    types::TypeTable,
  },
  introspection::Introspection,
  ui::{Colors, colors::to_comfy, term_width},
};

/// Builds every database of the dump with default settings: no filters, no
/// appendix, no abbreviations.
fn build_all(dump: &Introspection) -> anyhow::Result<Vec<Database>> {
  let casing = CasingEngine::default();
  let types = TypeTable::default();
  let builder = IrBuilder::new(&casing, &types);

  dump
    .databases
    .iter()
    .map(|database| {
      let filters: Vec<_> = database
        .schemes
        .iter()
        .map(|scheme| SchemeFilter::allow_all(&scheme.name))
        .collect();
      let sources: Vec<_> = database
        .schemes
        .iter()
        .zip(&filters)
        .map(|(scheme, filter)| SchemeSource {
          name: &scheme.name,
          no_package_name: None,
          rows: &scheme.rows,
          filter,
        })
        .collect();
      builder
        .build(&database.name, &sources)
        .map(|output| output.database)
        .with_context(|| format!("Failed to build database '{}'", database.name))
    })
    .collect()
}

/// `(database, call name, kind, argument count)`, sorted.
fn routine_rows(databases: &[Database]) -> Vec<(String, String, String, usize)> {
  let mut rows: Vec<_> = databases
    .iter()
    .flat_map(|database| {
      database.routines().map(move |(_, _, routine)| {
        (
          database.name.clone(),
          routine.call_name.clone(),
          routine.kind.to_string(),
          routine.parameters().count(),
        )
      })
    })
    .collect();
  rows.sort();
  rows
}

pub async fn list_routines(input: &Path, colors: &Colors) -> anyhow::Result<()> {
  let dump = Introspection::load(input).await?;
  let databases = build_all(&dump)?;

  let mut table = Table::new();
  table
    .load_preset("  ── ──            ")
    .set_content_arrangement(ContentArrangement::Dynamic)
    .set_width(term_width());

  let mut row = Row::new();
  for header in ["DATABASE", "ROUTINE", "KIND", "ARGUMENTS"] {
    row.add_cell(Cell::new(header).fg(to_comfy(colors.label())));
  }
  table.set_header(row);

  for (database, call_name, kind, arguments) in routine_rows(&databases) {
    let mut row = Row::new();
    row.add_cell(Cell::new(database).fg(to_comfy(colors.muted())));
    row.add_cell(
      Cell::new(call_name)
        .fg(to_comfy(colors.value()))
        .add_attribute(Attribute::Bold),
    );
    row.add_cell(Cell::new(kind).fg(to_comfy(colors.accent())));
    row.add_cell(
      Cell::new(arguments)
        .fg(to_comfy(colors.primary()))
        .set_alignment(CellAlignment::Right),
    );
    table.add_row(row);
  }

  println!("{table}");

  Ok(())
}
