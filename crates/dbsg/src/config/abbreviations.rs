//! Abbreviation files: one `token` or `token=Literal` rule per line, `#` starts a comment.

use std::path::Path;

use anyhow::Context;

use crate::generator::naming::AbbreviationTable;

/// Adds every rule in `content` to `table`, in file order.
pub fn parse_into(table: &mut AbbreviationTable, content: &str) {
  for line in content.lines() {
    let rule = line.split_once('#').map_or(line, |(rule, _)| rule).trim();
    if !rule.is_empty() {
      table.insert_declaration(rule);
    }
  }
}

/// Reads the files in order, then appends the inline `declarations`. A later
/// declaration of a token replaces an earlier one.
pub async fn load<P: AsRef<Path>>(files: &[P], declarations: &[String]) -> anyhow::Result<AbbreviationTable> {
  let mut table = AbbreviationTable::new();
  for file in files {
    let file = file.as_ref();
    let content = tokio::fs::read_to_string(file)
      .await
      .with_context(|| format!("Failed to read abbreviation file: {}", file.display()))?;
    parse_into(&mut table, &content);
  }
  for declaration in declarations {
    table.insert_declaration(declaration);
  }
  if table.is_empty() {
    tracing::debug!(files = files.len(), "no abbreviations declared");
  } else {
    tracing::debug!(rules = table.len(), files = files.len(), "abbreviations loaded");
  }
  Ok(table)
}
