use serde::Deserialize;

use super::{Artifact, Plugin, PluginError, RenderContext, RenderOutput};

pub const NAME: &str = "json";

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonOptions {
  pretty: bool,
}

impl Default for JsonOptions {
  fn default() -> Self {
    Self { pretty: true }
  }
}

/// Dumps the whole IR tree as `<database>/<database>.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPlugin;

impl Plugin for JsonPlugin {
  fn name(&self) -> &'static str {
    NAME
  }

  fn render(&self, context: &RenderContext<'_>) -> Result<RenderOutput, PluginError> {
    let options: JsonOptions = context.options()?;
    let database = context.database;

    let mut tree = serde_json::Map::new();
    tree.insert(database.name.clone(), serde_json::to_value(database)?);
    let tree = serde_json::Value::Object(tree);

    let mut content = if options.pretty {
      serde_json::to_vec_pretty(&tree)?
    } else {
      serde_json::to_vec(&tree)?
    };
    content.push(b'\n');

    Ok(RenderOutput {
      artifacts: vec![Artifact::new(
        format!("{name}/{name}.json", name = database.name),
        content,
      )],
      failures: vec![],
    })
  }
}
