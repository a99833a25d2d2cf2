use super::{Artifact, Plugin, PluginError, RenderContext, RenderOutput};
use crate::introspection::Introspection;

pub const NAME: &str = "raw-introspection";

/// Writes the patched catalog rows back out in the dump format the loader
/// reads, as `<database>/<database>_raw.json`, so a run can be replayed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawIntrospectionPlugin;

impl Plugin for RawIntrospectionPlugin {
  fn name(&self) -> &'static str {
    NAME
  }

  fn render(&self, context: &RenderContext<'_>) -> Result<RenderOutput, PluginError> {
    let dump = Introspection {
      databases: vec![context.introspection.clone()],
    };
    let mut content = serde_json::to_vec_pretty(&dump)?;
    content.push(b'\n');

    let name = &context.database.name;
    Ok(RenderOutput {
      artifacts: vec![Artifact::new(format!("{name}/{name}_raw.json"), content)],
      failures: vec![],
    })
  }
}
