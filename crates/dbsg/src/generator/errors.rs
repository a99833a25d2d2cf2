use std::fmt::Display;

/// Errors that abort a generation run before any plugin is invoked.
///
/// Every variant names the entity it concerns: a qualified catalog name
/// (`schema.package.routine[.argument]`), an appendix record or a filter entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
  #[error("configuration error at {entity}: {message}")]
  Configuration { entity: String, message: String },
  #[error("schema integrity error at {entity}: {message}")]
  SchemaIntegrity { entity: String, message: String },
  #[error("naming error at {entity}: identifier '{identifier}' is empty after casing")]
  Naming { entity: String, identifier: String },
}

impl GenerationError {
  pub fn configuration(entity: impl Display, message: impl Into<String>) -> Self {
    Self::Configuration {
      entity: entity.to_string(),
      message: message.into(),
    }
  }

  pub fn schema_integrity(entity: impl Display, message: impl Into<String>) -> Self {
    Self::SchemaIntegrity {
      entity: entity.to_string(),
      message: message.into(),
    }
  }

  pub fn entity(&self) -> &str {
    match self {
      Self::Configuration { entity, .. } | Self::SchemaIntegrity { entity, .. } | Self::Naming { entity, .. } => {
        entity
      }
    }
  }
}
