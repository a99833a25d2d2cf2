use std::fmt::{Display, Formatter};

/// `schema.package.routine.argument` with absent parts skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
  pub schema: String,
  pub package: Option<String>,
  pub routine: Option<String>,
  pub argument: Option<String>,
}

impl QualifiedName {
  pub fn schema(schema: impl Into<String>) -> Self {
    Self {
      schema: schema.into(),
      ..Self::default()
    }
  }

  #[must_use]
  pub fn with_package(mut self, package: Option<&str>) -> Self {
    self.package = package.map(str::to_string);
    self
  }

  #[must_use]
  pub fn with_routine(mut self, routine: &str) -> Self {
    self.routine = Some(routine.to_string());
    self
  }

  #[must_use]
  pub fn with_argument(mut self, argument: &str) -> Self {
    self.argument = Some(argument.to_string());
    self
  }

  fn parts(&self) -> impl Iterator<Item = &str> {
    std::iter::once(self.schema.as_str())
      .chain(self.package.as_deref())
      .chain(self.routine.as_deref())
      .chain(self.argument.as_deref())
      .filter(|part| !part.is_empty())
  }

  /// Upper-case catalog call name, without the argument part.
  pub fn call_name(&self) -> String {
    std::iter::once(self.schema.as_str())
      .chain(self.package.as_deref())
      .chain(self.routine.as_deref())
      .filter(|part| !part.is_empty())
      .map(str::to_uppercase)
      .collect::<Vec<_>>()
      .join(".")
  }
}

impl Display for QualifiedName {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for (i, part) in self.parts().enumerate() {
      if i > 0 {
        f.write_str(".")?;
      }
      f.write_str(part)?;
    }
    Ok(())
  }
}
