//! Runtime support for stubs generated by `dbsg`.
//!
//! Generated package structs build a [`RoutineCall`] describing the catalog
//! routine, its bound inputs and expected outputs, and hand it to an
//! [`Executor`] supplied by the application. This crate never talks to a
//! database itself.

pub use chrono;
pub use serde_json::Value;

use serde::{Serialize, de::DeserializeOwned};

/// Direction of a routine parameter as declared in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  In,
  Out,
  InOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
  Procedure,
  Function,
}

/// Generic parameter type understood by executors when binding out slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
  String,
  Number,
  Boolean,
  Datetime,
  Binary,
  Cursor,
  Object,
  Unknown,
  Custom(String),
}

/// An input that may be left to the routine's declared default.
///
/// Defaulted arguments are not sent to the database at all, so the routine
/// applies its own `DEFAULT` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<T> {
  Value(T),
  Defaulted,
}

impl<T> Default for Arg<T> {
  fn default() -> Self {
    Self::Defaulted
  }
}

impl<T> From<T> for Arg<T> {
  fn from(value: T) -> Self {
    Self::Value(value)
  }
}

impl<T> Arg<T> {
  pub fn is_defaulted(&self) -> bool {
    matches!(self, Self::Defaulted)
  }

  pub fn into_option(self) -> Option<T> {
    match self {
      Self::Value(value) => Some(value),
      Self::Defaulted => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct CallParameter {
  #[builder(into)]
  pub name: String,
  pub direction: Direction,
  pub sql_type: SqlType,
  pub value: Option<Value>,
}

/// Description of a single routine invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineCall {
  pub name: String,
  pub kind: RoutineKind,
  pub parameters: Vec<CallParameter>,
  pub returns: Option<SqlType>,
}

impl RoutineCall {
  pub fn procedure(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: RoutineKind::Procedure,
      parameters: Vec::new(),
      returns: None,
    }
  }

  pub fn function(name: impl Into<String>, returns: SqlType) -> Self {
    Self {
      name: name.into(),
      kind: RoutineKind::Function,
      parameters: Vec::new(),
      returns: Some(returns),
    }
  }

  /// Binds an `IN` or `IN OUT` value.
  pub fn bind<T: Serialize>(
    mut self,
    name: &str,
    direction: Direction,
    sql_type: SqlType,
    value: &T,
  ) -> Result<Self, CallError> {
    let value = serde_json::to_value(value).map_err(|source| CallError::Encode {
      name: name.to_string(),
      source,
    })?;
    self.parameters.push(
      CallParameter::builder()
        .name(name)
        .direction(direction)
        .sql_type(sql_type)
        .value(value)
        .build(),
    );
    Ok(self)
  }

  /// Binds a value unless it was left defaulted, in which case the parameter is omitted.
  pub fn bind_arg<T: Serialize>(
    self,
    name: &str,
    direction: Direction,
    sql_type: SqlType,
    arg: &Arg<T>,
  ) -> Result<Self, CallError> {
    match arg {
      Arg::Value(value) => self.bind(name, direction, sql_type, value),
      Arg::Defaulted => Ok(self),
    }
  }

  /// Registers an `OUT` slot to be filled by the executor.
  #[must_use]
  pub fn out(mut self, name: &str, sql_type: SqlType) -> Self {
    self.parameters.push(
      CallParameter::builder()
        .name(name)
        .direction(Direction::Out)
        .sql_type(sql_type)
        .build(),
    );
    self
  }

  pub fn has_outputs(&self) -> bool {
    self.parameters.iter().any(|p| p.direction != Direction::In)
  }
}

/// Values produced by an executed call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallResult {
  pub returned: Option<Value>,
  pub outputs: Vec<(String, Value)>,
}

impl CallResult {
  pub fn returned<T: DeserializeOwned>(&self) -> Result<T, CallError> {
    let value = self.returned.clone().ok_or(CallError::MissingReturn)?;
    serde_json::from_value(value).map_err(|source| CallError::Decode {
      name: "return".to_string(),
      source,
    })
  }

  pub fn output<T: DeserializeOwned>(&self, name: &str) -> Result<T, CallError> {
    let (_, value) = self
      .outputs
      .iter()
      .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
      .ok_or_else(|| CallError::MissingOutput(name.to_string()))?;
    serde_json::from_value(value.clone()).map_err(|source| CallError::Decode {
      name: name.to_string(),
      source,
    })
  }
}

#[derive(Debug, thiserror::Error)]
pub enum CallError {
  #[error("routine call failed: {0}")]
  Execution(String),
  #[error("routine returned no value")]
  MissingReturn,
  #[error("output parameter '{0}' was not returned")]
  MissingOutput(String),
  #[error("failed to encode parameter '{name}': {source}")]
  Encode {
    name: String,
    #[source]
    source: serde_json::Error,
  },
  #[error("failed to decode '{name}': {source}")]
  Decode {
    name: String,
    #[source]
    source: serde_json::Error,
  },
}

/// Executes routine calls against a live connection.
pub trait Executor {
  fn execute(&self, call: &RoutineCall) -> Result<CallResult, CallError>;
}

impl<E: Executor + ?Sized> Executor for &E {
  fn execute(&self, call: &RoutineCall) -> Result<CallResult, CallError> {
    (**self).execute(call)
  }
}
