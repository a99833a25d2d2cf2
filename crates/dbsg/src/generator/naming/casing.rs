//! Abbreviation-aware conversion of `snake_case` catalog identifiers into
//! `PascalCase` display names.

use indexmap::IndexMap;

/// How a matched abbreviation token is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbbreviationRule {
  /// Emit the token fully uppercased.
  Upper,
  /// Emit this literal exactly as declared.
  Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identifier '{identifier}' has no name tokens")]
pub struct NamingError {
  pub identifier: String,
}

/// Ordered set of abbreviation rules keyed by lowercased token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbbreviationTable {
  rules: IndexMap<String, AbbreviationRule>,
}

impl AbbreviationTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a rule. Redeclaring a token replaces its rule and keeps its original slot.
  pub fn insert(&mut self, token: &str, literal: Option<&str>) {
    let token = token.trim().to_ascii_lowercase();
    if token.is_empty() {
      return;
    }
    let rule = match literal.map(str::trim).filter(|literal| !literal.is_empty()) {
      Some(literal) => AbbreviationRule::Literal(literal.to_string()),
      None => AbbreviationRule::Upper,
    };
    self.rules.insert(token, rule);
  }

  /// Parses a single `token` or `token=Literal` declaration.
  pub fn insert_declaration(&mut self, declaration: &str) {
    match declaration.split_once('=') {
      Some((token, literal)) => self.insert(token, Some(literal)),
      None => self.insert(declaration, None),
    }
  }

  pub fn lookup(&self, token: &str) -> Option<&AbbreviationRule> {
    self.rules.get(&token.to_ascii_lowercase())
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  #[cfg(test)]
  pub fn iter(&self) -> impl Iterator<Item = (&str, &AbbreviationRule)> {
    self.rules.iter().map(|(token, rule)| (token.as_str(), rule))
  }
}

impl<S: AsRef<str>> FromIterator<S> for AbbreviationTable {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    let mut table = Self::new();
    for declaration in iter {
      table.insert_declaration(declaration.as_ref());
    }
    table
  }
}

/// Converts catalog identifiers to display names.
///
/// Output is not escaped against any target language keywords; plugins do that
/// on top of the raw result.
#[derive(Debug, Clone, Default)]
pub struct CasingEngine {
  abbreviations: AbbreviationTable,
}

impl CasingEngine {
  pub fn new(abbreviations: AbbreviationTable) -> Self {
    Self { abbreviations }
  }

  /// `http_utils_pkg` with `{http}` becomes `HTTPUtilsPkg`.
  ///
  /// Tokens are matched whole; `preset` never matches an `eset` rule.
  pub fn to_identifier(&self, name: &str) -> Result<String, NamingError> {
    let mut ident = String::with_capacity(name.len());
    let mut tokens = 0usize;

    for token in name.split('_').filter(|token| !token.is_empty()) {
      tokens += 1;
      match self.abbreviations.lookup(token) {
        Some(AbbreviationRule::Upper) => ident.push_str(&token.to_uppercase()),
        Some(AbbreviationRule::Literal(literal)) => ident.push_str(literal),
        None => push_capitalized(&mut ident, token),
      }
    }

    if tokens == 0 {
      return Err(NamingError {
        identifier: name.to_string(),
      });
    }

    Ok(ident)
  }
}

fn push_capitalized(out: &mut String, token: &str) {
  let mut chars = token.chars();
  if let Some(first) = chars.next() {
    out.extend(first.to_uppercase());
    out.extend(chars.flat_map(char::to_lowercase));
  }
}
