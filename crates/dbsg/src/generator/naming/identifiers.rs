use std::{
  collections::{BTreeSet, HashSet},
  sync::LazyLock,
};

use any_ascii::any_ascii;
use inflections::Inflect;
use regex::Regex;

pub(crate) static FORBIDDEN_IDENTIFIERS: LazyLock<HashSet<&str>> = LazyLock::new(|| {
  [
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for", "if", "impl", "in",
    "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "async", "await", "dyn", "try", "abstract", "become", "box", "do",
    "final", "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "gen",
    // `self` gets the `self_` treatment rather than a raw prefix.
    "self", "Self",
  ]
  .into_iter()
  .collect()
});

/// Names that would shadow the stub module's own imports or std prelude items.
static RESERVED_PASCAL_CASE: LazyLock<HashSet<&str>> = LazyLock::new(|| {
  [
    "Arg",
    "CallError",
    "CallResult",
    "Direction",
    "Executor",
    "Option",
    "Result",
    "RoutineCall",
    "Self",
    "SqlType",
    "String",
    "Vec",
  ]
  .into_iter()
  .collect()
});

static INVALID_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").unwrap());
static MULTI_UNDERSCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

/// Transliterates to ASCII, replaces characters invalid in identifiers (`$`, `#`
/// in catalog names) with underscores, collapses runs of underscores and trims them.
pub(crate) fn sanitize(input: &str) -> String {
  if input.is_empty() {
    return String::new();
  }

  let ascii = any_ascii(input);
  let replaced = INVALID_CHARS_RE.replace_all(&ascii, "_");
  let collapsed = MULTI_UNDERSCORE_RE.replace_all(&replaced, "_");

  collapsed.trim_matches('_').to_string()
}

/// Returns `base_name`, or `base_name_2`, `base_name_3`, ... whichever is free first.
pub(crate) fn ensure_unique(base_name: &str, used_names: &BTreeSet<String>) -> String {
  if !used_names.contains(base_name) {
    return base_name.to_string();
  }
  let mut i = 2;
  loop {
    let new_name = format!("{base_name}_{i}");
    if !used_names.contains(&new_name) {
      return new_name;
    }
    i += 1;
  }
}

/// Converts a catalog name into a Rust field, argument or method name (`snake_case`).
///
/// Keywords get a raw identifier prefix. `self`, `crate` and `super` cannot be
/// raw identifiers and get a trailing `_` instead. A leading digit
/// is prefixed with `_`, and an empty result becomes `_`.
pub(crate) fn to_rust_field_name(name: &str) -> String {
  let mut ident = sanitize(name).to_lowercase().to_snake_case();

  if ident.is_empty() {
    return "_".to_string();
  }

  if matches!(ident.as_str(), "self" | "crate" | "super") {
    return format!("{ident}_");
  }

  if FORBIDDEN_IDENTIFIERS.contains(ident.as_str()) {
    return format!("r#{ident}");
  }

  if ident.starts_with(|c: char| c.is_ascii_digit()) {
    ident.insert(0, '_');
  }

  ident
}

/// Converts a module path segment (database, schema, package file stem).
///
/// Raw identifiers are not allowed as file names, so keywords get a trailing `_`.
pub(crate) fn to_rust_module_name(name: &str) -> String {
  let ident = to_rust_field_name(name);
  match ident.strip_prefix("r#") {
    Some(keyword) => format!("{keyword}_"),
    None => ident,
  }
}

/// Makes a display name produced by the casing engine usable as a Rust type name.
///
/// Keeps the casing as produced, drops characters Rust does not accept,
/// prefixes a leading digit with `T`, suffixes names reserved in stub modules
/// with `_`, and turns an empty result into `Unnamed`.
pub(crate) fn to_rust_type_name(display_name: &str) -> String {
  let mut ident: String = any_ascii(display_name)
    .chars()
    .filter(char::is_ascii_alphanumeric)
    .collect();

  if ident.is_empty() {
    return "Unnamed".to_string();
  }

  if ident.starts_with(|c: char| c.is_ascii_digit()) {
    ident.insert(0, 'T');
  }

  if RESERVED_PASCAL_CASE.contains(ident.as_str()) {
    ident.push('_');
  }

  ident
}
