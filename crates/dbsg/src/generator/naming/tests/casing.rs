use crate::generator::naming::{AbbreviationTable, CasingEngine, casing::AbbreviationRule};

fn engine(declarations: &[&str]) -> CasingEngine {
  CasingEngine::new(declarations.iter().collect())
}

#[test]
fn test_bare_abbreviations_are_uppercased() {
  assert_eq!(engine(&["http"]).to_identifier("http_utils_pkg").unwrap(), "HTTPUtilsPkg");
  assert_eq!(
    engine(&["sql", "api"]).to_identifier("sql_generic_api").unwrap(),
    "SQLGenericAPI"
  );
}

#[test]
fn test_abbreviations_match_whole_tokens_only() {
  let engine = engine(&["eset"]);
  assert_eq!(engine.to_identifier("eset_pkg").unwrap(), "ESETPkg");
  assert_eq!(engine.to_identifier("preset_pkg").unwrap(), "PresetPkg");
  assert_eq!(engine.to_identifier("pkg_esets").unwrap(), "PkgEsets");
}

#[test]
fn test_mapped_abbreviation_is_emitted_verbatim() {
  assert_eq!(engine(&["wifi=WiFi"]).to_identifier("wifi_helpers").unwrap(), "WiFiHelpers");
  assert_eq!(engine(&["wifi=WiFi"]).to_identifier("WIFI_HELPERS").unwrap(), "WiFiHelpers");
}

#[test]
fn test_input_is_case_insensitive() {
  let engine = engine(&["http"]);
  assert_eq!(engine.to_identifier("HTTP_UTILS_PKG").unwrap(), "HTTPUtilsPkg");
  assert_eq!(engine.to_identifier("Http_Utils_Pkg").unwrap(), "HTTPUtilsPkg");
  assert_eq!(engine.to_identifier("BILL_UTILS_PKG").unwrap(), "BillUtilsPkg");
}

#[test]
fn test_stray_underscores_are_dropped() {
  let engine = CasingEngine::default();
  assert_eq!(engine.to_identifier("_get__rate_").unwrap(), "GetRate");
  assert_eq!(engine.to_identifier("payroll").unwrap(), "Payroll");
}

#[test]
fn test_empty_identifier_fails() {
  let engine = CasingEngine::default();
  assert_eq!(engine.to_identifier("").unwrap_err().identifier, "");
  assert_eq!(engine.to_identifier("___").unwrap_err().identifier, "___");
}

#[test]
fn test_keywords_are_not_escaped() {
  assert_eq!(CasingEngine::default().to_identifier("type").unwrap(), "Type");
  assert_eq!(CasingEngine::default().to_identifier("self").unwrap(), "Self");
}

#[test]
fn test_redeclared_token_replaces_rule_in_place() {
  let mut table = AbbreviationTable::new();
  table.insert("wifi", None);
  table.insert("api", None);
  table.insert_declaration("WIFI = WiFi");

  assert_eq!(table.len(), 2);
  let tokens: Vec<_> = table.iter().map(|(token, _)| token).collect();
  assert_eq!(tokens, vec!["wifi", "api"]);
  assert_eq!(table.lookup("WiFi"), Some(&AbbreviationRule::Literal("WiFi".to_string())));
}

#[test]
fn test_blank_declarations_are_ignored() {
  let table: AbbreviationTable = ["", "  ", "=Foo"].into_iter().collect();
  assert!(table.is_empty());
}
