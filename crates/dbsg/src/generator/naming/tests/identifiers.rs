use std::collections::BTreeSet;

use crate::generator::naming::identifiers::{
  ensure_unique, sanitize, to_rust_field_name, to_rust_module_name, to_rust_type_name,
};

#[test]
fn test_field_names() {
  assert_eq!(to_rust_field_name("OUT_PAYROLL_ID"), "out_payroll_id");
  assert_eq!(to_rust_field_name("match"), "r#match");
  assert_eq!(to_rust_field_name("type"), "r#type");
  assert_eq!(to_rust_field_name("self"), "self_");
  assert_eq!(to_rust_field_name("SUPER"), "super_");
  assert_eq!(to_rust_field_name("crate"), "crate_");
  assert_eq!(to_rust_field_name("Self"), "self_");
  assert_eq!(to_rust_field_name("123name"), "_123name");
  assert_eq!(to_rust_field_name(""), "_");
  assert_eq!(to_rust_field_name("  "), "_");
}

#[test]
fn test_catalog_special_characters_are_sanitized() {
  assert_eq!(sanitize("p$amount#"), "p_amount");
  assert_eq!(to_rust_field_name("P$AMOUNT"), "p_amount");
}

#[test]
fn test_module_names_avoid_raw_identifiers() {
  assert_eq!(to_rust_module_name("BILLS"), "bills");
  assert_eq!(to_rust_module_name("type"), "type_");
  assert_eq!(to_rust_module_name("self"), "self_");
  assert_eq!(to_rust_module_name("super"), "super_");
}

#[test]
fn test_type_names() {
  assert_eq!(to_rust_type_name("HTTPUtilsPkg"), "HTTPUtilsPkg");
  assert_eq!(to_rust_type_name("Pkg$Utils"), "PkgUtils");
  assert_eq!(to_rust_type_name("2faPkg"), "T2faPkg");
  assert_eq!(to_rust_type_name("Executor"), "Executor_");
  assert_eq!(to_rust_type_name("$"), "Unnamed");
}

#[test]
fn test_ensure_unique_suffixes() {
  let mut used = BTreeSet::new();
  for _ in 0..3 {
    let name = ensure_unique("charge", &used);
    used.insert(name);
  }
  assert_eq!(
    used.into_iter().collect::<Vec<_>>(),
    vec!["charge".to_string(), "charge_2".to_string(), "charge_3".to_string()]
  );
}
