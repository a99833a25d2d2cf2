use proc_macro2::TokenStream;
use quote::quote;

use crate::generator::types::GenericType;

/// How one generic type appears in a stub.
#[derive(Debug, Clone)]
pub(super) struct MappedType {
  /// The Rust type of the value.
  pub(super) rust: TokenStream,
  /// The `SqlType` expression describing it to the executor.
  pub(super) sql: TokenStream,
  /// Set when the type is a stand-in for something the stub cannot describe.
  pub(super) placeholder_reason: Option<&'static str>,
}

pub(super) fn map_type(support: &syn::Path, generic: &GenericType) -> MappedType {
  let json_value = quote! { #support::Value };
  let (rust, sql, placeholder_reason) = match generic {
    GenericType::String => (quote! { String }, quote! { SqlType::String }, None),
    GenericType::Number => (quote! { f64 }, quote! { SqlType::Number }, None),
    GenericType::Boolean => (quote! { bool }, quote! { SqlType::Boolean }, None),
    GenericType::Datetime => (
      quote! { #support::chrono::NaiveDateTime },
      quote! { SqlType::Datetime },
      None,
    ),
    GenericType::Binary => (quote! { Vec<u8> }, quote! { SqlType::Binary }, None),
    GenericType::CursorResultSet => (quote! { Vec<#json_value> }, quote! { SqlType::Cursor }, None),
    GenericType::Custom { name } => (json_value, quote! { SqlType::Custom(#name.to_string()) }, None),
    GenericType::Object => (
      json_value,
      quote! { SqlType::Object },
      Some("composite type without a type name, rendered as a JSON value"),
    ),
    GenericType::Unknown => (
      json_value,
      quote! { SqlType::Unknown },
      Some("unmapped type, rendered as a JSON value"),
    ),
  };

  MappedType {
    rust,
    sql,
    placeholder_reason,
  }
}
