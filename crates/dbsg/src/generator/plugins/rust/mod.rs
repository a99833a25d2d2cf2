//! Typed call stubs for Rust callers, one file per package, built on the
//! `dbsg-support` runtime crate.

mod types;

use std::collections::BTreeSet;

use proc_macro2::{Ident, TokenStream};
use quote::quote;
use serde::Deserialize;

use super::{Artifact, Plugin, PluginError, PluginRenderError, RenderContext, RenderOutput};
use crate::generator::{
  ir::{Argument, Direction, Package, Routine},
  naming::identifiers::{ensure_unique, to_rust_field_name, to_rust_module_name, to_rust_type_name},
};

pub const NAME: &str = "rust";

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RustOptions {
  /// Path of the runtime crate as the generated code sees it.
  support_crate: String,
}

impl Default for RustOptions {
  fn default() -> Self {
    Self {
      support_crate: "dbsg_support".to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RustPlugin;

impl Plugin for RustPlugin {
  fn name(&self) -> &'static str {
    NAME
  }

  fn render(&self, context: &RenderContext<'_>) -> Result<RenderOutput, PluginError> {
    let options: RustOptions = context.options()?;
    let support: syn::Path = syn::parse_str(&options.support_crate)?;
    let database = context.database;
    let database_dir = to_rust_module_name(&database.name);

    let mut output = RenderOutput::default();
    let mut schema_modules = Vec::with_capacity(database.schemes.len());

    for schema in &database.schemes {
      let schema_module = unique_module(&schema.name, &schema_modules);
      let mut package_modules = Vec::with_capacity(schema.packages.len());

      for package in &schema.packages {
        let module = unique_module(&package.name, &package_modules);
        let entity = format!("{}.{}", schema.name, package.name);
        if let Err(message) = parse_ident(&module) {
          output.push_failure(entity, format!("package skipped: {message}"));
          continue;
        }

        let code = render_package(&support, package, &entity, &mut output.failures)?;
        output
          .artifacts
          .push(Artifact::new(format!("{database_dir}/{schema_module}/{module}.rs"), code));
        package_modules.push(module);
      }

      output.artifacts.push(Artifact::new(
        format!("{database_dir}/{schema_module}/mod.rs"),
        render_mod_file(&format!("{}.{}", database.name, schema.name), &package_modules)?,
      ));
      schema_modules.push(schema_module);
    }

    output.artifacts.push(Artifact::new(
      format!("{database_dir}/mod.rs"),
      render_mod_file(&database.name, &schema_modules)?,
    ));

    Ok(output)
  }
}

fn unique_module(name: &str, taken: &[String]) -> String {
  let taken: BTreeSet<String> = taken.iter().cloned().collect();
  ensure_unique(&to_rust_module_name(name), &taken)
}

/// Accepts plain and raw identifiers, rejects keywords and `_`.
fn parse_ident(name: &str) -> Result<Ident, String> {
  syn::parse_str::<Ident>(name).map_err(|error| format!("'{name}' is not a valid Rust identifier ({error})"))
}

fn header(subject: &str) -> String {
  format!(
    "//! AUTO-GENERATED CODE - DO NOT EDIT!\n//!\n//! Stored routine stubs for `{subject}`.\n//! Generated by `dbsg` {}\n",
    env!("CARGO_PKG_VERSION")
  )
}

fn format_file(subject: &str, tokens: TokenStream) -> Result<String, PluginError> {
  let file: syn::File = syn::parse2(tokens)?;
  Ok(format!("{}\n{}", header(subject), prettyplease::unparse(&file)))
}

fn render_mod_file(subject: &str, modules: &[String]) -> Result<String, PluginError> {
  let modules = modules
    .iter()
    .map(|module| parse_ident(module))
    .collect::<Result<Vec<_>, _>>()
    .map_err(|message| PluginError::Render {
      entity: subject.to_string(),
      message,
    })?;
  format_file(subject, quote! { #(pub mod #modules;)* })
}

/// Renders one package file. Routines that cannot be rendered are listed in a
/// trailing comment instead of failing the package.
fn render_package(
  support: &syn::Path,
  package: &Package,
  entity: &str,
  failures: &mut Vec<PluginRenderError>,
) -> Result<String, PluginError> {
  let type_ident = parse_ident(&to_rust_type_name(&package.display_name)).map_err(|message| PluginError::Render {
    entity: entity.to_string(),
    message,
  })?;

  let mut method_names = BTreeSet::from(["new".to_string()]);
  let mut methods = Vec::new();
  let mut skipped = Vec::new();

  for set in &package.overloads {
    let base_name = to_rust_field_name(&set.name);
    for routine in &set.routines {
      let method_name = ensure_unique(&base_name, &method_names);
      method_names.insert(method_name.clone());
      match render_routine(support, routine, &method_name, failures) {
        Ok(method) => methods.push(method),
        Err(message) => {
          failures.push(PluginRenderError {
            entity: routine.call_name.to_lowercase(),
            message: format!("routine skipped: {message}"),
          });
          skipped.push(format!("// {}: {message}", routine.call_name));
        }
      }
    }
  }

  let struct_doc = format!(
    " Calls into `{}`.",
    if package.is_package {
      entity.to_uppercase()
    } else {
      format!("{} (standalone routines)", entity.to_uppercase())
    }
  );

  let tokens = quote! {
    #![allow(unused_imports, clippy::too_many_arguments)]

    use #support::{Arg, CallError, CallResult, Direction, Executor, RoutineCall, SqlType};

    #[doc = #struct_doc]
    pub struct #type_ident<E> {
      executor: E,
    }

    impl<E: Executor> #type_ident<E> {
      pub fn new(executor: E) -> Self {
        Self { executor }
      }

      #(#methods)*
    }
  };

  let mut code = format_file(entity, tokens)?;
  if !skipped.is_empty() {
    code.push_str("\n// Routines that could not be rendered:\n");
    for line in skipped {
      code.push_str(&line);
      code.push('\n');
    }
  }
  Ok(code)
}

struct Parameter<'a> {
  argument: &'a Argument,
  ident: Option<Ident>,
  mapped: types::MappedType,
}

fn render_routine(
  support: &syn::Path,
  routine: &Routine,
  method_name: &str,
  failures: &mut Vec<PluginRenderError>,
) -> Result<TokenStream, String> {
  let method = parse_ident(method_name)?;
  let call_name = routine.call_name.as_str();
  let entity = routine.call_name.to_lowercase();

  let mut argument_names = BTreeSet::new();
  let mut parameters = Vec::new();
  for argument in routine.parameters() {
    let mapped = types::map_type(support, &argument.generic_type);
    if let Some(reason) = mapped.placeholder_reason {
      failures.push(PluginRenderError {
        entity: format!("{entity}.{}", argument.name),
        message: reason.to_string(),
      });
    }
    let ident = if argument.direction.is_input() {
      let name = ensure_unique(&to_rust_field_name(&argument.name), &argument_names);
      argument_names.insert(name.clone());
      Some(parse_ident(&name)?)
    } else {
      None
    };
    parameters.push(Parameter {
      argument,
      ident,
      mapped,
    });
  }

  // Binds follow catalog order; the signature puts defaulted inputs last.
  let binds = parameters.iter().map(|parameter| {
    let db_name = parameter.argument.name.to_uppercase();
    let sql = &parameter.mapped.sql;
    let direction = match parameter.argument.direction {
      Direction::In => quote! { Direction::In },
      Direction::InOut | Direction::Out => quote! { Direction::InOut },
    };
    match &parameter.ident {
      None => quote! { .out(#db_name, #sql) },
      Some(ident) if parameter.argument.has_default => quote! { .bind_arg(#db_name, #direction, #sql, &#ident)? },
      Some(ident) => quote! { .bind(#db_name, #direction, #sql, &#ident)? },
    }
  });

  let signature = routine.sorted_parameters().into_iter().filter_map(|argument| {
    let parameter = parameters
      .iter()
      .find(|parameter| std::ptr::eq(parameter.argument, argument))?;
    let ident = parameter.ident.as_ref()?;
    let mut ty = parameter.mapped.rust.clone();
    if parameter.argument.nullable {
      ty = quote! { Option<#ty> };
    }
    if parameter.argument.has_default {
      ty = quote! { Arg<#ty> };
    }
    Some(quote! { #ident: #ty })
  });

  let (returns, body) = match routine.return_argument() {
    Some(result) if !routine.has_outputs() => {
      let mapped = types::map_type(support, &result.generic_type);
      if let Some(reason) = mapped.placeholder_reason {
        failures.push(PluginRenderError {
          entity: format!("{entity}.{}", result.name),
          message: reason.to_string(),
        });
      }
      let rust = &mapped.rust;
      let sql = &mapped.sql;
      let ty = if result.nullable {
        quote! { Option<#rust> }
      } else {
        quote! { #rust }
      };
      (
        quote! { Result<#ty, CallError> },
        quote! { self.executor.execute(&RoutineCall::function(#call_name, #sql) #(#binds)*)?.returned() },
      )
    }
    Some(result) => {
      let sql = types::map_type(support, &result.generic_type).sql;
      (
        quote! { Result<CallResult, CallError> },
        quote! { self.executor.execute(&RoutineCall::function(#call_name, #sql) #(#binds)*) },
      )
    }
    None if routine.has_outputs() => (
      quote! { Result<CallResult, CallError> },
      quote! { self.executor.execute(&RoutineCall::procedure(#call_name) #(#binds)*) },
    ),
    None => (
      quote! { Result<(), CallError> },
      quote! { self.executor.execute(&RoutineCall::procedure(#call_name) #(#binds)*).map(|_| ()) },
    ),
  };

  let doc = if routine.has_inputs() {
    format!(" `{call_name}` ({})", routine.kind)
  } else {
    format!(" `{call_name}` ({}, no inputs)", routine.kind)
  };
  Ok(quote! {
    #[doc = #doc]
    pub fn #method(&self, #(#signature),*) -> #returns {
      #body
    }
  })
}
