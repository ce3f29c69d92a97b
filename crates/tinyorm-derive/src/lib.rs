//! Derive macros for tinyorm
//!
//! Provides `#[derive(Model)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod model;

/// Derive the `Model` field-descriptor table for a struct.
///
/// # Example
///
/// ```ignore
/// use tinyorm::Model;
///
/// #[derive(Debug, Default, Model)]
/// pub struct User {
///     #[orm(constraint = "PRIMARY KEY")]
///     pub name: String,
///     pub age: i32,
///     #[orm(skip)]
///     pub cached_rank: u32,
///     internal: bool,
/// }
/// ```
///
/// Only `pub` fields become columns, in declaration order. The table is named after
/// the struct and each column after its field (raw identifiers lose the `r#`).
///
/// # Attributes
///
/// - `#[orm(table = "name")]` on the struct - Override the table name
/// - `#[orm(constraint = "...")]` - Column constraint text, e.g. `PRIMARY KEY` or `NOT NULL`
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(skip)]` - Do not persist this field
///
/// Every field type must implement `tinyorm::SqlField`.
#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
