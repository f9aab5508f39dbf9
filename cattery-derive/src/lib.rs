//! Procedural macros for cattery
//!
//! This crate provides the `Entity` derive used by the domain structs.

mod attributes;
mod macros;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `Entity` - generates entity metadata and record mapping
///
/// This macro generates:
/// - `EntityTrait` implementation (metadata, identity, validation, record mapping)
/// - `FromResult` implementation so the entity can be the result type of a criteria query
///
/// # Example
///
/// ```ignore
/// use cattery::Entity;
///
/// #[derive(Debug, Clone, PartialEq, Entity)]
/// #[table_name = "cat"]
/// pub struct Cat {
///     #[primary_key]
///     pub id: Option<i64>,
///     #[not_empty]
///     pub name: String,
///     pub age: u32,
///     #[one_to_many]
///     pub kittens: Vec<Cat>,
/// }
/// ```
#[proc_macro_derive(
    Entity,
    attributes(table_name, primary_key, column_name, not_empty, one_to_many)
)]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    macros::derive_entity(input)
}
