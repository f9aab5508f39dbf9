//! Attribute parsing utilities

use syn::{Attribute, ExprLit, Field, Lit};

/// Extract a `#[name = "value"]` string from a list of attributes
fn extract_name_value(attrs: &[Attribute], name: &str) -> Option<String> {
    for attr in attrs {
        if attr.path().is_ident(name) {
            if let Ok(meta) = attr.meta.require_name_value() {
                if let syn::Expr::Lit(ExprLit {
                    lit: Lit::Str(s),
                    ..
                }) = &meta.value
                {
                    return Some(s.value());
                }
            }
        }
    }
    None
}

/// Extract table name from struct attributes
pub fn extract_table_name(attrs: &[Attribute]) -> Option<String> {
    extract_name_value(attrs, "table_name")
}

/// Check if field has a specific attribute
pub fn has_attribute(field: &Field, attr_name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(attr_name))
}

/// Attributes recognised on an entity field
#[derive(Debug, Default)]
pub struct FieldAttributes {
    pub is_primary_key: bool,
    pub column_name: Option<String>,
    pub not_empty: bool,
    pub one_to_many: bool,
}

/// Parse all field attributes understood by the `Entity` derive
pub fn parse_field_attributes(field: &Field) -> FieldAttributes {
    FieldAttributes {
        is_primary_key: has_attribute(field, "primary_key"),
        column_name: extract_name_value(&field.attrs, "column_name"),
        not_empty: has_attribute(field, "not_empty"),
        one_to_many: has_attribute(field, "one_to_many"),
    }
}
