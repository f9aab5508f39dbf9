//! Derive macro for `Entity`
//!
//! Generates `EntityTrait` (static metadata, identity access, validation and the
//! struct <-> `Record` mapping) and `FromResult` for a struct with named fields.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, GenericArgument, PathArguments, Type};

use crate::attributes;
use crate::utils;

/// Scalar kind of a basic attribute, mirrored by `cattery::value::ValueKind`
enum BasicKind {
    Bool,
    Integer,
    Float,
    Text,
}

impl BasicKind {
    fn tokens(&self) -> TokenStream2 {
        match self {
            BasicKind::Bool => quote! { ::cattery::value::ValueKind::Bool },
            BasicKind::Integer => quote! { ::cattery::value::ValueKind::Integer },
            BasicKind::Float => quote! { ::cattery::value::ValueKind::Float },
            BasicKind::Text => quote! { ::cattery::value::ValueKind::Text },
        }
    }
}

/// Return the last path segment of a type, if it is a plain path type
fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path.path.segments.last(),
        _ => None,
    }
}

/// Return the single generic argument of `Wrapper<T>` when the wrapper name matches
fn generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let segment = last_segment(ty)?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

/// Classify a basic attribute type, unwrapping `Option<T>` into a nullable attribute
fn classify_basic(ty: &Type) -> Option<(BasicKind, bool)> {
    if let Some(inner) = generic_argument(ty, "Option") {
        return classify_basic(inner).map(|(kind, _)| (kind, true));
    }
    let segment = last_segment(ty)?;
    if !segment.arguments.is_empty() {
        return None;
    }
    let kind = match segment.ident.to_string().as_str() {
        "bool" => BasicKind::Bool,
        "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => {
            BasicKind::Integer
        }
        "f32" | "f64" => BasicKind::Float,
        "String" => BasicKind::Text,
        _ => return None,
    };
    Some((kind, false))
}

/// Generate `EntityTrait` and `FromResult` implementations for an entity struct
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(syn::DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Entity can only be derived for structs with named fields",
            ));
        }
    };

    let entity_name = struct_name.to_string();
    let table_name = attributes::extract_table_name(&input.attrs)
        .unwrap_or_else(|| utils::snake_case(&entity_name));
    let alias = utils::lower_camel_case(&entity_name);

    let mut primary_key: Option<&syn::Ident> = None;
    let mut attribute_defs: Vec<TokenStream2> = Vec::new();
    let mut validations: Vec<TokenStream2> = Vec::new();
    let mut to_record: Vec<TokenStream2> = Vec::new();
    let mut from_record: Vec<TokenStream2> = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = attributes::parse_field_attributes(field);
        let name = ident.to_string();
        let column = attrs
            .column_name
            .clone()
            .unwrap_or_else(|| utils::snake_case(&name));
        let ty = &field.ty;

        if attrs.is_primary_key {
            if primary_key.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "Entity supports exactly one #[primary_key] field",
                ));
            }
            if generic_argument(ty, "Option").is_none() {
                return Err(syn::Error::new_spanned(
                    ty,
                    "#[primary_key] fields must be Option<i64>; the store assigns the identifier",
                ));
            }
            primary_key = Some(ident);
            attribute_defs.push(quote! {
                ::cattery::entity::AttributeDef {
                    name: #name,
                    column: #column,
                    kind: ::cattery::entity::AttributeKind::PrimaryKey,
                    nullable: false,
                }
            });
            from_record.push(quote! {
                #ident: ::core::option::Option::Some(record.id()),
            });
            continue;
        }

        if attrs.one_to_many {
            let Some(target) = generic_argument(ty, "Vec") else {
                return Err(syn::Error::new_spanned(
                    ty,
                    "#[one_to_many] fields must be Vec<Entity>",
                ));
            };
            attribute_defs.push(quote! {
                ::cattery::entity::AttributeDef {
                    name: #name,
                    column: #column,
                    kind: ::cattery::entity::AttributeKind::OneToMany {
                        target: <#target as ::cattery::EntityTrait>::meta,
                    },
                    nullable: false,
                }
            });
            if attrs.not_empty {
                validations.push(not_empty_check(ident, &entity_name, &name));
            }
            to_record.push(quote! {
                record.set_relation(
                    #name,
                    ::cattery::entity::collect_ids(&self.#ident, #entity_name, #name)?,
                );
            });
            from_record.push(quote! {
                #ident: hydrator.load_all::<#target>(record.relation(#name))?,
            });
            continue;
        }

        let Some((kind, nullable)) = classify_basic(ty) else {
            return Err(syn::Error::new_spanned(
                ty,
                "unsupported attribute type; use bool, integers, floats, String, Option<T> of those, \
                 or mark a Vec<Entity> field with #[one_to_many]",
            ));
        };
        let kind = kind.tokens();
        attribute_defs.push(quote! {
            ::cattery::entity::AttributeDef {
                name: #name,
                column: #column,
                kind: ::cattery::entity::AttributeKind::Basic(#kind),
                nullable: #nullable,
            }
        });
        if attrs.not_empty {
            validations.push(not_empty_check(ident, &entity_name, &name));
        }
        to_record.push(quote! {
            record.set_value(
                #name,
                ::cattery::value::ValueType::into_value(::core::clone::Clone::clone(&self.#ident)),
            );
        });
        from_record.push(quote! {
            #ident: ::cattery::value::TryGetable::try_get(
                record
                    .get_value(#name)
                    .unwrap_or_else(<#ty as ::cattery::value::ValueType>::null_value),
            )?,
        });
    }

    let Some(primary_key) = primary_key else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Entity requires a #[primary_key] field of type Option<i64>",
        ));
    };

    let expanded = quote! {
        impl ::cattery::EntityTrait for #struct_name {
            fn meta() -> &'static ::cattery::entity::EntityMeta {
                static META: ::cattery::entity::EntityMeta = ::cattery::entity::EntityMeta {
                    name: #entity_name,
                    table: #table_name,
                    alias: #alias,
                    attributes: &[#(#attribute_defs),*],
                };
                &META
            }

            fn id(&self) -> ::core::option::Option<i64> {
                self.#primary_key
            }

            fn set_id(&mut self, id: i64) {
                self.#primary_key = ::core::option::Option::Some(id);
            }

            fn validate(&self) -> ::core::result::Result<(), ::cattery::CatteryError> {
                #(#validations)*
                ::core::result::Result::Ok(())
            }

            fn to_record(
                &self,
            ) -> ::core::result::Result<::cattery::entity::Record, ::cattery::CatteryError> {
                let id = self.#primary_key.ok_or_else(|| {
                    ::cattery::CatteryError::TransientEntity(::std::format!(
                        "{} has not been assigned an identifier",
                        #entity_name
                    ))
                })?;
                let mut record = ::cattery::entity::Record::new(id);
                #(#to_record)*
                ::core::result::Result::Ok(record)
            }

            #[allow(unused_variables)]
            fn from_record(
                record: &::cattery::entity::Record,
                hydrator: &mut ::cattery::store::Hydrator<'_>,
            ) -> ::core::result::Result<Self, ::cattery::CatteryError> {
                ::core::result::Result::Ok(Self {
                    #(#from_record)*
                })
            }
        }

        impl ::cattery::criteria::FromResult for #struct_name {
            fn query_root() -> ::core::option::Option<&'static ::cattery::entity::EntityMeta> {
                ::core::option::Option::Some(<Self as ::cattery::EntityTrait>::meta())
            }

            fn from_result(
                value: ::cattery::criteria::ResultValue,
                hydrator: &mut ::cattery::store::Hydrator<'_>,
            ) -> ::core::result::Result<Self, ::cattery::CatteryError> {
                hydrator.load_result::<Self>(value)
            }
        }
    };

    Ok(expanded)
}

fn not_empty_check(ident: &syn::Ident, entity_name: &str, name: &str) -> TokenStream2 {
    quote! {
        if self.#ident.is_empty() {
            return ::core::result::Result::Err(::cattery::CatteryError::Validation(::std::format!(
                "{}.{} must not be empty",
                #entity_name,
                #name
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_classify_basic_types() {
        let ty: Type = parse_quote!(u32);
        assert!(matches!(classify_basic(&ty), Some((BasicKind::Integer, false))));

        let ty: Type = parse_quote!(Option<String>);
        assert!(matches!(classify_basic(&ty), Some((BasicKind::Text, true))));

        let ty: Type = parse_quote!(Vec<Cat>);
        assert!(classify_basic(&ty).is_none());
    }

    #[test]
    fn test_generic_argument() {
        let ty: Type = parse_quote!(Vec<Cat>);
        let inner = generic_argument(&ty, "Vec").expect("Vec<Cat> has an argument");
        assert_eq!(quote!(#inner).to_string(), "Cat");
        assert!(generic_argument(&ty, "Option").is_none());
    }

    #[test]
    fn test_missing_primary_key_is_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Cat {
                name: String,
            }
        };
        let err = expand(&input).expect_err("no primary key");
        assert!(err.to_string().contains("#[primary_key]"));
    }

    #[test]
    fn test_unsupported_field_type_is_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Cat {
                #[primary_key]
                id: Option<i64>,
                kittens: Vec<Cat>,
            }
        };
        let err = expand(&input).expect_err("Vec without #[one_to_many]");
        assert!(err.to_string().contains("unsupported attribute type"));
    }
}
