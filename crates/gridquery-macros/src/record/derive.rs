//! Implementation of the `#[derive(Record)]` macro.
//!
//! This macro generates an implementation of the `Record` trait (the field
//! registry plus the value accessor) and field name constants.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    spanned::Spanned, Data, DeriveInput, Error, Fields, GenericArgument, PathArguments, Result,
    Type,
};

use super::attrs::{parse_grid_attrs, GridKind};

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Ensure we have a struct with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Record can only be derived for structs",
            ))
        }
    };

    let mut field_defs: Vec<TokenStream> = Vec::new();
    let mut field_matches: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut seen = HashSet::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let grid_attrs = parse_grid_attrs(&field.attrs)?;
        if grid_attrs.skip {
            continue;
        }

        let (inner, nullable) = unwrap_option(&field.ty);
        let kind = match grid_attrs.kind.or_else(|| type_name(inner).as_deref().and_then(GridKind::infer)) {
            Some(kind) => kind,
            None => {
                return Err(Error::new(
                    field.ty.span(),
                    format!(
                        "cannot infer grid kind for field `{}`; annotate it with #[grid(Kind)] or #[grid(skip)]",
                        field_name
                    ),
                ))
            }
        };

        let query_name = grid_attrs.rename.unwrap_or_else(|| field_name.to_string());
        if !seen.insert(query_name.clone()) {
            return Err(Error::new(
                field.span(),
                format!("duplicate grid field name '{}'", query_name),
            ));
        }

        let const_name = syn::parse_str::<syn::Ident>(&to_screaming_snake_case(&query_name))
            .map_err(|_| {
                Error::new(
                    field.span(),
                    format!("grid field name '{}' does not form a valid constant name", query_name),
                )
            })?;
        field_constants.push(quote! {
            /// Field name constant for type-safe requests.
            pub const #const_name: &'static str = #query_name;
        });

        let kind_tokens = kind_path(kind);
        field_defs.push(quote! {
            ::gridquery::FieldDef::new(#query_name, #kind_tokens, #nullable),
        });

        let value_expr = value_expr(kind);
        let arm = if nullable {
            quote! {
                match &self.#field_name {
                    ::core::option::Option::Some(value) => #value_expr,
                    ::core::option::Option::None => ::gridquery::Value::Null,
                }
            }
        } else {
            quote! {
                {
                    let value = &self.#field_name;
                    #value_expr
                }
            }
        };
        field_matches.push(quote! {
            #query_name => #arm,
        });
    }

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*
        }

        impl #impl_generics ::gridquery::Record for #struct_name #ty_generics #where_clause {
            fn fields() -> &'static [::gridquery::FieldDef] {
                const FIELDS: &[::gridquery::FieldDef] = &[
                    #(#field_defs)*
                ];
                FIELDS
            }

            fn field_value(&self, field: &str) -> ::gridquery::Value<'_> {
                match field {
                    #(#field_matches)*
                    _ => ::gridquery::Value::Null,
                }
            }
        }
    };

    Ok(expanded)
}

/// Builds the value expression for a binding `value: &Inner`.
fn value_expr(kind: GridKind) -> TokenStream {
    match kind {
        GridKind::String => quote! {
            ::gridquery::Value::String(::core::convert::AsRef::<str>::as_ref(value))
        },
        GridKind::Number => quote! {
            ::gridquery::Value::Number(::gridquery::Number::from(*value))
        },
        GridKind::Decimal => quote! { ::gridquery::Value::Decimal(*value) },
        GridKind::DateTime => quote! {
            ::gridquery::Value::DateTime(::gridquery::AsDateTime::as_date_time(value))
        },
        GridKind::Bool => quote! { ::gridquery::Value::Bool(*value) },
        GridKind::Guid => quote! { ::gridquery::Value::Guid(*value) },
    }
}

fn kind_path(kind: GridKind) -> TokenStream {
    match kind {
        GridKind::String => quote! { ::gridquery::FieldKind::String },
        GridKind::Number => quote! { ::gridquery::FieldKind::Number },
        GridKind::Decimal => quote! { ::gridquery::FieldKind::Decimal },
        GridKind::DateTime => quote! { ::gridquery::FieldKind::DateTime },
        GridKind::Bool => quote! { ::gridquery::FieldKind::Bool },
        GridKind::Guid => quote! { ::gridquery::FieldKind::Guid },
    }
}

/// Splits `Option<T>` into `(T, true)`; any other type is `(ty, false)`.
fn unwrap_option(ty: &Type) -> (&Type, bool) {
    if let Type::Path(path) = ty {
        if let Some(segment) = path.path.segments.last() {
            if segment.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return (inner, true);
                    }
                }
            }
        }
    }
    (ty, false)
}

/// The last path segment of a type, looking through references.
fn type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        Type::Reference(reference) => type_name(&reference.elem),
        Type::Paren(paren) => type_name(&paren.elem),
        _ => None,
    }
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' || c == ' ' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}
