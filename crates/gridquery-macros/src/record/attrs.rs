//! Attribute parsing for the Record derive macro.
//!
//! This module provides parsers for the `#[grid(...)]` field attributes
//! used by the `Record` derive macro.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Ident, Lit, Meta, Result, Token,
};

/// The kind of a grid field, mirroring `gridquery::FieldKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKind {
    /// `#[grid(String)]`
    String,
    /// `#[grid(Number)]`: any primitive integer or float.
    Number,
    /// `#[grid(Decimal)]`: `rust_decimal::Decimal`.
    Decimal,
    /// `#[grid(DateTime)]`: any type implementing `AsDateTime`.
    DateTime,
    /// `#[grid(Bool)]`
    Bool,
    /// `#[grid(Guid)]`: `uuid::Uuid`.
    Guid,
}

const EXPECTED_KINDS: &str = "String, Number, Decimal, DateTime, Bool, Guid";

impl GridKind {
    /// Parse a kind from its name, accepting the capitalized and lowercase
    /// spellings.
    pub fn from_name(name: &str, span: Span) -> Result<Self> {
        match name {
            "String" | "string" => Ok(GridKind::String),
            "Number" | "number" => Ok(GridKind::Number),
            "Decimal" | "decimal" => Ok(GridKind::Decimal),
            "DateTime" | "datetime" | "date" => Ok(GridKind::DateTime),
            "Bool" | "bool" | "boolean" => Ok(GridKind::Bool),
            "Guid" | "guid" | "Uuid" | "uuid" => Ok(GridKind::Guid),
            other => Err(Error::new(
                span,
                format!("unknown grid kind: '{}'. Expected one of: {}", other, EXPECTED_KINDS),
            )),
        }
    }

    /// Parse a kind from an identifier.
    pub fn from_ident(ident: &Ident) -> Result<Self> {
        GridKind::from_name(&ident.to_string(), ident.span())
    }

    /// Infers the kind from the last segment of a field's type path.
    pub fn infer(type_name: &str) -> Option<Self> {
        let kind = match type_name {
            "String" | "str" => GridKind::String,
            "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize"
            | "f32" | "f64" => GridKind::Number,
            "Decimal" => GridKind::Decimal,
            "NaiveDateTime" | "NaiveDate" | "DateTime" => GridKind::DateTime,
            "bool" => GridKind::Bool,
            "Uuid" => GridKind::Guid,
            _ => return None,
        };
        Some(kind)
    }
}

/// Field-level attributes from `#[grid(...)]`.
#[derive(Debug, Clone, Default)]
pub struct GridAttr {
    /// Explicit kind; inferred from the field type when absent.
    pub kind: Option<GridKind>,
    /// Leave this field out of the registry.
    pub skip: bool,
    /// Custom field name for requests (default: field name).
    pub rename: Option<String>,
}

impl Parse for GridAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = GridAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                // Kind identifier: grid(String), grid(Number), etc.
                Meta::Path(p) => {
                    if p.is_ident("skip") {
                        attr.skip = true;
                    } else if let Some(ident) = p.get_ident() {
                        attr.kind = Some(GridKind::from_ident(ident)?);
                    } else {
                        return Err(Error::new(
                            p.span(),
                            format!("expected grid kind ({}) or skip", EXPECTED_KINDS),
                        ));
                    }
                }

                // rename = "customName" or kind = "datetime"
                Meta::NameValue(nv) => {
                    let syn::Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                    else {
                        return Err(Error::new(nv.value.span(), "expected a string literal"));
                    };

                    if nv.path.is_ident("rename") {
                        attr.rename = Some(s.value());
                    } else if nv.path.is_ident("kind") {
                        attr.kind = Some(GridKind::from_name(&s.value(), s.span())?);
                    } else {
                        return Err(Error::new(
                            nv.path.span(),
                            "unknown attribute. Expected: rename or kind",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown grid attribute. Expected a kind, skip, rename = \"...\", or kind = \"...\"",
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extract `#[grid(...)]` attributes from a field's attributes.
pub fn parse_grid_attrs(attrs: &[Attribute]) -> Result<GridAttr> {
    for attr in attrs {
        if attr.path().is_ident("grid") {
            return attr.parse_args::<GridAttr>();
        }
    }
    Ok(GridAttr::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_grid(tokens: &str) -> Result<GridAttr> {
        syn::parse_str::<GridAttr>(tokens)
    }

    #[test]
    fn test_grid_kinds() {
        for (tokens, kind) in [
            ("String", GridKind::String),
            ("Number", GridKind::Number),
            ("Decimal", GridKind::Decimal),
            ("DateTime", GridKind::DateTime),
            ("Bool", GridKind::Bool),
            ("Guid", GridKind::Guid),
        ] {
            assert_eq!(parse_grid(tokens).unwrap().kind, Some(kind));
        }
    }

    #[test]
    fn test_grid_kind_lowercase() {
        let attr = parse_grid("datetime").unwrap();
        assert_eq!(attr.kind, Some(GridKind::DateTime));
    }

    #[test]
    fn test_grid_kind_via_name_value() {
        let attr = parse_grid(r#"kind = "bool""#).unwrap();
        assert_eq!(attr.kind, Some(GridKind::Bool));
    }

    #[test]
    fn test_grid_skip() {
        let attr = parse_grid("skip").unwrap();
        assert!(attr.skip);
        assert_eq!(attr.kind, None);
    }

    #[test]
    fn test_grid_rename() {
        let attr = parse_grid(r#"rename = "fullName""#).unwrap();
        assert_eq!(attr.kind, None);
        assert_eq!(attr.rename, Some("fullName".to_string()));
    }

    #[test]
    fn test_grid_kind_with_rename() {
        let attr = parse_grid(r#"Number, rename = "qty""#).unwrap();
        assert_eq!(attr.kind, Some(GridKind::Number));
        assert_eq!(attr.rename, Some("qty".to_string()));
    }

    #[test]
    fn test_grid_invalid_kind() {
        let result = parse_grid("Timestamp");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown grid kind"));
    }

    #[test]
    fn test_grid_rename_requires_string() {
        assert!(parse_grid("rename = 3").is_err());
    }

    #[test]
    fn test_grid_unknown_name_value() {
        let result = parse_grid(r#"alias = "x""#);
        assert!(result.unwrap_err().to_string().contains("rename or kind"));
    }

    #[test]
    fn test_infer_from_type_name() {
        assert_eq!(GridKind::infer("String"), Some(GridKind::String));
        assert_eq!(GridKind::infer("u16"), Some(GridKind::Number));
        assert_eq!(GridKind::infer("f64"), Some(GridKind::Number));
        assert_eq!(GridKind::infer("Decimal"), Some(GridKind::Decimal));
        assert_eq!(GridKind::infer("NaiveDate"), Some(GridKind::DateTime));
        assert_eq!(GridKind::infer("Uuid"), Some(GridKind::Guid));
        assert_eq!(GridKind::infer("Vec"), None);
    }
}
