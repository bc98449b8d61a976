//! Attribute parsing for the Record derive macro.
//!
//! This module provides parsers for the `#[record(...)]` field attributes
//! used by the `Record` derive macro.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Ident, Lit, Meta, Result, Token,
};

/// The semantic kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `#[record(String)]`
    String,
    /// `#[record(Bool)]`
    Bool,
    /// `#[record(Integer)]`
    Integer,
    /// `#[record(Float)]`
    Float,
    /// `#[record(Timestamp)]`
    Timestamp,
    /// `#[record(Enum)]`, requires a `RecordEnum` impl
    Enum,
}

const EXPECTED_KINDS: &str = "String, Bool, Integer, Float, Timestamp, Enum";

impl FieldKind {
    /// Parses a kind name, in either capitalized or lower-case spelling.
    pub fn parse(name: &str, span: Span) -> Result<Self> {
        match name {
            "String" | "string" => Ok(FieldKind::String),
            "Bool" | "bool" | "boolean" => Ok(FieldKind::Bool),
            "Integer" | "integer" => Ok(FieldKind::Integer),
            "Float" | "float" => Ok(FieldKind::Float),
            "Timestamp" | "timestamp" => Ok(FieldKind::Timestamp),
            "Enum" | "enumeration" => Ok(FieldKind::Enum),
            other => Err(Error::new(
                span,
                format!(
                    "unknown field kind: '{}'. Expected one of: {}",
                    other, EXPECTED_KINDS
                ),
            )),
        }
    }

    fn from_ident(ident: &Ident) -> Result<Self> {
        FieldKind::parse(&ident.to_string(), ident.span())
    }
}

/// Field-level attributes from `#[record(...)]`.
#[derive(Debug, Clone, Default)]
pub struct RecordAttr {
    /// Explicit kind; inferred from the field type when absent.
    pub kind: Option<FieldKind>,
    /// Leave this field out of the registry.
    pub skip: bool,
    /// External (lower-camel-case) name to use instead of the field name.
    pub rename: Option<syn::LitStr>,
}

fn string_value(nv: &syn::MetaNameValue, what: &str) -> Result<syn::LitStr> {
    match &nv.value {
        syn::Expr::Lit(syn::ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.clone()),
        other => Err(Error::new(
            other.span(),
            format!("{} must be a string literal", what),
        )),
    }
}

impl Parse for RecordAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = RecordAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                // Kind identifier: record(String), record(Integer), etc.
                Meta::Path(p) => {
                    if p.is_ident("skip") {
                        attr.skip = true;
                    } else if let Some(ident) = p.get_ident() {
                        attr.kind = Some(FieldKind::from_ident(ident)?);
                    } else {
                        return Err(Error::new(
                            p.span(),
                            format!("expected field kind ({}) or skip", EXPECTED_KINDS),
                        ));
                    }
                }

                // rename = "customName" or ty = "enum"
                Meta::NameValue(nv) => {
                    if nv.path.is_ident("rename") {
                        let name = string_value(nv, "rename")?;
                        if name.value().is_empty() {
                            return Err(Error::new(name.span(), "rename must not be empty"));
                        }
                        attr.rename = Some(name);
                    } else if nv.path.is_ident("ty") {
                        let ty = string_value(nv, "ty")?;
                        attr.kind = Some(FieldKind::parse(&ty.value(), ty.span())?);
                    } else {
                        return Err(Error::new(
                            nv.path.span(),
                            "unknown attribute. Expected: rename or ty",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        format!(
                            "unknown record attribute. Expected: {}, skip, rename = \"...\", or ty = \"...\"",
                            EXPECTED_KINDS
                        ),
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extract `#[record(...)]` attributes from a field's attributes.
pub fn parse_record_attrs(attrs: &[Attribute]) -> Result<RecordAttr> {
    for attr in attrs {
        if attr.path().is_ident("record") {
            return attr.parse_args::<RecordAttr>();
        }
    }
    Ok(RecordAttr::default())
}
