//! Implementation of the `#[derive(Record)]` macro.
//!
//! This macro generates a static field registry (one `FieldDescriptor` per
//! queryable field), the getter functions it points to, and external field
//! name constants.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    spanned::Spanned, Data, DeriveInput, Error, Field, Fields, GenericArgument, Ident,
    PathArguments, Result, Type,
};

use super::attrs::{parse_record_attrs, FieldKind};

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Record cannot be derived for generic structs",
        ));
    }

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

    let mut getters: Vec<TokenStream> = Vec::new();
    let mut descriptors: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut registered_names: HashSet<String> = HashSet::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let attrs = parse_record_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let (inner_ty, nullable) = match option_inner(&field.ty) {
            Some(inner) => (inner, true),
            None => (&field.ty, false),
        };

        // Fields of types we can't classify stay out of the registry
        let kind = match attrs.kind.or_else(|| infer_kind(inner_ty)) {
            Some(kind) => kind,
            None => continue,
        };

        let rust_name = field_name.to_string();
        let rust_name = rust_name.trim_start_matches("r#");
        let external = attrs
            .rename
            .as_ref()
            .map_or_else(|| to_lower_camel_case(rust_name), |r| r.value());
        let registered = to_upper_camel_case(&external);

        if !registered_names.insert(registered.clone()) {
            return Err(Error::new(
                field.span(),
                format!("field name '{}' is registered more than once", registered),
            ));
        }

        let const_name = const_ident(&external).ok_or_else(|| {
            let span = attrs.rename.as_ref().map_or(field.span(), |r| r.span());
            Error::new(
                span,
                format!("'{}' cannot be used as a field name constant", external),
            )
        })?;
        field_constants.push(quote! {
            /// External field name for queries.
            pub const #const_name: &'static str = #external;
        });

        let getter_name = format_ident!("__tabquery_get_{}", rust_name);
        getters.push(getter_fn(field, &getter_name, kind, nullable));

        let kind_expr = kind_tokens(kind, inner_ty);
        let nullable_call = if nullable {
            quote! { .nullable() }
        } else {
            quote! {}
        };
        descriptors.push(quote! {
            ::tabquery::FieldDescriptor::new(#registered, #kind_expr, #struct_name::#getter_name)
                #nullable_call
        });
    }

    let expanded = quote! {
        impl #struct_name {
            #(#field_constants)*

            #(#getters)*
        }

        impl ::tabquery::Record for #struct_name {
            fn fields() -> &'static [::tabquery::FieldDescriptor<Self>] {
                static FIELDS: &[::tabquery::FieldDescriptor<#struct_name>] = &[
                    #(#descriptors),*
                ];
                FIELDS
            }
        }
    };

    Ok(expanded)
}

/// Builds the getter that reads one field as a `tabquery::Value`.
fn getter_fn(
    field: &Field,
    getter_name: &Ident,
    kind: FieldKind,
    nullable: bool,
) -> TokenStream {
    let field_name = &field.ident;
    let value = match kind {
        FieldKind::String => quote! {
            ::tabquery::Value::String(::core::convert::AsRef::<str>::as_ref(v))
        },
        FieldKind::Bool => quote! { ::tabquery::Value::Bool(*v) },
        FieldKind::Integer | FieldKind::Float => quote! {
            ::tabquery::Value::Number(::tabquery::Number::from(*v))
        },
        FieldKind::Timestamp => quote! {
            ::tabquery::Value::Timestamp(::tabquery::RecordTimestamp::record_timestamp(v))
        },
        FieldKind::Enum => quote! {
            ::tabquery::Value::Enum(::tabquery::RecordEnum::discriminant(v))
        },
    };

    let body = if nullable {
        quote! {
            match &record.#field_name {
                ::core::option::Option::Some(v) => #value,
                ::core::option::Option::None => ::tabquery::Value::Null,
            }
        }
    } else {
        quote! {
            let v = &record.#field_name;
            #value
        }
    };

    quote! {
        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #getter_name(record: &Self) -> ::tabquery::Value<'_> {
            #body
        }
    }
}

fn kind_tokens(kind: FieldKind, inner_ty: &Type) -> TokenStream {
    match kind {
        FieldKind::String => quote! { ::tabquery::FieldKind::String },
        FieldKind::Bool => quote! { ::tabquery::FieldKind::Bool },
        FieldKind::Integer => quote! { ::tabquery::FieldKind::Integer },
        FieldKind::Float => quote! { ::tabquery::FieldKind::Float },
        FieldKind::Timestamp => quote! { ::tabquery::FieldKind::Timestamp },
        FieldKind::Enum => quote! {
            ::tabquery::FieldKind::Enum(<#inner_ty as ::tabquery::RecordEnum>::VARIANTS)
        },
    }
}

/// Returns `T` for a field declared as `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

/// Picks a kind from the type name for fields without an explicit kind.
fn infer_kind(ty: &Type) -> Option<FieldKind> {
    let Type::Path(path) = ty else {
        return None;
    };
    let ident = path.path.segments.last()?.ident.to_string();
    match ident.as_str() {
        "String" => Some(FieldKind::String),
        "bool" => Some(FieldKind::Bool),
        "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => {
            Some(FieldKind::Integer)
        }
        "f32" | "f64" => Some(FieldKind::Float),
        "Timestamp" | "SystemTime" | "DateTime" | "NaiveDateTime" | "NaiveDate" => {
            Some(FieldKind::Timestamp)
        }
        _ => None,
    }
}

/// The name constant for an external name, if it forms an identifier.
fn const_ident(external: &str) -> Option<Ident> {
    syn::parse_str::<Ident>(&to_screaming_snake_case(external)).ok()
}

/// `customer_name` -> `customerName`.
fn to_lower_camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut upper_next = false;

    for c in s.chars() {
        if c == '_' {
            upper_next = !result.is_empty();
        } else if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// `customerName` -> `CustomerName`.
fn to_upper_camel_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
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
        } else if c == '_' || c == '-' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}
