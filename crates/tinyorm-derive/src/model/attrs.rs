//! Attribute parsing for the Model derive macro.

use syn::{DeriveInput, Result};

/// Parsed field-level `#[orm(...)]` attributes.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub skip: bool,
    pub column: Option<String>,
    pub constraint: Option<String>,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "skip" {
                attr.skip = true;
            } else if ident == "column" || ident == "constraint" {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;
                if ident == "column" {
                    attr.column = Some(value.value());
                } else {
                    attr.constraint = Some(value.value());
                }
            } else {
                return Err(syn::Error::new(
                    ident.span(),
                    format!("unknown orm attribute `{ident}`; expected `skip`, `column` or `constraint`"),
                ));
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(attr)
    }
}

/// Merge every `#[orm(...)]` attribute on a field.
pub(super) fn get_field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let parsed: FieldAttr = attr.parse_args()?;
        merged.skip |= parsed.skip;
        if parsed.column.is_some() {
            merged.column = parsed.column;
        }
        if parsed.constraint.is_some() {
            merged.constraint = parsed.constraint;
        }
    }
    Ok(merged)
}

/// Table name from `#[orm(table = "...")]`, if present.
pub(super) fn get_table_name(input: &DeriveInput) -> Result<Option<String>> {
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let nested: syn::MetaNameValue = attr.parse_args()?;
        if !nested.path.is_ident("table") {
            return Err(syn::Error::new_spanned(
                &nested.path,
                "expected `table = \"...\"`",
            ));
        }
        if let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) = &nested.value
        {
            return Ok(Some(lit.value()));
        }
        return Err(syn::Error::new_spanned(
            &nested.value,
            "table name must be a string literal",
        ));
    }
    Ok(None)
}
