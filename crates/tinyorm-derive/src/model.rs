//! Model derive macro implementation

mod attrs;

use attrs::{get_field_attr, get_table_name};
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result, Visibility};

/// A persisted field.
struct ColumnField<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    column: String,
    constraint: String,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let table_name = get_table_name(&input)?.unwrap_or_else(|| name.unraw().to_string());

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Model can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Model can only be derived for structs",
            ));
        }
    };

    let mut columns: Vec<ColumnField> = Vec::new();
    for field in fields {
        let attr = get_field_attr(field)?;
        if attr.skip || !matches!(field.vis, Visibility::Public(_)) {
            continue;
        }
        let ident = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "Model requires named fields")
        })?;
        let column = attr.column.unwrap_or_else(|| ident.unraw().to_string());
        if let Some(dup) = columns.iter().find(|c| c.column == column) {
            return Err(syn::Error::new_spanned(
                field,
                format!("column `{column}` is already mapped by field `{}`", dup.ident),
            ));
        }
        columns.push(ColumnField {
            ident,
            ty: &field.ty,
            column,
            constraint: attr.constraint.unwrap_or_default(),
        });
    }

    let descriptors = columns.iter().map(|c| {
        let ty = c.ty;
        let column = &c.column;
        let constraint = &c.constraint;
        quote! {
            ::tinyorm::FieldDescriptor::new(
                #column,
                <#ty as ::tinyorm::SqlField>::zero_value(),
                #constraint,
            )
        }
    });

    let values = columns.iter().map(|c| {
        let ident = c.ident;
        quote! { ::tinyorm::ToValue::to_value(&self.#ident) }
    });

    let setters = columns.iter().map(|c| {
        let ident = c.ident;
        let ty = c.ty;
        let column = &c.column;
        quote! {
            #column => {
                self.#ident = <#ty as ::tinyorm::FromValue>::from_value(value)
                    .map_err(|e| e.in_column(#column))?;
                ::std::result::Result::Ok(())
            }
        }
    });

    let unknown_column = format!("no such field on {}", name.unraw());
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::tinyorm::Model for #name #ty_generics #where_clause {
            const TYPE_NAME: &'static str = #table_name;

            fn fields() -> ::std::vec::Vec<::tinyorm::FieldDescriptor> {
                ::std::vec![#(#descriptors),*]
            }

            fn record_values(&self) -> ::std::vec::Vec<::tinyorm::Value> {
                ::std::vec![#(#values),*]
            }

            fn set_column(
                &mut self,
                column: &str,
                value: ::tinyorm::Value,
            ) -> ::tinyorm::OrmResult<()> {
                match column {
                    #(#setters)*
                    other => {
                        let _ = &value;
                        ::std::result::Result::Err(::tinyorm::OrmError::decode(other, #unknown_column))
                    }
                }
            }
        }
    })
}
