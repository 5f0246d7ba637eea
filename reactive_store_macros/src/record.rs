use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, Ident, LitStr};

pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let vis = &input.vis;

    let fields = named_fields(input)?;
    let id_field = marked_field(fields, |m| m.id)?
        .or_else(|| fields.iter().find(|f| f.ident.as_ref().is_some_and(|i| i == "id")))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                name,
                "Record derive: no field marked with #[record(id)] and no field named `id`",
            )
        })?;
    let category_field = marked_field(fields, |m| m.category)?
        .or_else(|| {
            fields
                .iter()
                .find(|f| f.ident.as_ref().is_some_and(|i| i == "category"))
        })
        .ok_or_else(|| {
            syn::Error::new_spanned(
                name,
                "Record derive: no field marked with #[record(category)] and no field named `category`",
            )
        })?;

    let id_ident = field_ident(id_field)?;
    let category_ident = field_ident(category_field)?;
    let category_ty = &category_field.ty;

    let changes_name = changes_name(input)?;
    let rename_all = container_rename_all(input)?;
    let rename_all_attr = rename_all.map(|lit| quote! { #[serde(rename_all = #lit)] });

    // The id is immutable; every other field becomes optional in the changes struct.
    let mutable: Vec<&Field> = fields
        .iter()
        .filter(|f| f.ident.as_ref() != Some(id_ident))
        .collect();

    let mut change_fields = Vec::with_capacity(mutable.len());
    for field in &mutable {
        let ident = field_ident(field)?;
        let ty = &field.ty;
        let rename = field_rename(field)?.map(|lit| quote! { #[serde(rename = #lit)] });
        change_fields.push(quote! {
            #rename
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub #ident: ::core::option::Option<#ty>,
        });
    }

    let merged_fields = mutable.iter().map(|field| {
        let ident = field.ident.as_ref();
        quote! {
            #ident: match &changes.#ident {
                ::core::option::Option::Some(value) => ::core::clone::Clone::clone(value),
                ::core::option::Option::None => ::core::clone::Clone::clone(&self.#ident),
            },
        }
    });

    let is_empty_checks = mutable.iter().map(|field| {
        let ident = field.ident.as_ref();
        quote! { self.#ident.is_none() }
    });

    let changes_doc = format!(
        "Partial update for [`{}`]: present fields overwrite, absent fields are kept.",
        name
    );

    Ok(quote! {
        #[doc = #changes_doc]
        #[derive(
            ::core::fmt::Debug,
            ::core::clone::Clone,
            ::core::default::Default,
            ::core::cmp::PartialEq,
            reactive_store::__private::serde::Serialize,
            reactive_store::__private::serde::Deserialize,
        )]
        #[serde(crate = "reactive_store::__private::serde")]
        #rename_all_attr
        #vis struct #changes_name {
            #(#change_fields)*
        }

        impl #changes_name {
            /// Returns true when no field is set.
            pub fn is_empty(&self) -> bool {
                true #(&& #is_empty_checks)*
            }
        }

        impl reactive_store::Record for #name {
            type Category = #category_ty;
            type Changes = #changes_name;

            fn id(&self) -> u64 {
                self.#id_ident
            }

            fn category(&self) -> &Self::Category {
                &self.#category_ident
            }

            fn apply(&self, changes: &Self::Changes) -> Self {
                Self {
                    #id_ident: self.#id_ident,
                    #(#merged_fields)*
                }
            }
        }
    })
}

fn named_fields(input: &DeriveInput) -> syn::Result<&syn::punctuated::Punctuated<Field, syn::Token![,]>> {
    if let Data::Struct(data_struct) = &input.data {
        if let Fields::Named(fields) = &data_struct.fields {
            return Ok(&fields.named);
        }
    }
    Err(syn::Error::new_spanned(
        &input.ident,
        "Record derive: only structs with named fields are supported",
    ))
}

fn field_ident(field: &Field) -> syn::Result<&Ident> {
    field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "Record derive: unnamed field"))
}

/// Markers set on a field through `#[record(...)]`.
#[derive(Default)]
struct FieldMarkers {
    id: bool,
    category: bool,
}

fn field_markers(field: &Field) -> syn::Result<FieldMarkers> {
    let mut markers = FieldMarkers::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                markers.id = true;
                Ok(())
            } else if meta.path.is_ident("category") {
                markers.category = true;
                Ok(())
            } else {
                Err(meta.error("unknown record attribute on field, expected `id` or `category`"))
            }
        })?;
    }
    Ok(markers)
}

fn marked_field<'a>(
    fields: &'a syn::punctuated::Punctuated<Field, syn::Token![,]>,
    marker: fn(&FieldMarkers) -> bool,
) -> syn::Result<Option<&'a Field>> {
    for field in fields {
        if marker(&field_markers(field)?) {
            return Ok(Some(field));
        }
    }
    Ok(None)
}

fn changes_name(input: &DeriveInput) -> syn::Result<Ident> {
    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        let mut name = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("changes") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unknown record attribute, expected `changes = \"...\"`"))
            }
        })?;

        if let Some(name) = name {
            return Ok(Ident::new(&name, Span::call_site()));
        }
    }

    Ok(format_ident!("{}Changes", input.ident))
}

/// `#[serde(rename_all = "...")]` on the record, mirrored onto the changes struct so both
/// serialize with the same field names.
fn container_rename_all(input: &DeriveInput) -> syn::Result<Option<LitStr>> {
    serde_string_value(&input.attrs, "rename_all")
}

fn field_rename(field: &Field) -> syn::Result<Option<LitStr>> {
    serde_string_value(&field.attrs, "rename")
}

fn serde_string_value(attrs: &[syn::Attribute], key: &str) -> syn::Result<Option<LitStr>> {
    let mut found = None;
    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) && meta.input.peek(syn::Token![=]) {
                let value: LitStr = meta.value()?.parse()?;
                found = Some(value);
            } else if meta.input.peek(syn::Token![=]) {
                // Other serde keys are not mirrored; consume their value.
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                meta.parse_nested_meta(|nested| {
                    if nested.input.peek(syn::Token![=]) {
                        let _: syn::Expr = nested.value()?.parse()?;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        })?;
    }
    Ok(found)
}
