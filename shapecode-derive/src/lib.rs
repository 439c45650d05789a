//! # Shapecode Derive Macros
//!
//! This crate provides the shape planner for `shapecode`: `#[derive(ShapecodeObject)]`
//! classifies a type once, at compile time, and implements `shapecode::Shaped` for it.
//!
//! | Input                               | Shape                         |
//! |-------------------------------------|-------------------------------|
//! | struct                              | `Composite`                   |
//! | struct + `#[shapecode(fixed)]`      | `Blittable` (+ `FixedLayout`) |
//! | struct + `#[shapecode(custom)]`     | `Custom` (registered strategy)|
//! | enum of single-field tuple variants | `Union`                       |
//!
//! `#[shapecode(name = "...")]` overrides the declared type name, which otherwise is
//! `module_path!()::Ident`.
//!
//! Compatible with `syn 2.0`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DataEnum, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derives `shapecode::Shaped` (and `shapecode::FixedLayout` for fixed structs).
#[proc_macro_derive(ShapecodeObject, attributes(shapecode))]
pub fn derive_shapecode_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[derive(PartialEq, Eq)]
enum Layout {
    Composite,
    Fixed,
    Custom,
}

struct ContainerAttrs {
    layout: Layout,
    name: Option<LitStr>,
}

fn parse_attributes(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut fixed = false;
    let mut custom = false;
    let mut name = None;

    for attr in attrs {
        if attr.path().is_ident("shapecode") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("fixed") {
                    fixed = true;
                    return Ok(());
                }

                if meta.path.is_ident("custom") {
                    custom = true;
                    return Ok(());
                }

                if meta.path.is_ident("name") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    if s.value().is_empty() {
                        return Err(meta.error("Type name must not be empty"));
                    }
                    name = Some(s);
                    return Ok(());
                }
                Err(meta.error("Unknown shapecode attribute key. Supported: fixed, custom, name"))
            })?;
        }
    }

    let layout = match (fixed, custom) {
        (true, true) => {
            return Err(syn::Error::new(
                proc_macro2::Span::call_site(),
                "`fixed` and `custom` cannot be combined",
            ));
        }
        (true, false) => Layout::Fixed,
        (false, true) => Layout::Custom,
        (false, false) => Layout::Composite,
    };
    Ok(ContainerAttrs { layout, name })
}

/// One struct member: how to reach it and what to call it.
struct FieldInfo {
    member: syn::Member,
    label: String,
    ty: syn::Type,
}

fn collect_fields(fields: &Fields) -> Vec<FieldInfo> {
    fields
        .iter()
        .enumerate()
        .map(|(i, f)| match &f.ident {
            Some(ident) => FieldInfo {
                member: syn::Member::Named(ident.clone()),
                label: ident.to_string(),
                ty: f.ty.clone(),
            },
            None => FieldInfo {
                member: syn::Member::Unnamed(syn::Index::from(i)),
                label: i.to_string(),
                ty: f.ty.clone(),
            },
        })
        .collect()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "ShapecodeObject does not support generic types",
        ));
    }
    let attrs = parse_attributes(&input.attrs)?;
    let type_name = match &attrs.name {
        Some(lit) => quote! { #lit },
        None => quote! {
            ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#ident))
        },
    };

    match &input.data {
        Data::Struct(ds) => {
            let fields = collect_fields(&ds.fields);
            match attrs.layout {
                Layout::Composite => Ok(generate_composite(ident, &type_name, &fields)),
                Layout::Custom => Ok(generate_custom(ident, &type_name, &fields)),
                Layout::Fixed => generate_fixed(ident, &type_name, &fields),
            }
        }
        Data::Enum(de) => {
            if attrs.layout != Layout::Composite {
                return Err(syn::Error::new(
                    ident.span(),
                    "`fixed` and `custom` apply to structs only",
                ));
            }
            generate_union(ident, &type_name, de)
        }
        Data::Union(_) => Err(syn::Error::new(
            ident.span(),
            "ShapecodeObject supports structs and enums",
        )),
    }
}

// --- Generator: member-wise value conversion (composite and custom) ---

fn generate_member_values(type_name: &TokenStream2, fields: &[FieldInfo]) -> TokenStream2 {
    let members: Vec<_> = fields.iter().map(|f| &f.member).collect();
    let labels: Vec<_> = fields.iter().map(|f| &f.label).collect();
    let tys: Vec<_> = fields.iter().map(|f| &f.ty).collect();
    let count = fields.len();

    quote! {
        fn to_value(&self) -> ::shapecode::Value {
            ::shapecode::Value::Composite(::std::vec![
                #( ::shapecode::Shaped::to_value(&self.#members) ),*
            ])
        }

        fn from_value(value: ::shapecode::Value) -> ::shapecode::Result<Self> {
            #[allow(unused_mut, unused_variables)]
            let mut fields = ::shapecode::rt::composite_fields(value, #type_name, #count)?;
            ::core::result::Result::Ok(Self {
                #( #members: ::shapecode::rt::next_field::<#tys>(&mut fields, #type_name, #labels)? ),*
            })
        }
    }
}

// --- Generator: Composite ---

fn generate_composite(
    ident: &syn::Ident,
    type_name: &TokenStream2,
    fields: &[FieldInfo],
) -> TokenStream2 {
    let labels = fields.iter().map(|f| &f.label);
    let tys = fields.iter().map(|f| &f.ty);
    let conversions = generate_member_values(type_name, fields);

    quote! {
        impl ::shapecode::Shaped for #ident {
            fn shape() -> ::shapecode::Shape {
                ::shapecode::Shape::composite(#type_name, ::std::vec![
                    #( ::shapecode::Member::new(#labels, <#tys as ::shapecode::Shaped>::shape()) ),*
                ])
            }

            #conversions
        }
    }
}

// --- Generator: Custom strategy ---

fn generate_custom(
    ident: &syn::Ident,
    type_name: &TokenStream2,
    fields: &[FieldInfo],
) -> TokenStream2 {
    let conversions = generate_member_values(type_name, fields);

    quote! {
        impl ::shapecode::Shaped for #ident {
            fn shape() -> ::shapecode::Shape {
                ::shapecode::Shape::custom(#type_name)
            }

            #conversions
        }
    }
}

// --- Generator: Fixed layout ---

fn generate_fixed(
    ident: &syn::Ident,
    type_name: &TokenStream2,
    fields: &[FieldInfo],
) -> syn::Result<TokenStream2> {
    if fields.is_empty() {
        return Err(syn::Error::new(
            ident.span(),
            "A `fixed` struct needs at least one field",
        ));
    }
    let members: Vec<_> = fields.iter().map(|f| &f.member).collect();
    let tys: Vec<_> = fields.iter().map(|f| &f.ty).collect();

    Ok(quote! {
        impl ::shapecode::FixedLayout for #ident {
            const WIDTH: usize = 0 #( + <#tys as ::shapecode::FixedLayout>::WIDTH )*;

            fn put_le(&self, out: &mut ::std::vec::Vec<u8>) {
                #( ::shapecode::FixedLayout::put_le(&self.#members, out); )*
            }

            fn get_le(bytes: &[u8]) -> ::shapecode::Result<Self> {
                #[allow(unused_mut, unused_variables)]
                let mut slice = ::shapecode::rt::FixedSlice::new(bytes);
                ::core::result::Result::Ok(Self {
                    #( #members: slice.take::<#tys>()? ),*
                })
            }
        }

        impl ::shapecode::Shaped for #ident {
            fn shape() -> ::shapecode::Shape {
                ::shapecode::Shape::blittable(
                    #type_name,
                    <Self as ::shapecode::FixedLayout>::WIDTH,
                )
            }

            fn to_value(&self) -> ::shapecode::Value {
                ::shapecode::rt::to_blob(self)
            }

            fn from_value(value: ::shapecode::Value) -> ::shapecode::Result<Self> {
                ::shapecode::rt::from_blob(value, #type_name)
            }
        }
    })
}

// --- Generator: Union ---

fn generate_union(
    ident: &syn::Ident,
    type_name: &TokenStream2,
    data: &DataEnum,
) -> syn::Result<TokenStream2> {
    if data.variants.is_empty() {
        return Err(syn::Error::new(
            ident.span(),
            "A union needs at least one variant",
        ));
    }

    let mut vidents = Vec::new();
    let mut tys = Vec::new();
    for variant in &data.variants {
        match &variant.fields {
            Fields::Unnamed(f) if f.unnamed.len() == 1 => {
                vidents.push(&variant.ident);
                tys.push(&f.unnamed[0].ty);
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    variant,
                    "Union variants must wrap exactly one type, e.g. `Dog(Dog)`",
                ));
            }
        }
    }
    let indices: Vec<usize> = (0..vidents.len()).collect();

    Ok(quote! {
        impl ::shapecode::Shaped for #ident {
            fn shape() -> ::shapecode::Shape {
                ::shapecode::Shape::union(#type_name, ::std::vec![
                    #( <#tys as ::shapecode::Shaped>::shape() ),*
                ])
            }

            fn to_value(&self) -> ::shapecode::Value {
                match self {
                    #(
                        Self::#vidents(inner) => ::shapecode::Value::Variant(
                            #indices,
                            ::std::boxed::Box::new(::shapecode::Shaped::to_value(inner)),
                        ),
                    )*
                }
            }

            fn from_value(value: ::shapecode::Value) -> ::shapecode::Result<Self> {
                let (index, inner) = ::shapecode::rt::variant(value, #type_name)?;
                match index {
                    #(
                        #indices => ::core::result::Result::Ok(Self::#vidents(
                            <#tys as ::shapecode::Shaped>::from_value(inner)?,
                        )),
                    )*
                    other => ::core::result::Result::Err(
                        ::shapecode::rt::unknown_variant(#type_name, other),
                    ),
                }
            }
        }
    })
}
