extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Attribute, Lit, Meta, NestedMeta, Variant};

fn get_enum_variants(input: &syn::DeriveInput) -> &Punctuated<Variant, Comma> {
    let variants = match &input.data {
        syn::Data::Enum(enum_item) => &enum_item.variants,
        _ => panic!("derive input must be an enum"),
    };

    assert!(
        variants.iter().all(|v| v.fields.is_empty()),
        "all variants must be fieldless"
    );

    variants
}

fn mnemonic_of(variant: &Variant) -> String {
    for attr in &variant.attrs {
        if let Some(spelling) = mnemonic_attr_value(attr) {
            return spelling;
        }
    }
    variant.ident.to_string()
}

fn mnemonic_attr_value(attr: &Attribute) -> Option<String> {
    if !attr.path.is_ident("mnemonic") {
        return None;
    }
    match attr.parse_meta().ok()? {
        Meta::NameValue(nv) => match nv.lit {
            Lit::Str(s) => Some(s.value()),
            _ => None,
        },
        _ => None,
    }
}

/// Fixed bit layout shared with `cx_support::OpClassSet`: relation = 0,
/// unary = 1, add = 2, mul = 3, assign = 4.
fn class_bit(name: &str) -> u16 {
    match name {
        "relation" => 0,
        "unary" => 1,
        "add" => 2,
        "mul" => 3,
        "assign" => 4,
        other => panic!("unknown operator class `{}`", other),
    }
}

fn op_classes_of(variant: &Variant) -> Vec<u16> {
    let mut bits = Vec::new();
    for attr in &variant.attrs {
        if !attr.path.is_ident("op_class") {
            continue;
        }
        let meta = attr
            .parse_meta()
            .unwrap_or_else(|e| panic!("malformed op_class attribute: {}", e));
        if let Meta::List(list) = meta {
            for nested in list.nested.iter() {
                if let NestedMeta::Meta(Meta::Path(path)) = nested {
                    let name = path.get_ident().expect("op_class entries must be identifiers").to_string();
                    bits.push(class_bit(&name));
                }
            }
        }
    }
    bits
}

/// Derives `cx_support::FromMnemonic` for a fieldless enum.
///
/// By default each variant's surface spelling is its identifier's name
/// exactly as written; override with `#[mnemonic = "+"]` for variants whose
/// spelling is not a valid Rust identifier.
#[proc_macro_derive(FromMnemonic, attributes(mnemonic))]
pub fn from_mnemonic_derive(input: TokenStream) -> TokenStream {
    let syn_item: syn::DeriveInput = syn::parse(input).unwrap();
    let name = &syn_item.ident;
    let name_str = name.to_string();
    let variants = get_enum_variants(&syn_item);

    let spellings: Vec<String> = variants.iter().map(mnemonic_of).collect();
    let idents: Vec<&syn::Ident> = variants.iter().map(|v| &v.ident).collect();

    let expanded = quote! {
        impl ::cx_support::FromMnemonic for #name {
            fn from_mnemonic(spelling: &str) -> Result<#name, ::cx_support::ParseMnemonicError> {
                match spelling {
                    #( #spellings => Ok(#name::#idents), )*
                    _ => Err(::cx_support::ParseMnemonicError {
                        spelling: spelling.to_string(),
                        enum_name: #name_str,
                    }),
                }
            }
        }
    };
    expanded.into()
}

/// Derives `cx_support::OpClassify` for a fieldless enum whose variants are
/// annotated with `#[op_class(relation, add, ...)]`. Variants without the
/// attribute belong to no class.
#[proc_macro_derive(OpClassify, attributes(op_class))]
pub fn op_classify_derive(input: TokenStream) -> TokenStream {
    let syn_item: syn::DeriveInput = syn::parse(input).unwrap();
    let name = &syn_item.ident;
    let variants = get_enum_variants(&syn_item);

    let idents: Vec<&syn::Ident> = variants.iter().map(|v| &v.ident).collect();
    let masks: Vec<u16> = variants
        .iter()
        .map(|v| op_classes_of(v).into_iter().fold(0u16, |acc, bit| acc | (1 << bit)))
        .collect();

    let expanded = quote! {
        impl ::cx_support::OpClassify for #name {
            fn op_classes(&self) -> ::cx_support::OpClassSet {
                match self {
                    #( #name::#idents => ::cx_support::OpClassSet(#masks), )*
                }
            }
        }
    };
    expanded.into()
}
