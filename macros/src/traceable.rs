use crate::variant::{EnumInput, Variant, log_method};
use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

impl Variant {
    fn has_no_source(&self) -> bool {
        self.has_attribute("no_source")
    }

    fn is_unit(&self) -> bool {
        self.has_no_source() && self.fields.is_empty()
    }
}

pub fn traceable_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as EnumInput);

    let enum_name = &input.name;
    let variants = &input.variants;

    let enum_variants = variants.iter().map(|variant| {
        let name = &variant.name;
        let message = &variant.message;
        let docs = variant.docs();
        let fields = variant
            .fields
            .iter()
            .map(|(field, ty)| quote! { #field: #ty });

        if variant.is_unit() {
            quote! {
                #(#docs)*
                #[error(#message)]
                #name
            }
        } else if variant.has_no_source() {
            quote! {
                #(#docs)*
                #[error(#message)]
                #name { #(#fields,)* }
            }
        } else {
            quote! {
                #(#docs)*
                #[error(#message)]
                #name {
                    #(#fields,)*
                    err: String
                }
            }
        }
    });

    let level_match_arms = variants.iter().map(|variant| {
        let name = &variant.name;
        let level = &variant.level;
        if variant.is_unit() {
            quote! { Self::#name => #level }
        } else {
            quote! { Self::#name { .. } => #level }
        }
    });

    let constructors = variants.iter().filter(|variant| !variant.is_unit()).map(|variant| {
        let name = &variant.name;
        let constructor = variant.constructor_name();

        let params = variant.fields.iter().map(|(field, ty)| {
            quote! { #field: impl Into<#ty> }
        });
        let assignments = variant.fields.iter().map(|(field, _)| {
            quote! { #field: #field.into() }
        });

        if variant.has_no_source() {
            quote! {
                #[allow(dead_code)]
                pub fn #constructor(#(#params),*) -> Self {
                    Self::#name {
                        #(#assignments,)*
                    }
                }
            }
        } else {
            quote! {
                #[allow(dead_code)]
                pub fn #constructor(#(#params,)* source: impl std::fmt::Display) -> Self {
                    Self::#name {
                        #(#assignments,)*
                        err: source.to_string()
                    }
                }
            }
        }
    });

    let log = log_method();

    quote! {
        #[allow(dead_code)]
        #[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
        pub enum #enum_name {
            #(#enum_variants,)*
        }

        impl #enum_name {
            #[allow(dead_code)]
            pub fn level(&self) -> tracing::Level {
                match self {
                    #(#level_match_arms,)*
                }
            }

            #log

            #(#constructors)*
        }
    }
    .into()
}
