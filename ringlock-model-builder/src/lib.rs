// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Derive macros for simulation components.
//!
//! Every component holds its [`Entity`] in a field called `entity`, and is
//! displayed by its full hierarchical name.
//!
//! [`Entity`]: ../ringlock_track/entity/struct.Entity.html

extern crate proc_macro;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{self, Data, DeriveInput, Fields, parse_macro_input};

/// Implement `std::fmt::Display` for a struct with an `entity` field.
#[proc_macro_derive(EntityDisplay)]
pub fn entity_display(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input: DeriveInput = parse_macro_input!(input);
    if let Err(error) = check_has_entity(&input) {
        return error.into();
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let output = quote! {
        impl #impl_generics std::fmt::Display for #ident #ty_generics #where_clause {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.entity.fmt(f)
            }
        }
    };

    output.into()
}

/// Implement `GetEntity` for a struct with an `entity: Rc<Entity>` field.
#[proc_macro_derive(EntityGet)]
pub fn entity_get(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input: DeriveInput = parse_macro_input!(input);
    if let Err(error) = check_has_entity(&input) {
        return error.into();
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let output = quote! {
        impl #impl_generics ringlock_track::entity::GetEntity for #ident #ty_generics #where_clause {
            fn entity(&self) -> &std::rc::Rc<ringlock_track::entity::Entity> {
                &self.entity
            }
        }
    };

    output.into()
}

fn check_has_entity(input: &DeriveInput) -> Result<(), TokenStream> {
    let has_entity = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields
                .named
                .iter()
                .any(|f| f.ident.as_ref().is_some_and(|i| i == "entity")),
            _ => false,
        },
        _ => false,
    };

    if has_entity {
        Ok(())
    } else {
        Err(
            syn::Error::new_spanned(&input.ident, "expected a struct with an `entity` field")
                .to_compile_error(),
        )
    }
}
