//! This crate only contains the `#[derive(Shape)]` proc-macro for
//! `mongo_connector`. For documentation, please see the main
//! [`mongo_connector`][1] crate.
//!
//! [1]: https://docs.rs/mongo_connector

#![doc(html_root_url = "https://docs.rs/mongo_connector_derive/0.1.0")]
#![deny(missing_debug_implementations, missing_copy_implementations,
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unused_import_braces)]
#![allow(clippy::single_match, clippy::match_same_arms, clippy::match_ref_pats,
         clippy::clone_on_ref_ptr, clippy::needless_pass_by_value)]
#![deny(clippy::wrong_self_convention, clippy::used_underscore_binding,
        clippy::similar_names, clippy::missing_docs_in_private_items,
        clippy::non_ascii_literal, clippy::unicode_not_nfc,
        clippy::unwrap_used, clippy::expect_used,
        clippy::int_plus_one, clippy::string_add_assign, clippy::if_not_else,
        clippy::mutex_integer, clippy::mut_mut,
        clippy::print_stdout, clippy::mem_forget, clippy::maybe_infinite_iter)]

extern crate proc_macro;

#[macro_use]
extern crate quote;

#[macro_use]
mod error;
mod meta;
mod case;
mod shape;

use proc_macro::TokenStream;
use syn::DeriveInput;

/// The top-level entry point of this proc-macro. Only here to be exported
/// and to turn `Result::Err` return values into compiler errors.
#[proc_macro_derive(Shape, attributes(serde))]
pub fn derive_shape(input: TokenStream) -> TokenStream {
    let parsed_ast = syn::parse_macro_input!(input as DeriveInput);

    shape::impl_shape(parsed_ast)
        .unwrap_or_else(error::Error::into_compile_error)
        .into()
}
