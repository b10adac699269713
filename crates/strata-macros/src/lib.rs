// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Procedural macros for the strata storage engine.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// A derive macro that implements the `strata_data::Component` trait.
///
/// Components are node-owned with the general operation table by default.
/// Two flags are accepted in a `#[component(...)]` attribute:
///
/// - `chunk`: one instance per chunk instead of one per node.
/// - `pod`: the type is `bytemuck::Pod`, so construction zero-fills and copies are bitwise.
///
/// ```ignore
/// #[derive(Clone, Copy, Default, Component, Pod, Zeroable)]
/// #[repr(C)]
/// #[component(chunk, pod)]
/// struct Gravity(f32);
/// ```
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut chunk_owned = false;
    let mut pod = false;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("component")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("chunk") {
                chunk_owned = true;
                Ok(())
            } else if meta.path.is_ident("node") {
                chunk_owned = false;
                Ok(())
            } else if meta.path.is_ident("pod") {
                pod = true;
                Ok(())
            } else {
                Err(meta.error("expected `chunk`, `node` or `pod`"))
            }
        });
        if let Err(err) = parsed {
            return err.to_compile_error().into();
        }
    }

    let owner = if chunk_owned {
        quote! { ::strata_data::ComponentOwner::Chunk }
    } else {
        quote! { ::strata_data::ComponentOwner::Node }
    };

    // Only emit a vtable override when the trivial table was requested;
    // the trait default covers everything else.
    let vtable = if pod {
        quote! {
            fn vtable() -> ::strata_data::ComponentVTable {
                ::strata_data::ComponentVTable::pod::<Self>()
            }
        }
    } else {
        quote! {}
    };

    let expanded = quote! {
        impl #impl_generics ::strata_data::Component for #name #ty_generics #where_clause {
            const OWNER: ::strata_data::ComponentOwner = #owner;
            #vtable
        }
    };

    TokenStream::from(expanded)
}
