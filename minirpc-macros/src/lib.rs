//! Procedural macros for minirpc.
//!
//! This crate provides the `#[minirpc::service]` attribute macro, which turns
//! an inherent `impl` block into a `minirpc::service::Receiver` so that the
//! type can be handed to `Server::register`.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Default)]
//! struct Num;
//!
//! #[minirpc::service]
//! impl Num {
//!     // Exported as "Num.Add"
//!     pub async fn add(&self, args: (i64, i64), reply: &mut i64) -> Result<(), String> {
//!         *reply = args.0 + args.1;
//!         Ok(())
//!     }
//!
//!     // Not exported: no reply argument
//!     pub fn helper(&self) -> i64 {
//!         0
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemImpl, Meta, Token, parse_macro_input, punctuated::Punctuated};

mod generate;
mod parse;

/// The `#[minirpc::service]` attribute macro.
///
/// Placed on an inherent `impl` block, it keeps the block as written and
/// implements `minirpc::service::Receiver` for the type. The service is named
/// after the type.
///
/// # Attributes
///
/// - `name`: overrides the service name, e.g. `#[service(name = "Arith")]`
///
/// # Method Signatures
///
/// A method is exported when it is `pub`, takes `&self`, one argument and a
/// `&mut` reply, has no generic parameters, and returns a `Result`:
///
/// ```ignore
/// pub async fn method(&self, args: Arg, reply: &mut Reply) -> Result<(), E>;
/// pub fn method(&self, args: &Arg, reply: &mut Reply) -> Result<(), E>;
/// pub fn method(&self, args: Arg, reply: &mut Reply)
///     -> impl Future<Output = Result<(), E>> + Send;
/// ```
///
/// The exported name is the method name in `UpperCamelCase`. Every other
/// item in the block is left alone.
#[proc_macro_attribute]
pub fn service(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemImpl);

    // Parse attribute arguments
    let attr_args = if attr.is_empty() {
        Vec::new()
    } else {
        match syn::parse::Parser::parse(Punctuated::<Meta, Token![,]>::parse_terminated, attr) {
            Ok(args) => args.into_iter().collect(),
            Err(err) => return err.to_compile_error().into(),
        }
    };

    let service = match parse::parse_service(&input, &attr_args) {
        Ok(service) => service,
        Err(err) => return err.to_compile_error().into(),
    };

    let receiver = generate::generate_receiver(&service);

    let expanded = quote! {
        #input

        #receiver
    };

    TokenStream::from(expanded)
}
