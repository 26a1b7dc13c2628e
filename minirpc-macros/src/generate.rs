//! Code generation for the `#[minirpc::service]` macro.
//!
//! Emits an `impl minirpc::service::Receiver` that registers one closure per
//! exported method with `ServiceBuilder`.

use crate::parse::{MethodDef, ServiceDef};
use proc_macro2::TokenStream;
use quote::quote;

/// Generate the `Receiver` impl for a service.
pub fn generate_receiver(service: &ServiceDef) -> TokenStream {
    let self_ty = &service.self_ty;
    let name = &service.name;
    let methods = service.methods.iter().map(generate_method);

    quote! {
        impl ::minirpc::service::Receiver for #self_ty {
            fn into_service(
                self: ::std::sync::Arc<Self>,
            ) -> ::minirpc::service::Service {
                ::minirpc::service::ServiceBuilder::from_arc(#name, self)
                    #(#methods)*
                    .build()
            }
        }
    }
}

/// Generate one `.method(...)` registration.
///
/// The closure decodes the argument, default-initializes the reply, runs the
/// method against it and yields the reply on success.
fn generate_method(method: &MethodDef) -> TokenStream {
    let ident = &method.ident;
    let export = &method.export;
    let arg_ty = &method.arg_ty;
    let reply_ty = &method.reply_ty;
    let arg = if method.arg_by_ref {
        quote! { &args }
    } else {
        quote! { args }
    };
    let call = if method.awaits {
        quote! { receiver.#ident(#arg, &mut reply).await }
    } else {
        quote! { receiver.#ident(#arg, &mut reply) }
    };

    quote! {
        .method(#export, |receiver: ::std::sync::Arc<Self>, args: #arg_ty| async move {
            let mut reply = <#reply_ty as ::core::default::Default>::default();
            let result = #call;
            result.map(move |_| reply)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_service;
    use syn::{ItemImpl, parse_quote};

    #[test]
    fn test_generates_one_registration_per_method() {
        let item: ItemImpl = parse_quote! {
            impl Num {
                pub async fn add(&self, args: Args, reply: &mut i64) -> Result<(), String> { todo!() }
                pub fn neg(&self, args: &i64, reply: &mut i64) -> Result<(), String> { todo!() }
            }
        };
        let service = parse_service(&item, &[]).unwrap();
        let tokens = generate_receiver(&service).to_string().replace(' ', "");

        assert!(tokens.contains("impl::minirpc::service::ReceiverforNum"));
        assert!(tokens.contains("\"Add\""));
        assert!(tokens.contains("\"Neg\""));
        assert!(tokens.contains("receiver.add(args,&mutreply).await"));
        assert!(tokens.contains("receiver.neg(&args,&mutreply)"));
        assert!(!tokens.contains("receiver.neg(&args,&mutreply).await"));
    }
}
