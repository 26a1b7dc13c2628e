//! Parsing logic for the `#[minirpc::service]` macro.
//!
//! This module walks an inherent `impl` block and picks out the methods that
//! can be exported as RPC methods. Methods that do not fit the shape are
//! skipped, not rejected.

use syn::{
    Error, Expr, FnArg, ImplItem, ImplItemFn, ItemImpl, Lit, Meta, MetaNameValue, Result,
    ReturnType, Type, TypeImplTrait, TypeParamBound, TypeReference, Visibility,
};

/// Parsed service definition.
#[derive(Debug)]
pub struct ServiceDef {
    /// The receiver type (`Self` of the impl block)
    pub self_ty: Type,
    /// Service name (type name unless overridden)
    pub name: String,
    /// Exported methods
    pub methods: Vec<MethodDef>,
}

/// Parsed method definition.
#[derive(Debug)]
pub struct MethodDef {
    /// Rust method name
    pub ident: syn::Ident,
    /// Exported name in UpperCamelCase
    pub export: String,
    /// Argument type, with any `&` stripped
    pub arg_ty: Type,
    /// Whether the argument is taken by shared reference
    pub arg_by_ref: bool,
    /// Reply type behind the `&mut`
    pub reply_ty: Type,
    /// Whether the call has to be awaited
    pub awaits: bool,
}

/// Parse the impl block and the attribute arguments.
pub fn parse_service(item: &ItemImpl, attr_args: &[Meta]) -> Result<ServiceDef> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(Error::new_spanned(
            path,
            "#[minirpc::service] must be placed on an inherent impl block",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &item.generics,
            "#[minirpc::service] does not support generic impl blocks",
        ));
    }

    let mut name = type_name(&item.self_ty)?;
    for meta in attr_args {
        match meta {
            Meta::NameValue(MetaNameValue {
                path,
                value: Expr::Lit(expr_lit),
                ..
            }) if path.is_ident("name") => {
                if let Lit::Str(lit_str) = &expr_lit.lit {
                    name = lit_str.value();
                } else {
                    return Err(Error::new_spanned(
                        expr_lit,
                        "name attribute must be a string literal",
                    ));
                }
            }
            _ => return Err(Error::new_spanned(meta, "unknown attribute, expected `name = \"...\"`")),
        }
    }
    if name.is_empty() {
        return Err(Error::new_spanned(&item.self_ty, "service name must not be empty"));
    }

    let methods = item
        .items
        .iter()
        .filter_map(|item| match item {
            ImplItem::Fn(method) => parse_method(method),
            _ => None,
        })
        .collect();

    Ok(ServiceDef {
        self_ty: (*item.self_ty).clone(),
        name,
        methods,
    })
}

/// The last path segment of the receiver type, e.g. `Num` for `crate::Num`.
fn type_name(ty: &Type) -> Result<String> {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .ok_or_else(|| Error::new_spanned(ty, "expected a named type")),
        _ => Err(Error::new_spanned(ty, "expected a named type")),
    }
}

/// Returns the method if it has the exported shape:
/// `pub [async] fn m(&self, args: A, reply: &mut R) -> Result<(), E>`.
fn parse_method(method: &ImplItemFn) -> Option<MethodDef> {
    if !matches!(method.vis, Visibility::Public(_)) {
        return None;
    }
    let sig = &method.sig;
    if !sig.generics.params.is_empty() || sig.inputs.len() != 3 {
        return None;
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => return None,
    }
    let (arg_ty, arg_by_ref) = match inputs.next() {
        Some(FnArg::Typed(pat_type)) => match &*pat_type.ty {
            Type::Reference(TypeReference {
                mutability: None,
                elem,
                ..
            }) => ((**elem).clone(), true),
            Type::Reference(_) => return None,
            ty => (ty.clone(), false),
        },
        _ => return None,
    };
    let reply_ty = match inputs.next() {
        Some(FnArg::Typed(pat_type)) => match &*pat_type.ty {
            Type::Reference(TypeReference {
                mutability: Some(_),
                elem,
                ..
            }) => (**elem).clone(),
            _ => return None,
        },
        _ => return None,
    };

    let ReturnType::Type(_, output) = &sig.output else {
        return None;
    };
    let (result_ty, awaits) = if sig.asyncness.is_some() {
        (&**output, true)
    } else if let Some(future_output) = future_output(output) {
        (future_output, true)
    } else {
        (&**output, false)
    };
    if !is_result(result_ty) {
        return None;
    }

    Some(MethodDef {
        ident: sig.ident.clone(),
        export: capitalize(&sig.ident.to_string()),
        arg_ty,
        arg_by_ref,
        reply_ty,
        awaits,
    })
}

/// Extract `T` from `impl Future<Output = T>`.
fn future_output(ty: &Type) -> Option<&Type> {
    let Type::ImplTrait(TypeImplTrait { bounds, .. }) = ty else {
        return None;
    };
    bounds.iter().find_map(|bound| {
        let TypeParamBound::Trait(trait_bound) = bound else {
            return None;
        };
        let segment = trait_bound.path.segments.last()?;
        if segment.ident != "Future" {
            return None;
        }
        let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
            return None;
        };
        args.args.iter().find_map(|arg| match arg {
            syn::GenericArgument::AssocType(assoc) if assoc.ident == "Output" => Some(&assoc.ty),
            _ => None,
        })
    })
}

fn is_result(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Result"),
        _ => false,
    }
}

/// Convert snake_case to UpperCamelCase.
pub fn capitalize(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}
