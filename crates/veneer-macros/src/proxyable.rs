// #[proxyable] proc-macro implementation
//
// Generates the Proxyable descriptor and the typed extension trait for proxy
// instances.

use proc_macro2::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::meta::ParseNestedMeta;
use syn::{Ident, ImplItem, ItemImpl, LitStr, PathArguments, Result, Type};

use crate::classify::{classify, FnShape, Param, ReceiverKind, ReturnShape, VisKind};

/// Arguments of `#[proxyable(...)]`
#[derive(Default)]
pub struct ProxyableArgs {
    sealed: bool,
    name: Option<LitStr>,
    wrapper: Option<Ident>,
}

impl ProxyableArgs {
    pub fn parse(&mut self, meta: ParseNestedMeta) -> Result<()> {
        if meta.path.is_ident("sealed") {
            self.sealed = true;
            Ok(())
        } else if meta.path.is_ident("name") {
            self.name = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("wrapper") {
            self.wrapper = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unsupported proxyable property (expected `sealed`, `name` or `wrapper`)"))
        }
    }
}

/// Expands the #[proxyable] attribute macro.
///
/// Input: inherent impl block
/// Output: impl block + `impl Proxyable` + extension trait
///
/// Example expansion:
/// ```ignore
/// // Input:
/// #[proxyable]
/// impl Bag {
///     pub fn new() -> Self { ... }
///     pub fn add(&mut self, item: String) -> bool { ... }
/// }
///
/// // Output:
/// impl Bag { ... }
///
/// impl ::veneer_engine::Proxyable for Bag {
///     fn declared_type() -> ::veneer_engine::TypeDecl<Self> {
///         TypeDecl::new(concat!(module_path!(), "::Bag"), "Bag")
///             .constructor(ConstructorDecl::new("new", |args| ...))
///             .method(MethodDecl::exclusive(signature, |this, args| ...))
///     }
/// }
///
/// pub trait BagProxy {
///     fn add(&mut self, item: String) -> bool;
/// }
///
/// impl<I: Interceptor> BagProxy for ProxyInstance<Bag, I> {
///     fn add(&mut self, item: String) -> bool {
///         glue::complete(self.call_mut(0, vec![item.to_value()]), "add")
///     }
/// }
/// ```
pub fn expand_proxyable(args: ProxyableArgs, mut input: ItemImpl) -> Result<TokenStream> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[proxyable] applies to inherent impl blocks, not trait impls",
        ));
    }
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[proxyable] does not support generic impl blocks",
        ));
    }
    let self_ident = self_type_ident(&input.self_ty)?;
    let self_ty = input.self_ty.clone();

    // Classify before stripping #[proxy] attributes
    let mut constructors = Vec::new();
    let mut methods = Vec::new();
    for item in &input.items {
        if let ImplItem::Fn(method) = item {
            let shape = classify(method, &self_ident)?;
            if shape.is_skipped {
                continue;
            }
            if shape.is_constructor {
                constructors.push(shape);
            } else {
                methods.push(shape);
            }
        }
    }

    for item in &mut input.items {
        if let ImplItem::Fn(method) = item {
            method.attrs.retain(|a| !a.path().is_ident("proxy"));
        }
    }

    let simple_name = self_ident.to_string();
    let qualified_name = match &args.name {
        Some(lit) => lit.to_token_stream(),
        None => quote!(concat!(module_path!(), "::", #simple_name)),
    };
    let sealed = if args.sealed {
        quote!(.sealed())
    } else {
        quote!()
    };

    let constructor_decls = constructors.iter().map(constructor_decl);
    let method_decls = methods.iter().map(method_decl);

    let wrapper = args
        .wrapper
        .clone()
        .unwrap_or_else(|| format_ident!("{}Proxy", self_ident));
    let wrapped: Vec<(usize, &FnShape)> = methods
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_wrappable())
        .collect();
    for (_, m) in &wrapped {
        check_not_shadowed(m)?;
    }
    let trait_methods = wrapped.iter().map(|(_, m)| trait_method_sig(m));
    let impl_methods = wrapped
        .iter()
        .map(|(index, m)| wrapper_method(*index, m, &self_ty));
    let wrapper_doc = format!(
        "Typed methods of `{}` on proxy instances; intercepted methods route through the bound interceptor.",
        simple_name
    );

    Ok(quote! {
        #input

        impl ::veneer_engine::Proxyable for #self_ty {
            fn declared_type() -> ::veneer_engine::TypeDecl<Self> {
                ::veneer_engine::TypeDecl::new(#qualified_name, #simple_name)
                    #sealed
                    #(#constructor_decls)*
                    #(#method_decls)*
            }
        }

        #[doc = #wrapper_doc]
        pub trait #wrapper {
            #(#trait_methods;)*
        }

        impl<__I: ::veneer_engine::Interceptor> #wrapper for ::veneer_engine::ProxyInstance<#self_ty, __I> {
            #(#impl_methods)*
        }
    })
}

/// Inherent methods of `ProxyInstance`; they take precedence over trait
/// methods, so wrapper methods with these names could never be called.
const INSTANCE_METHODS: &[&str] = &[
    "target",
    "target_mut",
    "interceptor",
    "set_interceptor",
    "invoke",
    "proxy_type",
    "new_instance",
    "into_target",
    "call_ref",
    "call_mut",
    "from_parts",
];

fn check_not_shadowed(shape: &FnShape) -> Result<()> {
    let name = shape.ident.to_string();
    if INSTANCE_METHODS.contains(&name.as_str()) {
        return Err(syn::Error::new_spanned(
            &shape.ident,
            format!(
                "method `{0}` would be shadowed by `ProxyInstance::{0}`; rename it or mark it #[proxy(skip)]",
                name
            ),
        ));
    }
    Ok(())
}

fn self_type_ident(ty: &Type) -> Result<Ident> {
    if let Type::Path(p) = ty {
        if p.qself.is_none() {
            if let Some(last) = p.path.segments.last() {
                if matches!(last.arguments, PathArguments::None) {
                    return Ok(last.ident.clone());
                }
            }
        }
    }
    Err(syn::Error::new_spanned(
        ty,
        "#[proxyable] requires a plain, non-generic type path",
    ))
}

fn visibility_tokens(vis: VisKind) -> TokenStream {
    match vis {
        VisKind::Public => quote!(::veneer_engine::Visibility::Public),
        VisKind::Restricted => quote!(::veneer_engine::Visibility::Restricted),
        VisKind::Private => quote!(::veneer_engine::Visibility::Private),
    }
}

/// Descriptor of `ty`.
///
/// Types of functions that are never converted keep only their spelling, so
/// no `ValueType` bound is placed on them.
fn type_desc(ty: &Type, representable: bool, converted: bool) -> TokenStream {
    let spelling = ty.to_token_stream().to_string();
    if !converted {
        quote!(::veneer_engine::TypeDesc::Native(#spelling))
    } else if representable {
        quote!(<#ty as ::veneer_engine::ValueType>::type_desc())
    } else {
        quote!(::veneer_engine::TypeDesc::Unrepresentable(#spelling))
    }
}

fn param_descs(params: &[Param], converted: bool) -> Vec<TokenStream> {
    params
        .iter()
        .map(|p| {
            let name = &p.name;
            let desc = type_desc(&p.ty, p.representable, converted);
            quote!(.with_param(#name, #desc))
        })
        .collect()
}

/// `let name = glue::arg::<Ty>(args, i)?;` for every parameter
fn arg_decoding(params: &[Param]) -> Vec<TokenStream> {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let binding = &p.binding;
            let ty = &p.ty;
            quote! {
                let #binding = ::veneer_engine::glue::arg::<#ty>(__args, #i)?;
            }
        })
        .collect()
}

fn constructor_decl(shape: &FnShape) -> TokenStream {
    let ident = &shape.ident;
    let name = ident.to_string();
    // private constructors are never selected
    let converted = shape.visibility != VisKind::Private;
    let params = param_descs(&shape.params, converted);
    let vis = visibility_tokens(shape.visibility);

    if !converted || !shape.is_representable() {
        return quote! {
            .constructor(
                ::veneer_engine::ConstructorDecl::<Self>::opaque(#name)
                    #(#params)*
                    .with_visibility(#vis)
            )
        };
    }

    let decode = arg_decoding(&shape.params);
    let bindings = shape.params.iter().map(|p| &p.binding);
    let call = quote!(<Self>::#ident(#(#bindings),*));
    let build = match &shape.output {
        ReturnShape::Fallible { .. } => {
            quote!(#call.map_err(::veneer_engine::Failure::raise))
        }
        _ => quote!(::std::result::Result::Ok(#call)),
    };

    quote! {
        .constructor(
            ::veneer_engine::ConstructorDecl::<Self>::new(
                #name,
                |__args: &[::veneer_engine::Value]| -> ::std::result::Result<Self, ::veneer_engine::Failure> {
                    #(#decode)*
                    #build
                },
            )
            #(#params)*
            .with_visibility(#vis)
        )
    }
}

fn signature(shape: &FnShape, converted: bool) -> TokenStream {
    let name = shape.ident.to_string();
    let receiver = match shape.receiver {
        ReceiverKind::Static => quote!(::veneer_engine::Receiver::Static),
        ReceiverKind::Shared => quote!(::veneer_engine::Receiver::Shared),
        ReceiverKind::Exclusive => quote!(::veneer_engine::Receiver::Exclusive),
        ReceiverKind::Owned => quote!(::veneer_engine::Receiver::Owned),
    };
    let params = param_descs(&shape.params, converted);
    let returns = match &shape.output {
        ReturnShape::Unit => quote!(),
        ReturnShape::Plain(ty) => {
            let desc = type_desc(ty, crate::classify::is_representable(ty), converted);
            quote!(.returns(#desc))
        }
        ReturnShape::Fallible { ok, err } => {
            let desc = type_desc(ok, crate::classify::is_representable(ok), converted);
            let err_name = err.to_token_stream().to_string();
            quote!(.returns(#desc).fails_with(#err_name))
        }
    };
    let vis = visibility_tokens(shape.visibility);
    let finality = if shape.is_final {
        quote!(.as_final())
    } else {
        quote!()
    };

    quote! {
        ::veneer_engine::MethodSignature::new(#name, #receiver)
            #(#params)*
            #returns
            .with_visibility(#vis)
            #finality
    }
}

fn method_decl(shape: &FnShape) -> TokenStream {
    let converted = shape.is_candidate()
        && matches!(shape.receiver, ReceiverKind::Shared | ReceiverKind::Exclusive);
    let sig = signature(shape, converted);

    if !converted || !shape.is_representable() {
        return quote! {
            .method(::veneer_engine::MethodDecl::<Self>::opaque(#sig))
        };
    }

    let ident = &shape.ident;
    let decode = arg_decoding(&shape.params);
    let bindings = shape.params.iter().map(|p| &p.binding);
    let call = quote!(<Self>::#ident(__this, #(#bindings),*));
    let body = match &shape.output {
        ReturnShape::Unit => quote! {
            #call;
            ::std::result::Result::Ok(::veneer_engine::Value::Null)
        },
        ReturnShape::Plain(ty) => quote! {
            ::std::result::Result::Ok(<#ty as ::veneer_engine::ToValue>::to_value(#call))
        },
        ReturnShape::Fallible { ok, .. } => quote! {
            match #call {
                ::std::result::Result::Ok(value) => {
                    ::std::result::Result::Ok(<#ok as ::veneer_engine::ToValue>::to_value(value))
                }
                ::std::result::Result::Err(error) => {
                    ::std::result::Result::Err(::veneer_engine::Failure::raise(error))
                }
            }
        },
    };

    let (ctor, this_ty) = match shape.receiver {
        ReceiverKind::Exclusive => (quote!(exclusive), quote!(&mut Self)),
        _ => (quote!(shared), quote!(&Self)),
    };

    quote! {
        .method(::veneer_engine::MethodDecl::<Self>::#ctor(
            #sig,
            |__this: #this_ty, __args: &[::veneer_engine::Value]| -> ::std::result::Result<::veneer_engine::Value, ::veneer_engine::Failure> {
                #(#decode)*
                #body
            },
        ))
    }
}

fn trait_method_sig(shape: &FnShape) -> TokenStream {
    let ident = &shape.ident;
    let receiver = match shape.receiver {
        ReceiverKind::Exclusive => quote!(&mut self),
        _ => quote!(&self),
    };
    let params = shape.params.iter().map(|p| {
        let binding = &p.binding;
        let ty = &p.ty;
        quote!(#binding: #ty)
    });
    let output = match &shape.output {
        ReturnShape::Unit => quote!(),
        ReturnShape::Plain(ty) => quote!(-> #ty),
        ReturnShape::Fallible { .. } => {
            // Keep the declared spelling (aliases included)
            let ty = fallible_spelling(shape);
            quote!(-> #ty)
        }
    };
    quote!(fn #ident(#receiver, #(#params),*) #output)
}

fn fallible_spelling(shape: &FnShape) -> TokenStream {
    match &shape.output {
        ReturnShape::Fallible { ok, err } => quote!(::std::result::Result<#ok, #err>),
        _ => quote!(),
    }
}

fn wrapper_method(index: usize, shape: &FnShape, self_ty: &Type) -> TokenStream {
    let sig = trait_method_sig(shape);
    let ident = &shape.ident;
    let name = ident.to_string();
    let bindings: Vec<&Ident> = shape.params.iter().map(|p| &p.binding).collect();

    let intercepted = shape.is_candidate() && shape.is_representable();
    let body = if intercepted {
        let call = match shape.receiver {
            ReceiverKind::Exclusive => quote!(self.call_mut),
            _ => quote!(self.call_ref),
        };
        let args = shape.params.iter().map(|p| {
            let binding = &p.binding;
            let ty = &p.ty;
            quote!(<#ty as ::veneer_engine::ToValue>::to_value(#binding))
        });
        let invoke = quote!(#call(#index, ::std::vec![#(#args),*]));
        match &shape.output {
            ReturnShape::Unit => quote! {
                ::veneer_engine::glue::complete::<()>(#invoke, #name)
            },
            ReturnShape::Plain(ty) => quote! {
                ::veneer_engine::glue::complete::<#ty>(#invoke, #name)
            },
            ReturnShape::Fallible { ok, err } => quote! {
                ::veneer_engine::glue::complete_fallible::<#ok, #err>(#invoke, #name)
            },
        }
    } else {
        let target = match shape.receiver {
            ReceiverKind::Exclusive => quote!(self.target_mut()),
            _ => quote!(self.target()),
        };
        quote!(<#self_ty>::#ident(#target, #(#bindings),*))
    };

    quote! {
        #[inline]
        #sig {
            #body
        }
    }
}
