// Classification of associated functions in a #[proxyable] impl block
//
// Decides for every fn whether it is a constructor, a static method or an
// instance method, and whether its parameter and return types can cross the
// Value boundary.

use proc_macro2::{TokenStream, TokenTree};
use quote::{format_ident, quote, ToTokens};
use syn::{
    FnArg, GenericArgument, Ident, ImplItemFn, Pat, PathArguments, Result, ReturnType, Type,
    Visibility,
};

/// How the function receives its instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    Static,
    Shared,
    Exclusive,
    Owned,
}

/// Declared visibility, reduced to what the engine distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisKind {
    Public,
    Restricted,
    Private,
}

/// Return type shape
#[derive(Debug, Clone)]
pub enum ReturnShape {
    Unit,
    Plain(Type),
    Fallible { ok: Type, err: Type },
}

#[derive(Debug, Clone)]
pub struct Param {
    /// Binding used in generated code
    pub binding: Ident,
    /// Name reported in the signature
    pub name: String,
    pub ty: Type,
    pub representable: bool,
}

/// Classified associated function
#[derive(Debug, Clone)]
pub struct FnShape {
    pub ident: Ident,
    pub receiver: ReceiverKind,
    pub params: Vec<Param>,
    pub output: ReturnShape,
    pub visibility: VisKind,
    pub is_final: bool,
    pub is_skipped: bool,
    pub is_constructor: bool,
    /// No generics, not async, not unsafe
    pub plain: bool,
    /// A parameter or the return type mentions `Self`
    pub mentions_self: bool,
}

/// Flags read from `#[proxy(...)]` on a method
#[derive(Debug, Default, Clone, Copy)]
pub struct MethodFlags {
    pub is_final: bool,
    pub skip: bool,
}

/// Read and validate `#[proxy(...)]` attributes
pub fn method_flags(method: &ImplItemFn) -> Result<MethodFlags> {
    let mut flags = MethodFlags::default();
    for attr in method.attrs.iter().filter(|a| a.path().is_ident("proxy")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("final") {
                flags.is_final = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                flags.skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `final` or `skip`"))
            }
        })?;
    }
    Ok(flags)
}

pub fn classify(method: &ImplItemFn, self_ident: &Ident) -> Result<FnShape> {
    let flags = method_flags(method)?;
    let sig = &method.sig;

    let mut receiver = ReceiverKind::Static;
    let mut params = Vec::new();
    for arg in &sig.inputs {
        match arg {
            FnArg::Receiver(r) => {
                receiver = if r.colon_token.is_some() {
                    // `self: Box<Self>`, `self: &Self` and friends
                    ReceiverKind::Owned
                } else {
                    match (&r.reference, &r.mutability) {
                        (Some(_), Some(_)) => ReceiverKind::Exclusive,
                        (Some(_), None) => ReceiverKind::Shared,
                        (None, _) => ReceiverKind::Owned,
                    }
                };
            }
            FnArg::Typed(pat_type) => {
                let index = params.len();
                let (binding, name) = match &*pat_type.pat {
                    Pat::Ident(pat_ident) => {
                        (pat_ident.ident.clone(), pat_ident.ident.to_string())
                    }
                    _ => {
                        let binding = format_ident!("__arg{}", index);
                        let name = format!("_{}", index);
                        (binding, name)
                    }
                };
                let ty = (*pat_type.ty).clone();
                params.push(Param {
                    binding,
                    name,
                    representable: is_representable(&ty),
                    ty,
                });
            }
        }
    }

    let output = match &sig.output {
        ReturnType::Default => ReturnShape::Unit,
        ReturnType::Type(_, ty) => return_shape(ty),
    };

    let is_constructor = receiver == ReceiverKind::Static && returns_self(&output, self_ident);

    let mentions_self = params.iter().any(|p| mentions_self(&p.ty))
        || (!is_constructor && output_mentions_self(&output));

    let plain = sig.generics.params.is_empty()
        && sig.generics.where_clause.is_none()
        && sig.asyncness.is_none()
        && sig.unsafety.is_none()
        && sig.variadic.is_none();

    Ok(FnShape {
        ident: sig.ident.clone(),
        receiver,
        params,
        output,
        visibility: vis_kind(&method.vis),
        is_final: flags.is_final,
        is_skipped: flags.skip,
        is_constructor,
        plain,
        mentions_self,
    })
}

impl FnShape {
    /// Check if the function can be called through `Value` arguments
    pub fn is_representable(&self) -> bool {
        self.plain
            && self.receiver != ReceiverKind::Owned
            && self.params.iter().all(|p| p.representable)
            && (self.is_constructor || (!self.mentions_self && self.output_representable()))
    }

    fn output_representable(&self) -> bool {
        match &self.output {
            ReturnShape::Unit => true,
            ReturnShape::Plain(ty) => is_representable(ty),
            ReturnShape::Fallible { ok, err } => is_representable(ok) && !mentions_self(err),
        }
    }

    /// Check if the method may ever be overridden by a proxy.
    ///
    /// Static, private and final methods are only called directly, so no
    /// value conversions are generated for them.
    pub fn is_candidate(&self) -> bool {
        self.receiver != ReceiverKind::Static
            && self.visibility != VisKind::Private
            && !self.is_final
    }

    /// Check if the method can appear in the generated extension trait
    pub fn is_wrappable(&self) -> bool {
        self.visibility == VisKind::Public
            && matches!(self.receiver, ReceiverKind::Shared | ReceiverKind::Exclusive)
            && self.plain
            && !self.mentions_self
            && !self.has_impl_trait()
    }

    fn has_impl_trait(&self) -> bool {
        let output = match &self.output {
            ReturnShape::Unit => None,
            ReturnShape::Plain(ty) => Some(ty.to_token_stream()),
            ReturnShape::Fallible { ok, err } => Some(quote!(#ok #err)),
        };
        self.params
            .iter()
            .map(|p| p.ty.to_token_stream())
            .chain(output)
            .any(|tokens| contains_ident(tokens, "impl"))
    }
}

/// Syntactic check for types that implement the value conversions.
///
/// Paths (with type arguments that are themselves representable) and `()` pass;
/// references, tuples, slices, arrays, pointers, trait objects, `impl Trait`
/// and function pointers do not.
pub fn is_representable(ty: &Type) -> bool {
    if mentions_self(ty) {
        return false;
    }
    match ty {
        Type::Paren(p) => is_representable(&p.elem),
        Type::Group(g) => is_representable(&g.elem),
        Type::Tuple(t) => t.elems.is_empty(),
        Type::Path(p) => {
            p.qself.is_none()
                && p.path.segments.iter().all(|seg| match &seg.arguments {
                    PathArguments::None => true,
                    PathArguments::AngleBracketed(args) => args.args.iter().all(|arg| match arg {
                        GenericArgument::Type(inner) => is_representable(inner),
                        _ => false,
                    }),
                    PathArguments::Parenthesized(_) => false,
                })
        }
        _ => false,
    }
}

/// Check if a type mentions `Self` anywhere
pub fn mentions_self(ty: &Type) -> bool {
    contains_ident(ty.to_token_stream(), "Self")
}

fn output_mentions_self(output: &ReturnShape) -> bool {
    match output {
        ReturnShape::Unit => false,
        ReturnShape::Plain(ty) => mentions_self(ty),
        ReturnShape::Fallible { ok, err } => mentions_self(ok) || mentions_self(err),
    }
}

fn contains_ident(tokens: TokenStream, name: &str) -> bool {
    tokens.into_iter().any(|tt| match tt {
        TokenTree::Ident(ident) => ident == name,
        TokenTree::Group(group) => contains_ident(group.stream(), name),
        _ => false,
    })
}

fn return_shape(ty: &Type) -> ReturnShape {
    if let Type::Tuple(t) = ty {
        if t.elems.is_empty() {
            return ReturnShape::Unit;
        }
    }
    if let Type::Path(p) = ty {
        if let Some(last) = p.path.segments.last() {
            if last.ident == "Result" {
                if let PathArguments::AngleBracketed(args) = &last.arguments {
                    let types: Vec<&Type> = args
                        .args
                        .iter()
                        .filter_map(|a| match a {
                            GenericArgument::Type(t) => Some(t),
                            _ => None,
                        })
                        .collect();
                    if let [ok, err] = types.as_slice() {
                        return ReturnShape::Fallible {
                            ok: (*ok).clone(),
                            err: (*err).clone(),
                        };
                    }
                }
            }
        }
    }
    ReturnShape::Plain(ty.clone())
}

fn is_self_type(ty: &Type, self_ident: &Ident) -> bool {
    match ty {
        Type::Path(p) if p.qself.is_none() => {
            p.path.is_ident("Self") || p.path.is_ident(self_ident)
        }
        Type::Paren(p) => is_self_type(&p.elem, self_ident),
        Type::Group(g) => is_self_type(&g.elem, self_ident),
        _ => false,
    }
}

fn returns_self(output: &ReturnShape, self_ident: &Ident) -> bool {
    match output {
        ReturnShape::Unit => false,
        ReturnShape::Plain(ty) => is_self_type(ty, self_ident),
        ReturnShape::Fallible { ok, .. } => is_self_type(ok, self_ident),
    }
}

fn vis_kind(vis: &Visibility) -> VisKind {
    match vis {
        Visibility::Public(_) => VisKind::Public,
        Visibility::Restricted(_) => VisKind::Restricted,
        Visibility::Inherited => VisKind::Private,
    }
}
