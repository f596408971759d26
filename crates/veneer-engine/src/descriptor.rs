//! Target type descriptors
//!
//! Reads a type's declared surface and selects the method slots a proxy will
//! intercept. A method is eligible when it is an instance method, not final,
//! not private, and the type itself is not sealed; the method filter then
//! narrows the selection.

use std::any::TypeId;
use std::fmt;

use veneer_sdk::MethodSignature;

use crate::config::MethodFilter;
use crate::decl::{ConstructorDecl, MethodDecl, Proxyable, SuperFn};
use crate::error::ProxyError;

/// A method selected for interception
pub struct MethodSlot<T> {
    /// Position in the declared method list
    pub decl_index: usize,
    /// Signature of the intercepted method
    pub signature: MethodSignature,
    pub(crate) super_fn: Option<SuperFn<T>>,
}

impl<T> fmt::Debug for MethodSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSlot")
            .field("decl_index", &self.decl_index)
            .field("signature", &self.signature.to_string())
            .finish()
    }
}

/// Immutable description of a type about to be proxied
pub struct TargetType<T> {
    type_id: TypeId,
    qualified_name: &'static str,
    simple_name: &'static str,
    constructors: Vec<ConstructorDecl<T>>,
    methods: Vec<MethodDecl<T>>,
    slots: Vec<MethodSlot<T>>,
}

impl<T: 'static> TargetType<T> {
    /// Type identity
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Qualified type name
    pub fn qualified_name(&self) -> &'static str {
        self.qualified_name
    }

    /// Unqualified type name
    pub fn simple_name(&self) -> &'static str {
        self.simple_name
    }

    /// Declared constructors
    pub fn constructors(&self) -> &[ConstructorDecl<T>] {
        &self.constructors
    }

    /// All declared methods
    pub fn methods(&self) -> &[MethodDecl<T>] {
        &self.methods
    }

    /// Methods selected for interception
    pub fn slots(&self) -> &[MethodSlot<T>] {
        &self.slots
    }

    /// Check if no method will be intercepted
    pub fn has_no_eligible_methods(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Vec<ConstructorDecl<T>>,
        Vec<MethodDecl<T>>,
        Vec<MethodSlot<T>>,
    ) {
        (self.constructors, self.methods, self.slots)
    }
}

impl<T> fmt::Debug for TargetType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetType")
            .field("qualified_name", &self.qualified_name)
            .field("constructors", &self.constructors.len())
            .field("methods", &self.methods.len())
            .field("slots", &self.slots)
            .finish()
    }
}

/// Check if a declared method may be overridden at all
pub fn is_overridable(signature: &MethodSignature) -> bool {
    !signature.is_final && !signature.is_static() && signature.visibility.is_accessible()
}

/// Build the descriptor of `T` under `filter`
pub fn describe<T: Proxyable>(filter: &MethodFilter) -> Result<TargetType<T>, ProxyError> {
    let decl = T::declared_type();
    let qualified_name = decl.qualified_name();
    let simple_name = decl.simple_name();

    if decl.is_sealed() {
        return Err(ProxyError::NotExtendable {
            type_name: qualified_name.to_string(),
            reason: "type is sealed".to_string(),
        });
    }
    if !decl
        .constructors()
        .iter()
        .any(|c| c.visibility.is_accessible())
    {
        return Err(ProxyError::NotExtendable {
            type_name: qualified_name.to_string(),
            reason: "no public or restricted constructor".to_string(),
        });
    }

    let (constructors, methods) = decl.into_parts();
    let slots: Vec<MethodSlot<T>> = methods
        .iter()
        .enumerate()
        .filter(|(_, m)| is_overridable(&m.signature) && filter.admits(&m.signature))
        .map(|(decl_index, m)| MethodSlot {
            decl_index,
            signature: m.signature.clone(),
            super_fn: m.super_fn(),
        })
        .collect();

    if slots.is_empty() {
        tracing::warn!(
            target: "veneer::descriptor",
            type_name = qualified_name,
            declared = methods.len(),
            "no eligible methods; the proxy will intercept nothing"
        );
    }

    Ok(TargetType {
        type_id: TypeId::of::<T>(),
        qualified_name,
        simple_name,
        constructors,
        methods,
        slots,
    })
}
