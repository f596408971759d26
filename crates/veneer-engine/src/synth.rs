//! Proxy type synthesis
//!
//! Turns a target descriptor into a [`GeneratedProxyType`]: a route table with
//! one entry per declared method. Intercepted entries run the dispatch
//! protocol; every other entry calls the original method directly.
//!
//! The super implementation of every entry is the function pointer captured
//! when the type was declared, so a proxy can never recurse into itself.

use std::any::{type_name, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use veneer_sdk::{Interceptor, MethodSignature};

use crate::config::ProxyOptions;
use crate::decl::{ConstructorDecl, Proxyable, SuperFn};
use crate::descriptor::TargetType;
use crate::error::ProxyError;

/// Process-wide counter for generated type names
static PROXY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identity of an interceptor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilitySignature {
    /// Concrete interceptor type
    pub type_id: TypeId,
    /// Its name, for diagnostics
    pub type_name: &'static str,
}

impl CapabilitySignature {
    /// Signature of interceptor type `I`
    pub fn of<I: Interceptor>() -> Self {
        Self {
            type_id: TypeId::of::<I>(),
            type_name: type_name::<I>(),
        }
    }
}

/// How calls to a declared method are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Runs the interception protocol (slot index)
    Intercept(usize),
    /// Calls the original method without interception
    Direct,
    /// No value-level implementation (static or unrepresentable method)
    Unavailable,
}

pub(crate) struct RouteEntry<T> {
    pub(crate) signature: MethodSignature,
    pub(crate) super_fn: Option<SuperFn<T>>,
    pub(crate) route: Route,
}

/// A synthesized proxy type.
///
/// Shared read-only by every instance created from it; never mutated after
/// synthesis.
pub struct GeneratedProxyType<T, I> {
    name: String,
    target_id: TypeId,
    target_name: &'static str,
    constructors: Vec<ConstructorDecl<T>>,
    entries: Vec<RouteEntry<T>>,
    method_index: FxHashMap<&'static str, usize>,
    slot_count: usize,
    options: ProxyOptions,
    capability: CapabilitySignature,
    _interceptor: PhantomData<fn() -> I>,
}

impl<T: Proxyable, I: Interceptor> GeneratedProxyType<T, I> {
    /// Generated type name (`<Type>$$Proxy$$<n>`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the proxied type
    pub fn target_type_id(&self) -> TypeId {
        self.target_id
    }

    /// Qualified name of the proxied type
    pub fn target_name(&self) -> &'static str {
        self.target_name
    }

    /// Interceptor capability this type was generated for
    pub fn capability(&self) -> CapabilitySignature {
        self.capability
    }

    /// Options this type was generated with
    pub fn options(&self) -> &ProxyOptions {
        &self.options
    }

    /// Number of intercepted slots
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Signatures of the intercepted methods, in declaration order
    pub fn intercepted(&self) -> impl Iterator<Item = &MethodSignature> + '_ {
        self.entries
            .iter()
            .filter(|e| matches!(e.route, Route::Intercept(_)))
            .map(|e| &e.signature)
    }

    /// Check if calls to `name` are intercepted
    pub fn is_intercepted(&self, name: &str) -> bool {
        self.route_of(name)
            .is_some_and(|route| matches!(route, Route::Intercept(_)))
    }

    /// Route of the first declared method called `name`
    pub fn route_of(&self, name: &str) -> Option<Route> {
        self.entries
            .iter()
            .find(|e| e.signature.name == name)
            .map(|e| e.route)
    }

    /// Signature of a callable instance method
    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.method_index
            .get(name)
            .map(|&index| &self.entries[index].signature)
    }

    pub(crate) fn constructors(&self) -> &[ConstructorDecl<T>] {
        &self.constructors
    }

    pub(crate) fn entry(&self, decl_index: usize) -> Option<&RouteEntry<T>> {
        self.entries.get(decl_index)
    }

    pub(crate) fn method_index(&self, name: &str) -> Option<usize> {
        self.method_index.get(name).copied()
    }
}

impl<T, I> fmt::Debug for GeneratedProxyType<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedProxyType")
            .field("name", &self.name)
            .field("target", &self.target_name)
            .field("interceptor", &self.capability.type_name)
            .field("slots", &self.slot_count)
            .finish()
    }
}

fn generation_error(target: &str, method: &str, reason: impl Into<String>) -> ProxyError {
    ProxyError::Generation {
        type_name: target.to_string(),
        method: method.to_string(),
        reason: reason.into(),
    }
}

/// Synthesize the proxy type for `target` bound to interceptor type `I`
pub fn synthesize<T: Proxyable, I: Interceptor>(
    target: TargetType<T>,
    options: ProxyOptions,
) -> Result<GeneratedProxyType<T, I>, ProxyError> {
    let target_id = target.type_id();
    let target_name = target.qualified_name();
    let simple_name = target.simple_name();
    let (constructors, methods, slots) = target.into_parts();

    let mut routes: Vec<Route> = methods
        .iter()
        .map(|m| {
            if m.super_fn().is_some() && !m.signature.is_static() {
                Route::Direct
            } else {
                Route::Unavailable
            }
        })
        .collect();

    // name -> slot index of the first slot with that name
    let mut slot_names: FxHashMap<&'static str, usize> = FxHashMap::default();
    let mut slot_count = 0;
    for (slot_index, slot) in slots.iter().enumerate() {
        let name = slot.signature.name;
        if let Some(reason) = slot.signature.unrepresentable_reason() {
            return Err(generation_error(target_name, name, reason));
        }
        if slot.super_fn.is_none() {
            return Err(generation_error(
                target_name,
                name,
                "no original method registered",
            ));
        }

        match slot_names.get(name) {
            Some(&first) => {
                let first_sig = &slots[first].signature;
                if !first_sig.same_shape(&slot.signature) {
                    return Err(generation_error(
                        target_name,
                        name,
                        format!(
                            "conflicting signatures `{}` and `{}`",
                            first_sig, slot.signature
                        ),
                    ));
                }
                // Identical duplicate collapses into the first slot
                routes[slot.decl_index] = Route::Intercept(first);
            }
            None => {
                slot_names.insert(name, slot_index);
                routes[slot.decl_index] = Route::Intercept(slot_index);
                slot_count += 1;
            }
        }
    }

    let mut entries = Vec::with_capacity(methods.len());
    let mut method_index: FxHashMap<&'static str, usize> = FxHashMap::default();
    for (decl_index, (method, route)) in methods.into_iter().zip(routes).enumerate() {
        let super_fn = match route {
            // Collapsed duplicates run the first slot's implementation
            Route::Intercept(slot) => slots[slot].super_fn,
            _ => method.super_fn(),
        };
        if route != Route::Unavailable {
            method_index.entry(method.signature.name).or_insert(decl_index);
        }
        entries.push(RouteEntry {
            signature: method.signature,
            super_fn,
            route,
        });
    }

    let name = format!(
        "{}$$Proxy$${}",
        simple_name,
        PROXY_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let direct = entries.iter().filter(|e| e.route == Route::Direct).count();

    tracing::debug!(
        target: "veneer::synth",
        proxy = %name,
        target_type = target_name,
        interceptor = type_name::<I>(),
        slots = slot_count,
        direct,
        "synthesized proxy type"
    );

    Ok(GeneratedProxyType {
        name,
        target_id,
        target_name,
        constructors,
        entries,
        method_index,
        slot_count,
        options,
        capability: CapabilitySignature::of::<I>(),
        _interceptor: PhantomData,
    })
}
