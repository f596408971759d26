//! Proxy instances

use std::fmt;
use std::sync::Arc;

use veneer_sdk::{Failure, Interceptor, Value};

use crate::decl::Proxyable;
use crate::dispatch::{dispatch, TargetRef};
use crate::error::ProxyError;
use crate::factory;
use crate::synth::GeneratedProxyType;

/// An instance of a generated proxy type.
///
/// Owns the target state, the bound interceptor and a shared reference to
/// its generated type. Typed calls go through the `<Type>Proxy` extension
/// trait emitted by `#[proxyable]`; [`invoke`](Self::invoke) calls by name.
pub struct ProxyInstance<T, I> {
    target: T,
    interceptor: Arc<I>,
    proxy_type: Arc<GeneratedProxyType<T, I>>,
}

impl<T: Proxyable, I: Interceptor> ProxyInstance<T, I> {
    pub(crate) fn from_parts(
        target: T,
        interceptor: Arc<I>,
        proxy_type: Arc<GeneratedProxyType<T, I>>,
    ) -> Self {
        Self {
            target,
            interceptor,
            proxy_type,
        }
    }

    /// Generated type of this instance
    pub fn proxy_type(&self) -> &Arc<GeneratedProxyType<T, I>> {
        &self.proxy_type
    }

    /// Bound interceptor
    pub fn interceptor(&self) -> &Arc<I> {
        &self.interceptor
    }

    /// Replace the bound interceptor, returning the previous one
    pub fn set_interceptor(&mut self, interceptor: Arc<I>) -> Arc<I> {
        std::mem::replace(&mut self.interceptor, interceptor)
    }

    /// Target state, without interception
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Mutable target state, without interception
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Unwrap the target state
    pub fn into_target(self) -> T {
        self.target
    }

    /// Create another instance of the same generated type
    pub fn new_instance(&self, interceptor: Arc<I>, args: Vec<Value>) -> Result<Self, ProxyError> {
        factory::instantiate(Arc::clone(&self.proxy_type), interceptor, args)
    }

    /// Call an instance method by name with dynamic arguments
    pub fn invoke(&mut self, method: &str, args: Vec<Value>) -> Result<Value, ProxyError> {
        let index = self
            .proxy_type
            .method_index(method)
            .ok_or_else(|| ProxyError::NoSuchMethod {
                type_name: self.proxy_type.target_name().to_string(),
                method: method.to_string(),
            })?;
        if let Some(signature) = self.proxy_type.method(method) {
            if !signature.accepts_args(&args) {
                return Err(ProxyError::InvalidArguments {
                    method: method.to_string(),
                    expected: signature
                        .params
                        .iter()
                        .map(|p| p.ty.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    got: args
                        .iter()
                        .map(Value::type_name)
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }
        self.call_mut(index, args).map_err(ProxyError::InterceptorFailure)
    }

    /// Call a `&self` method by declaration index
    pub fn call_ref(&self, decl_index: usize, args: Vec<Value>) -> Result<Value, Failure> {
        dispatch(
            &self.proxy_type,
            &*self.interceptor,
            TargetRef::Shared(&self.target),
            decl_index,
            args,
        )
    }

    /// Call a method by declaration index
    pub fn call_mut(&mut self, decl_index: usize, args: Vec<Value>) -> Result<Value, Failure> {
        dispatch(
            &self.proxy_type,
            &*self.interceptor,
            TargetRef::Exclusive(&mut self.target),
            decl_index,
            args,
        )
    }
}

impl<T, I> fmt::Debug for ProxyInstance<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("proxy_type", &*self.proxy_type)
            .finish_non_exhaustive()
    }
}
