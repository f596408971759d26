//! Dispatch runtime
//!
//! Per intercepted call:
//!
//! ```text
//! START ─▶ PRE ──true──▶ SUPER ─┐
//!           │                   ├─▶ POST ─▶ RETURN | FAIL
//!           ├──false──▶ SKIP ───┘
//!           └──Err────────────────────────▶ FAIL
//! ```
//!
//! Every completed PRE is matched by exactly one POST. POST's value or failure
//! is what the caller observes.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use veneer_sdk::{Failure, Interceptor, Invocation, SuperOutcome, Value};

use crate::decl::{Proxyable, SuperFn};
use crate::synth::{GeneratedProxyType, Route, RouteEntry};

/// Failures raised by the dispatch runtime itself
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The final value does not match the declared return type
    #[error("'{method}' must return {expected}, got {got}")]
    ReturnMismatch {
        /// Method name
        method: &'static str,
        /// Declared return type
        expected: String,
        /// Type of the produced value
        got: &'static str,
    },

    /// A `&mut self` method was called through a shared reference
    #[error("'{method}' requires exclusive access to the target")]
    ReceiverMismatch {
        /// Method name
        method: &'static str,
    },

    /// The method has no value-level implementation
    #[error("'{method}' cannot be called through the proxy")]
    Unroutable {
        /// Method name
        method: &'static str,
    },

    /// Method index outside the declared surface
    #[error("No declared method at index {index}")]
    UnknownMethod {
        /// Declaration index
        index: usize,
    },
}

/// Receiver of one call
pub(crate) enum TargetRef<'a, T> {
    Shared(&'a T),
    Exclusive(&'a mut T),
}

impl<T: 'static> TargetRef<'_, T> {
    fn as_any(&self) -> &dyn Any {
        match self {
            TargetRef::Shared(t) => *t,
            TargetRef::Exclusive(t) => &**t,
        }
    }
}

fn call_super<T>(
    super_fn: SuperFn<T>,
    target: &mut TargetRef<'_, T>,
    args: &[Value],
    method: &'static str,
) -> Result<Value, Failure> {
    match (super_fn, target) {
        (SuperFn::Shared(f), TargetRef::Shared(t)) => f(*t, args),
        (SuperFn::Shared(f), TargetRef::Exclusive(t)) => f(&**t, args),
        (SuperFn::Exclusive(f), TargetRef::Exclusive(t)) => f(&mut **t, args),
        (SuperFn::Exclusive(_), TargetRef::Shared(_)) => {
            Err(Failure::raise(DispatchError::ReceiverMismatch { method }))
        }
    }
}

/// Run declared method `decl_index` of a proxy instance
pub(crate) fn dispatch<T: Proxyable, I: Interceptor>(
    proxy_type: &GeneratedProxyType<T, I>,
    interceptor: &I,
    mut target: TargetRef<'_, T>,
    decl_index: usize,
    args: Vec<Value>,
) -> Result<Value, Failure> {
    let entry: &RouteEntry<T> = proxy_type
        .entry(decl_index)
        .ok_or_else(|| Failure::raise(DispatchError::UnknownMethod { index: decl_index }))?;
    let signature = &entry.signature;
    let super_fn = match (entry.route, entry.super_fn) {
        (Route::Unavailable, _) | (_, None) => {
            return Err(Failure::raise(DispatchError::Unroutable {
                method: signature.name,
            }))
        }
        (_, Some(f)) => f,
    };

    if entry.route == Route::Direct {
        return call_super(super_fn, &mut target, &args, signature.name);
    }

    // PRE: a failure here ends the call without POST
    let proceed = {
        let invocation = Invocation::new(target.as_any(), signature, &args, proxy_type.name());
        interceptor.pre_invoke(&invocation)?
    };
    tracing::trace!(
        target: "veneer::dispatch",
        proxy = proxy_type.name(),
        method = signature.name,
        proceed,
        "pre_invoke"
    );

    // SUPER or SKIP
    let outcome = if proceed {
        let result = if proxy_type.options().catch_panics {
            catch_unwind(AssertUnwindSafe(|| {
                call_super(super_fn, &mut target, &args, signature.name)
            }))
            .unwrap_or_else(|payload| Err(Failure::from_panic(payload)))
        } else {
            call_super(super_fn, &mut target, &args, signature.name)
        };
        match result {
            Ok(value) => SuperOutcome::Returned(value),
            Err(failure) => SuperOutcome::Failed(failure),
        }
    } else {
        SuperOutcome::NotInvoked
    };
    tracing::trace!(
        target: "veneer::dispatch",
        proxy = proxy_type.name(),
        method = signature.name,
        outcome = outcome.kind(),
        "super"
    );

    // POST
    let invocation = Invocation::new(target.as_any(), signature, &args, proxy_type.name());
    let value = interceptor.post_invoke(&invocation, outcome)?;

    if !signature.returns.accepts(&value) {
        return Err(Failure::raise(DispatchError::ReturnMismatch {
            method: signature.name,
            expected: signature.returns.to_string(),
            got: value.type_name(),
        }));
    }
    Ok(value)
}
