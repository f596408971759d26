//! The interception contract
//!
//! Every intercepted call runs the same sequence:
//!
//! ```text
//! pre_invoke ──true──▶ original method ──▶ post_invoke(Returned | Failed)
//!      │
//!      └──false──────────────────────────▶ post_invoke(NotInvoked)
//! ```
//!
//! A failure raised by `pre_invoke` ends the call immediately. Otherwise
//! `post_invoke` always runs once and decides what the caller observes.

use std::any::Any;
use std::sync::Arc;

use crate::error::Failure;
use crate::signature::MethodSignature;
use crate::value::Value;

// ============================================================================
// Invocation
// ============================================================================

/// One intercepted call as seen by the interceptor hooks.
#[derive(Clone, Copy)]
pub struct Invocation<'a> {
    target: &'a dyn Any,
    method: &'a MethodSignature,
    args: &'a [Value],
    proxy_type: &'a str,
}

impl<'a> Invocation<'a> {
    /// Describe a call on `target`
    pub fn new(
        target: &'a dyn Any,
        method: &'a MethodSignature,
        args: &'a [Value],
        proxy_type: &'a str,
    ) -> Self {
        Self {
            target,
            method,
            args,
            proxy_type,
        }
    }

    /// Target state of the proxy instance
    pub fn target(&self) -> &'a dyn Any {
        self.target
    }

    /// Borrow the target state as its concrete type
    pub fn target_as<T: Any>(&self) -> Option<&'a T> {
        self.target.downcast_ref::<T>()
    }

    /// Signature of the called method
    pub fn method(&self) -> &'a MethodSignature {
        self.method
    }

    /// Name of the called method
    pub fn method_name(&self) -> &'static str {
        self.method.name
    }

    /// Call arguments
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    /// Name of the generated proxy type
    pub fn proxy_type(&self) -> &'a str {
        self.proxy_type
    }
}

impl std::fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("proxy_type", &self.proxy_type)
            .field("method", &self.method.name)
            .field("args", &self.args)
            .finish()
    }
}

// ============================================================================
// Super outcome
// ============================================================================

/// What happened to the original method during a call.
#[derive(Debug)]
pub enum SuperOutcome {
    /// `pre_invoke` returned false; the original method never ran
    NotInvoked,
    /// The original method returned a value
    Returned(Value),
    /// The original method failed (declared `Err`, or a captured panic)
    Failed(Failure),
}

impl SuperOutcome {
    /// Check if the original method ran
    pub fn invoked_super(&self) -> bool {
        !matches!(self, SuperOutcome::NotInvoked)
    }

    /// Value returned by the original method, if it ran and returned
    pub fn result(&self) -> Option<&Value> {
        match self {
            SuperOutcome::Returned(v) => Some(v),
            _ => None,
        }
    }

    /// Failure raised by the original method, if it ran and failed
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            SuperOutcome::Failed(f) => Some(f),
            _ => None,
        }
    }

    /// Pass the outcome through unchanged.
    ///
    /// A value is returned, a failure is re-raised, and a skipped call
    /// yields `Value::Null`.
    pub fn resume(self) -> Result<Value, Failure> {
        self.resume_or(Value::Null)
    }

    /// Like [`resume`](Self::resume) with a replacement for a skipped call
    pub fn resume_or(self, fallback: Value) -> Result<Value, Failure> {
        match self {
            SuperOutcome::NotInvoked => Ok(fallback),
            SuperOutcome::Returned(v) => Ok(v),
            SuperOutcome::Failed(f) => Err(f),
        }
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            SuperOutcome::NotInvoked => "not-invoked",
            SuperOutcome::Returned(_) => "returned",
            SuperOutcome::Failed(f) if f.is_panic() => "panicked",
            SuperOutcome::Failed(_) => "failed",
        }
    }
}

// ============================================================================
// Interceptor
// ============================================================================

/// Caller-supplied interception policy.
///
/// One interceptor is bound per proxy instance; the same policy may be shared
/// by many instances and threads, so hooks take `&self` and any state must be
/// synchronized by the implementation.
pub trait Interceptor: Send + Sync + 'static {
    /// Runs before the original method; `Ok(false)` skips it.
    fn pre_invoke(&self, invocation: &Invocation<'_>) -> Result<bool, Failure> {
        let _ = invocation;
        Ok(true)
    }

    /// Runs after the original method (or after the skip) and produces the
    /// caller's result.
    fn post_invoke(
        &self,
        invocation: &Invocation<'_>,
        outcome: SuperOutcome,
    ) -> Result<Value, Failure> {
        let _ = invocation;
        outcome.resume()
    }
}

impl<I: Interceptor + ?Sized> Interceptor for Box<I> {
    fn pre_invoke(&self, invocation: &Invocation<'_>) -> Result<bool, Failure> {
        (**self).pre_invoke(invocation)
    }

    fn post_invoke(
        &self,
        invocation: &Invocation<'_>,
        outcome: SuperOutcome,
    ) -> Result<Value, Failure> {
        (**self).post_invoke(invocation, outcome)
    }
}

impl<I: Interceptor + ?Sized> Interceptor for Arc<I> {
    fn pre_invoke(&self, invocation: &Invocation<'_>) -> Result<bool, Failure> {
        (**self).pre_invoke(invocation)
    }

    fn post_invoke(
        &self,
        invocation: &Invocation<'_>,
        outcome: SuperOutcome,
    ) -> Result<Value, Failure> {
        (**self).post_invoke(invocation, outcome)
    }
}
