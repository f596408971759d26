//! Built-in interceptors

use std::fmt;

use veneer_sdk::{Failure, Interceptor, Invocation, SuperOutcome, ToValue, Value};

/// Runs the original method and returns its outcome unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Interceptor for PassThrough {}

/// Never runs the original method; every call returns the same value
#[derive(Debug, Clone)]
pub struct FixedValue(Value);

impl FixedValue {
    /// Return `value` from every intercepted call
    pub fn new(value: impl ToValue) -> Self {
        FixedValue(value.to_value())
    }

    /// The fixed value
    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl Interceptor for FixedValue {
    fn pre_invoke(&self, _: &Invocation<'_>) -> Result<bool, Failure> {
        Ok(false)
    }

    fn post_invoke(&self, _: &Invocation<'_>, _: SuperOutcome) -> Result<Value, Failure> {
        Ok(self.0.clone())
    }
}

type BeforeFn = Box<dyn Fn(&Invocation<'_>) -> Result<bool, Failure> + Send + Sync>;
type AfterFn = Box<dyn Fn(&Invocation<'_>, SuperOutcome) -> Result<Value, Failure> + Send + Sync>;

/// Interceptor assembled from closures.
///
/// A missing `before` always proceeds; a missing `after` passes the outcome
/// through.
///
/// ```ignore
/// let audit = Hooks::new()
///     .before(|call| {
///         tracing::info!(method = call.method_name(), "call");
///         Ok(true)
///     })
///     .after(|_, outcome| outcome.resume());
/// ```
#[derive(Default)]
pub struct Hooks {
    before: Option<BeforeFn>,
    after: Option<AfterFn>,
}

impl Hooks {
    /// No hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pre-invoke hook
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<bool, Failure> + Send + Sync + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    /// Set the post-invoke hook
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&Invocation<'_>, SuperOutcome) -> Result<Value, Failure> + Send + Sync + 'static,
    {
        self.after = Some(Box::new(f));
        self
    }
}

impl Interceptor for Hooks {
    fn pre_invoke(&self, invocation: &Invocation<'_>) -> Result<bool, Failure> {
        match &self.before {
            Some(f) => f(invocation),
            None => Ok(true),
        }
    }

    fn post_invoke(&self, invocation: &Invocation<'_>, outcome: SuperOutcome) -> Result<Value, Failure> {
        match &self.after {
            Some(f) => f(invocation, outcome),
            None => outcome.resume(),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veneer_sdk::{MethodSignature, Receiver};

    #[test]
    fn test_fixed_value_skips() {
        let sig = MethodSignature::new("get", Receiver::Shared);
        let inv = Invocation::new(&(), &sig, &[], "T$$Proxy$$0");
        let fixed = FixedValue::new("cached");
        assert!(!fixed.pre_invoke(&inv).unwrap());
        assert_eq!(
            fixed.post_invoke(&inv, SuperOutcome::NotInvoked).unwrap(),
            Value::Str("cached".to_string())
        );
    }

    #[test]
    fn test_hooks_defaults() {
        let sig = MethodSignature::new("get", Receiver::Shared);
        let inv = Invocation::new(&(), &sig, &[], "T$$Proxy$$0");
        let hooks = Hooks::new().before(|call| Ok(call.method_name() != "get"));
        assert!(!hooks.pre_invoke(&inv).unwrap());
        assert_eq!(
            hooks.post_invoke(&inv, SuperOutcome::Returned(Value::Int(2))).unwrap(),
            Value::Int(2)
        );
        assert_eq!(format!("{:?}", hooks), "Hooks { before: true, after: false }");
    }
}
