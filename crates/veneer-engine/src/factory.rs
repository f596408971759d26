//! Instance factory
//!
//! Creates proxy instances of a generated type. The target state comes from
//! one of the type's declared constructors, from a caller-supplied value
//! (decorate), or from `Default` when constructors are bypassed.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use veneer_sdk::{Interceptor, Value};

use crate::decl::Proxyable;
use crate::error::ProxyError;
use crate::instance::ProxyInstance;
use crate::synth::GeneratedProxyType;

fn construction_error(type_name: &str, reason: impl Into<String>) -> ProxyError {
    ProxyError::Construction {
        type_name: type_name.to_string(),
        reason: reason.into(),
    }
}

/// Run the first accessible constructor that accepts `args`
pub fn construct<T: Proxyable, I: Interceptor>(
    proxy_type: &GeneratedProxyType<T, I>,
    args: Vec<Value>,
) -> Result<T, ProxyError> {
    let type_name = proxy_type.target_name();
    let selected = proxy_type
        .constructors()
        .iter()
        .filter(|c| c.visibility.is_accessible())
        .find_map(|c| match c.build_fn() {
            Some(build) if c.accepts(&args) => Some((c.name, build)),
            _ => None,
        });

    let (name, build) = selected.ok_or_else(|| {
        let got: Vec<&str> = args.iter().map(Value::type_name).collect();
        construction_error(
            type_name,
            format!("no accessible constructor accepts ({})", got.join(", ")),
        )
    })?;

    match catch_unwind(AssertUnwindSafe(|| build(&args))) {
        Ok(Ok(target)) => Ok(target),
        Ok(Err(failure)) => Err(construction_error(
            type_name,
            format!("constructor '{}' failed: {}", name, failure),
        )),
        Err(payload) => {
            let failure = veneer_sdk::Failure::from_panic(payload);
            Err(construction_error(
                type_name,
                format!("constructor '{}' {}", name, failure),
            ))
        }
    }
}

/// Create an instance through a declared constructor
pub fn instantiate<T: Proxyable, I: Interceptor>(
    proxy_type: Arc<GeneratedProxyType<T, I>>,
    interceptor: Arc<I>,
    args: Vec<Value>,
) -> Result<ProxyInstance<T, I>, ProxyError> {
    let target = construct(&proxy_type, args)?;
    Ok(ProxyInstance::from_parts(target, interceptor, proxy_type))
}

/// Wrap an already constructed target
pub fn decorate<T: Proxyable, I: Interceptor>(
    proxy_type: Arc<GeneratedProxyType<T, I>>,
    target: T,
    interceptor: Arc<I>,
) -> ProxyInstance<T, I> {
    ProxyInstance::from_parts(target, interceptor, proxy_type)
}

/// Create an instance from `T::default()` without running any declared
/// constructor.
///
/// Invariants a type establishes only in its constructors do not hold for
/// such an instance.
pub fn instantiate_bypassing<T: Proxyable + Default, I: Interceptor>(
    proxy_type: Arc<GeneratedProxyType<T, I>>,
    interceptor: Arc<I>,
) -> ProxyInstance<T, I> {
    ProxyInstance::from_parts(T::default(), interceptor, proxy_type)
}
