//! Proxy engine errors

use veneer_sdk::Failure;

/// Errors reported by proxy creation and dynamic invocation
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Type is sealed or has no public or restricted constructor
    #[error("Type '{type_name}' cannot be proxied: {reason}")]
    NotExtendable {
        /// Qualified type name
        type_name: String,
        /// Why the type cannot be extended
        reason: String,
    },

    /// An eligible method could not be synthesized
    #[error("Cannot generate proxy method '{type_name}::{method}': {reason}")]
    Generation {
        /// Qualified type name
        type_name: String,
        /// Method name
        method: String,
        /// What makes the signature unsupported
        reason: String,
    },

    /// No matching constructor, or the constructor failed
    #[error("Cannot construct '{type_name}': {reason}")]
    Construction {
        /// Qualified type name
        type_name: String,
        /// Constructor selection or failure details
        reason: String,
    },

    /// The failure that ended an intercepted call
    #[error("Intercepted call failed: {0}")]
    InterceptorFailure(#[from] Failure),

    /// No callable instance method with that name
    #[error("No instance method '{method}' on '{type_name}'")]
    NoSuchMethod {
        /// Qualified type name
        type_name: String,
        /// Requested method name
        method: String,
    },

    /// Arguments do not match the method's parameters
    #[error("Invalid arguments for '{method}': expected ({expected}), got ({got})")]
    InvalidArguments {
        /// Method name
        method: String,
        /// Declared parameter types
        expected: String,
        /// Supplied value types
        got: String,
    },
}

impl ProxyError {
    /// Check if this error carries a failure of type `E`
    pub fn is_failure<E: std::error::Error + 'static>(&self) -> bool {
        matches!(self, ProxyError::InterceptorFailure(f) if f.is::<E>())
    }
}

/// Result alias for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;
