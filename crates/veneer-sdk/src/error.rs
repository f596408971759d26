//! Error types shared by interceptors and generated proxies

use std::any::Any;
use std::error::Error;
use std::fmt;

use parking_lot::Mutex;

/// A failure travelling through an intercepted call.
///
/// This is the "thrown" half of a call: either an error value raised by the
/// original method (its declared `Err`), by an interceptor hook, or a panic
/// captured while running the original method.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// An error value; the concrete type is preserved and recoverable by downcast
    #[error(transparent)]
    Raised(Box<dyn Error + Send + Sync + 'static>),

    /// A panic captured from the original method
    #[error("panicked: {0}")]
    Panicked(PanicPayload),
}

impl Failure {
    /// Raise an error value
    pub fn raise<E: Error + Send + Sync + 'static>(error: E) -> Self {
        Failure::Raised(Box::new(error))
    }

    /// Raise a plain message
    pub fn msg(message: impl Into<String>) -> Self {
        Failure::raise(Message(message.into()))
    }

    /// Wrap a panic payload obtained from `catch_unwind`
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Failure::Panicked(PanicPayload::new(payload))
    }

    /// Check if this failure is a captured panic
    pub fn is_panic(&self) -> bool {
        matches!(self, Failure::Panicked(_))
    }

    /// Check if the raised error is an `E`
    pub fn is<E: Error + 'static>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }

    /// Borrow the raised error as an `E`
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        match self {
            Failure::Raised(err) => err.downcast_ref::<E>(),
            Failure::Panicked(_) => None,
        }
    }

    /// Take the raised error as an `E`, or give the failure back unchanged
    pub fn downcast<E: Error + 'static>(self) -> Result<E, Self> {
        match self {
            Failure::Raised(err) => match err.downcast::<E>() {
                Ok(e) => Ok(*e),
                Err(err) => Err(Failure::Raised(err)),
            },
            other => Err(other),
        }
    }

    /// Take the panic payload so the panic can be resumed unchanged
    pub fn into_panic_payload(self) -> Result<Box<dyn Any + Send>, Self> {
        match self {
            Failure::Panicked(payload) => Ok(payload.into_inner()),
            other => Err(other),
        }
    }
}

/// Message-only error raised through [`Failure::msg`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct Message(pub String);

/// Panic payload captured by the dispatch runtime.
///
/// The payload itself is `Send` but not `Sync`; it is kept behind a mutex so
/// `Failure` can travel inside `Send + Sync` error types.
pub struct PanicPayload {
    message: String,
    payload: Mutex<Box<dyn Any + Send>>,
}

impl PanicPayload {
    /// Capture a payload, extracting its message when it is a string
    pub fn new(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        Self {
            message,
            payload: Mutex::new(payload),
        }
    }

    /// Panic message (or "Unknown panic" for non-string payloads)
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Take the original payload
    pub fn into_inner(self) -> Box<dyn Any + Send> {
        self.payload.into_inner()
    }
}

impl fmt::Debug for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicPayload")
            .field("message", &self.message)
            .finish()
    }
}

impl fmt::Display for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Value conversion errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Value has a different shape than the target type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: &'static str,
        /// Actual value type name
        got: &'static str,
    },

    /// Numeric value does not fit the target type
    #[error("Value {value} is out of range for {target}")]
    OutOfRange {
        /// Target type name
        target: &'static str,
        /// Offending value, rendered
        value: String,
    },
}

impl ConversionError {
    /// Build a mismatch error for a value
    pub fn mismatch(expected: &'static str, got: &crate::Value) -> Self {
        ConversionError::TypeMismatch {
            expected,
            got: got.type_name(),
        }
    }
}
