//! Veneer SDK - Interception contract for Veneer proxies
//!
//! This crate provides the types an interception policy needs without
//! depending on the full veneer-engine: the dynamically typed [`Value`],
//! conversions, [`Failure`], method signatures and the [`Interceptor`] trait.
//!
//! # Example
//!
//! ```ignore
//! use veneer_sdk::{Failure, Interceptor, Invocation, SuperOutcome, Value};
//!
//! struct Audit;
//!
//! impl Interceptor for Audit {
//!     fn pre_invoke(&self, call: &Invocation<'_>) -> Result<bool, Failure> {
//!         println!("-> {}", call.method());
//!         Ok(true)
//!     }
//!
//!     fn post_invoke(&self, call: &Invocation<'_>, outcome: SuperOutcome) -> Result<Value, Failure> {
//!         println!("<- {} ({})", call.method_name(), outcome.kind());
//!         outcome.resume()
//!     }
//! }
//! ```

#![warn(missing_docs)]

mod convert;
mod error;
mod interceptor;
mod signature;
mod value;

pub use convert::{FromValue, ToValue, ValueType};
pub use error::{ConversionError, Failure, Message, PanicPayload};
pub use interceptor::{Interceptor, Invocation, SuperOutcome};
pub use signature::{MethodSignature, ParamDesc, Receiver, TypeDesc, Visibility};
pub use value::{ObjectRef, Value};
