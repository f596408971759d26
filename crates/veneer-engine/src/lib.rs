//! Veneer Engine - dynamic proxies for Rust types
//!
//! Pipeline of a proxy request:
//!
//! ```text
//! #[proxyable] surface ─▶ descriptor ─▶ cache ─(miss)─▶ synth
//!                                          │
//!                                          ▼
//!                                      factory ─▶ ProxyInstance ─▶ dispatch ─▶ Interceptor
//! ```
//!
//! # Example
//!
//! ```ignore
//! use veneer_engine::{new_proxy, proxyable, interceptors::PassThrough};
//!
//! pub struct Bag { items: Vec<String> }
//!
//! #[proxyable]
//! impl Bag {
//!     pub fn new() -> Self { Bag { items: Vec::new() } }
//!     pub fn add(&mut self, item: String) -> bool { self.items.push(item); true }
//! }
//!
//! let mut bag = new_proxy::<Bag, _>(PassThrough, vec![])?;
//! assert!(bag.add("TEST".to_string()));
//! ```

#![warn(missing_docs)]

// Generated code names this crate by its absolute path
extern crate self as veneer_engine;

pub mod cache;
pub mod config;
pub mod decl;
pub mod descriptor;
pub mod dispatch;
mod enhancer;
mod error;
pub mod factory;
#[doc(hidden)]
pub mod glue;
mod instance;
pub mod interceptors;
pub mod synth;

pub use cache::{CacheStats, ProxyCache, ProxyKey};
pub use config::{MethodFilter, ProxyOptions};
pub use decl::{ConstructorDecl, MethodDecl, Proxyable, SuperFn, TypeDecl};
pub use descriptor::{describe, MethodSlot, TargetType};
pub use dispatch::DispatchError;
pub use enhancer::{new_proxy, Enhancer};
pub use error::{ProxyError, ProxyResult};
pub use instance::ProxyInstance;
pub use synth::{CapabilitySignature, GeneratedProxyType, Route};

pub use veneer_macros::proxyable;
pub use veneer_sdk::{
    object_value, ConversionError, Failure, FromValue, Interceptor, Invocation, Message,
    MethodSignature, ObjectRef, PanicPayload, ParamDesc, Receiver, SuperOutcome, ToValue, TypeDesc,
    Value, ValueType, Visibility,
};
