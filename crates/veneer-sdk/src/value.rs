//! Value: dynamically typed currency of intercepted calls
//!
//! Arguments and results cross the interception boundary as `Value`s so a
//! single `Interceptor` can observe every method of every proxied type.
//! Typed code converts at the edges with `ToValue` / `FromValue`.
//!
//! # Representation
//!
//! ```text
//! Null              unit, absent Option, "no value"
//! Bool / Int / UInt / Float
//! Str               owned UTF-8 string
//! List              ordered values (Vec<T>)
//! Object            shared opaque handle to a user type (Arc<dyn Any>)
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Dynamically typed argument or result value.
#[derive(Clone, Default)]
pub enum Value {
    /// Unit, `None`, or the absence of a value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer (any of i8..i64, isize)
    Int(i64),
    /// Unsigned integer (any of u8..u64, usize)
    UInt(u64),
    /// Floating point (f32 or f64)
    Float(f64),
    /// Owned string
    Str(String),
    /// Ordered list of values
    List(Vec<Value>),
    /// Opaque handle to a user-defined type
    Object(ObjectRef),
}

/// Shared handle to a user value carried inside [`Value::Object`].
///
/// Equality is identity: two handles are equal when they point at the same
/// allocation.
#[derive(Clone)]
pub struct ObjectRef {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    /// Wrap a value, recording its type name for signature checks.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// Type name recorded at construction
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the wrapped value if it is a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Check whether two handles share an allocation
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object<{}>@{:p}", self.type_name, Arc::as_ptr(&self.inner))
    }
}

impl Value {
    /// Wrap a user value as an opaque object
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Value::Object(ObjectRef::new(value))
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract a signed integer (unsigned values that fit are accepted)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Extract an unsigned integer (non-negative signed values are accepted)
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(u) => Some(*u),
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Extract a float, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }

    /// Borrow string contents
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow list elements
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the object handle
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the wrapped user value if this is an object holding a `T`
    pub fn downcast_object<T: Any>(&self) -> Option<&T> {
        self.as_object().and_then(|obj| obj.downcast_ref::<T>())
    }

    /// Get type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(obj) => obj.type_name(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::UInt(u) => write!(f, "UInt({})", u),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(obj) => write!(f, "{:?}", obj),
        }
    }
}
