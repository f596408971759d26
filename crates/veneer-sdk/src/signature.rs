//! Method signatures and type descriptors
//!
//! A `MethodSignature` is the unit of interception eligibility. Signatures are
//! produced at build time by `#[proxyable]` (or by hand) and never change
//! afterwards.

use std::fmt;

use crate::value::Value;

/// Descriptor of a parameter or return type as seen through the value boundary
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// `()`
    Unit,
    /// `bool`
    Bool,
    /// Signed integer type (name, e.g. "i32")
    Int(&'static str),
    /// Unsigned integer type (name, e.g. "usize")
    UInt(&'static str),
    /// Floating point type (name, e.g. "f64")
    Float(&'static str),
    /// `String`
    Str,
    /// `Vec<T>`
    List(Box<TypeDesc>),
    /// `Option<T>`
    Optional(Box<TypeDesc>),
    /// User type carried as an opaque object (full type name)
    Object(&'static str),
    /// `Value` itself: accepts anything
    Value,
    /// Type that cannot cross the value boundary (source spelling)
    Unrepresentable(&'static str),
    /// Type of a method that is only ever called directly, never converted
    /// (source spelling)
    Native(&'static str),
}

impl TypeDesc {
    /// Check if a value has a shape this type can decode.
    ///
    /// Numeric range is not checked here; decoding reports out-of-range values.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeDesc::Value, _) => true,
            (TypeDesc::Unit, Value::Null) => true,
            (TypeDesc::Bool, Value::Bool(_)) => true,
            (TypeDesc::Int(_), Value::Int(_) | Value::UInt(_)) => true,
            (TypeDesc::UInt(_), Value::UInt(_) | Value::Int(_)) => true,
            (TypeDesc::Float(_), Value::Float(_) | Value::Int(_) | Value::UInt(_)) => true,
            (TypeDesc::Str, Value::Str(_)) => true,
            (TypeDesc::List(inner), Value::List(items)) => items.iter().all(|v| inner.accepts(v)),
            (TypeDesc::Optional(_), Value::Null) => true,
            (TypeDesc::Optional(inner), v) => inner.accepts(v),
            (TypeDesc::Object(name), Value::Object(obj)) => obj.type_name() == *name,
            _ => false,
        }
    }

    /// Check if the type can cross the value boundary
    pub fn is_representable(&self) -> bool {
        match self {
            TypeDesc::Unrepresentable(_) | TypeDesc::Native(_) => false,
            TypeDesc::List(inner) | TypeDesc::Optional(inner) => inner.is_representable(),
            _ => true,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Unit => f.write_str("()"),
            TypeDesc::Bool => f.write_str("bool"),
            TypeDesc::Int(name) | TypeDesc::UInt(name) | TypeDesc::Float(name) => f.write_str(name),
            TypeDesc::Str => f.write_str("String"),
            TypeDesc::List(inner) => write!(f, "Vec<{}>", inner),
            TypeDesc::Optional(inner) => write!(f, "Option<{}>", inner),
            TypeDesc::Object(name) => f.write_str(name),
            TypeDesc::Value => f.write_str("Value"),
            TypeDesc::Unrepresentable(spelling) | TypeDesc::Native(spelling) => f.write_str(spelling),
        }
    }
}

/// How a method receives its instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// No receiver: associated (static) function
    Static,
    /// `&self`
    Shared,
    /// `&mut self`
    Exclusive,
    /// `self`, `mut self` or a typed `self: ...` receiver
    Owned,
}

/// Declared visibility of a method or constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// `pub`
    Public,
    /// `pub(crate)`, `pub(super)`, `pub(in ...)`
    Restricted,
    /// No visibility modifier
    Private,
}

impl Visibility {
    /// Public or restricted
    pub fn is_accessible(self) -> bool {
        !matches!(self, Visibility::Private)
    }
}

/// Parameter descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamDesc {
    /// Parameter name (or `_N` for patterns)
    pub name: &'static str,
    /// Parameter type
    pub ty: TypeDesc,
}

/// Signature of a declared method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Method name
    pub name: &'static str,
    /// Parameters in order (receiver excluded)
    pub params: Vec<ParamDesc>,
    /// Return type (`Ok` type for fallible methods)
    pub returns: TypeDesc,
    /// Declared error type of a `Result`-returning method
    pub failure: Option<&'static str>,
    /// Receiver kind
    pub receiver: Receiver,
    /// Declared visibility
    pub visibility: Visibility,
    /// Method is marked final and is never intercepted
    pub is_final: bool,
}

impl MethodSignature {
    /// Create a public, non-final signature with no parameters returning `()`
    pub fn new(name: &'static str, receiver: Receiver) -> Self {
        Self {
            name,
            params: Vec::new(),
            returns: TypeDesc::Unit,
            failure: None,
            receiver,
            visibility: Visibility::Public,
            is_final: false,
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, name: &'static str, ty: TypeDesc) -> Self {
        self.params.push(ParamDesc { name, ty });
        self
    }

    /// Set return type
    pub fn returns(mut self, ty: TypeDesc) -> Self {
        self.returns = ty;
        self
    }

    /// Declare the error type of a fallible method
    pub fn fails_with(mut self, error_type: &'static str) -> Self {
        self.failure = Some(error_type);
        self
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as final
    pub fn as_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Check if this is an associated (static) function
    pub fn is_static(&self) -> bool {
        self.receiver == Receiver::Static
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Why the signature cannot be routed through values, if it cannot
    pub fn unrepresentable_reason(&self) -> Option<String> {
        if self.receiver == Receiver::Owned {
            return Some("consuming receiver cannot be shared with the proxy".to_string());
        }
        if let Some(param) = self.params.iter().find(|p| !p.ty.is_representable()) {
            return Some(format!(
                "parameter `{}` has unrepresentable type `{}`",
                param.name, param.ty
            ));
        }
        if !self.returns.is_representable() {
            return Some(format!("unrepresentable return type `{}`", self.returns));
        }
        None
    }

    /// Check if arguments match this signature's parameters
    pub fn accepts_args(&self, args: &[Value]) -> bool {
        args.len() == self.params.len()
            && self.params.iter().zip(args).all(|(p, a)| p.ty.accepts(a))
    }

    /// Same parameters, return type, failure type and receiver
    pub fn same_shape(&self, other: &MethodSignature) -> bool {
        self.params.iter().map(|p| &p.ty).eq(other.params.iter().map(|p| &p.ty))
            && self.returns == other.returns
            && self.failure == other.failure
            && self.receiver == other.receiver
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}(", self.name)?;
        let mut first = true;
        let receiver = match self.receiver {
            Receiver::Static => None,
            Receiver::Shared => Some("&self"),
            Receiver::Exclusive => Some("&mut self"),
            Receiver::Owned => Some("self"),
        };
        if let Some(r) = receiver {
            f.write_str(r)?;
            first = false;
        }
        for param in &self.params {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", param.name, param.ty)?;
            first = false;
        }
        f.write_str(")")?;
        match (self.failure, &self.returns) {
            (Some(err), ret) => write!(f, " -> Result<{}, {}>", ret, err),
            (None, TypeDesc::Unit) => Ok(()),
            (None, ret) => write!(f, " -> {}", ret),
        }
    }
}
