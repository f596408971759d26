//! Declared surface of a proxyable type
//!
//! `#[proxyable]` emits a [`Proxyable`] impl built from these definitions.
//! They can also be written by hand:
//!
//! ```ignore
//! impl Proxyable for Counter {
//!     fn declared_type() -> TypeDecl<Self> {
//!         TypeDecl::new("app::Counter", "Counter")
//!             .constructor(ConstructorDecl::new("new", |_| Ok(Counter::default())))
//!             .method(MethodDecl::exclusive(
//!                 MethodSignature::new("bump", Receiver::Exclusive).returns(TypeDesc::UInt("u64")),
//!                 |this, _| Ok(Value::UInt(this.bump())),
//!             ))
//!     }
//! }
//! ```

use std::fmt;

use veneer_sdk::{Failure, MethodSignature, ParamDesc, TypeDesc, Value, Visibility};

/// A type whose declared surface can be proxied
pub trait Proxyable: Sized + 'static {
    /// Constructors and methods, in declaration order
    fn declared_type() -> TypeDecl<Self>;
}

/// Direct call of an original method, bypassing any proxy
pub enum SuperFn<T> {
    /// `&self` method
    Shared(fn(&T, &[Value]) -> Result<Value, Failure>),
    /// `&mut self` method
    Exclusive(fn(&mut T, &[Value]) -> Result<Value, Failure>),
}

impl<T> Clone for SuperFn<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SuperFn<T> {}

impl<T> fmt::Debug for SuperFn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuperFn::Shared(_) => f.write_str("SuperFn::Shared"),
            SuperFn::Exclusive(_) => f.write_str("SuperFn::Exclusive"),
        }
    }
}

/// Constructor thunk: decodes arguments and runs the original constructor
pub type BuildFn<T> = fn(&[Value]) -> Result<T, Failure>;

/// Definition of a constructor
pub struct ConstructorDecl<T> {
    /// Constructor name
    pub name: &'static str,
    /// Parameters in order
    pub params: Vec<ParamDesc>,
    /// Declared visibility
    pub visibility: Visibility,
    build: Option<BuildFn<T>>,
}

impl<T> ConstructorDecl<T> {
    /// Create a public constructor with no parameters
    pub fn new(name: &'static str, build: BuildFn<T>) -> Self {
        Self {
            name,
            params: Vec::new(),
            visibility: Visibility::Public,
            build: Some(build),
        }
    }

    /// Constructor that cannot be called through values
    pub fn opaque(name: &'static str) -> Self {
        Self {
            name,
            params: Vec::new(),
            visibility: Visibility::Public,
            build: None,
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, name: &'static str, ty: TypeDesc) -> Self {
        self.params.push(ParamDesc { name, ty });
        self
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Check if arguments match arity and parameter types
    pub fn accepts(&self, args: &[Value]) -> bool {
        args.len() == self.params.len()
            && self.params.iter().zip(args).all(|(p, a)| p.ty.accepts(a))
    }

    /// The build thunk, if the constructor is callable through values
    pub fn build_fn(&self) -> Option<BuildFn<T>> {
        self.build
    }
}

impl<T> Clone for ConstructorDecl<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            params: self.params.clone(),
            visibility: self.visibility,
            build: self.build,
        }
    }
}

impl<T> fmt::Debug for ConstructorDecl<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDecl")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .field("callable", &self.build.is_some())
            .finish()
    }
}

/// Definition of a method
pub struct MethodDecl<T> {
    /// Method signature
    pub signature: MethodSignature,
    super_fn: Option<SuperFn<T>>,
}

impl<T> MethodDecl<T> {
    /// `&self` method with its direct implementation
    pub fn shared(signature: MethodSignature, f: fn(&T, &[Value]) -> Result<Value, Failure>) -> Self {
        Self {
            signature,
            super_fn: Some(SuperFn::Shared(f)),
        }
    }

    /// `&mut self` method with its direct implementation
    pub fn exclusive(
        signature: MethodSignature,
        f: fn(&mut T, &[Value]) -> Result<Value, Failure>,
    ) -> Self {
        Self {
            signature,
            super_fn: Some(SuperFn::Exclusive(f)),
        }
    }

    /// Method without a value-level implementation (static, generic or unrepresentable)
    pub fn opaque(signature: MethodSignature) -> Self {
        Self {
            signature,
            super_fn: None,
        }
    }

    /// Direct implementation, if any
    pub fn super_fn(&self) -> Option<SuperFn<T>> {
        self.super_fn
    }
}

impl<T> Clone for MethodDecl<T> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            super_fn: self.super_fn,
        }
    }
}

impl<T> fmt::Debug for MethodDecl<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("signature", &self.signature.to_string())
            .field("super_fn", &self.super_fn)
            .finish()
    }
}

/// Declared surface of a type
pub struct TypeDecl<T> {
    qualified_name: &'static str,
    simple_name: &'static str,
    sealed: bool,
    constructors: Vec<ConstructorDecl<T>>,
    methods: Vec<MethodDecl<T>>,
}

impl<T> TypeDecl<T> {
    /// Start a declaration
    pub fn new(qualified_name: &'static str, simple_name: &'static str) -> Self {
        Self {
            qualified_name,
            simple_name,
            sealed: false,
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Mark the type as final
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// Add a constructor
    pub fn constructor(mut self, constructor: ConstructorDecl<T>) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Add a method
    pub fn method(mut self, method: MethodDecl<T>) -> Self {
        self.methods.push(method);
        self
    }

    /// Qualified name
    pub fn qualified_name(&self) -> &'static str {
        self.qualified_name
    }

    /// Unqualified name
    pub fn simple_name(&self) -> &'static str {
        self.simple_name
    }

    /// Check if the type is final
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Declared constructors
    pub fn constructors(&self) -> &[ConstructorDecl<T>] {
        &self.constructors
    }

    /// Declared methods
    pub fn methods(&self) -> &[MethodDecl<T>] {
        &self.methods
    }

    pub(crate) fn into_parts(self) -> (Vec<ConstructorDecl<T>>, Vec<MethodDecl<T>>) {
        (self.constructors, self.methods)
    }
}

impl<T> fmt::Debug for TypeDecl<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDecl")
            .field("qualified_name", &self.qualified_name)
            .field("sealed", &self.sealed)
            .field("constructors", &self.constructors)
            .field("methods", &self.methods)
            .finish()
    }
}
