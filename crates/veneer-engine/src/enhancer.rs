//! Enhancer - the proxy creation entry point
//!
//! ```ignore
//! let bag = Enhancer::<Bag>::new()
//!     .skip("clear")
//!     .create(Arc::new(Audit::default()), vec![])?;
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use veneer_sdk::{Interceptor, Value};

use crate::cache::ProxyCache;
use crate::config::{MethodFilter, ProxyOptions};
use crate::decl::Proxyable;
use crate::error::ProxyError;
use crate::factory;
use crate::instance::ProxyInstance;
use crate::synth::GeneratedProxyType;

/// Builder for proxies of `T`
pub struct Enhancer<'c, T> {
    options: ProxyOptions,
    cache: Option<&'c ProxyCache>,
    _target: PhantomData<fn() -> T>,
}

impl<T: Proxyable> Default for Enhancer<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'c, T: Proxyable> Enhancer<'c, T> {
    /// Default options and the global cache
    pub fn new() -> Self {
        Self {
            options: ProxyOptions::default(),
            cache: None,
            _target: PhantomData,
        }
    }

    /// Replace the eligibility filter
    pub fn filter(mut self, filter: MethodFilter) -> Self {
        self.options.filter = filter;
        self
    }

    /// Intercept only the named methods
    pub fn only<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.options.filter = self.options.filter.only(names);
        self
    }

    /// Never intercept the named method
    pub fn skip(mut self, name: impl Into<String>) -> Self {
        self.options.filter = self.options.filter.skip(name);
        self
    }

    /// Whether restricted-visibility methods are intercepted
    pub fn include_restricted(mut self, include: bool) -> Self {
        self.options.filter = self.options.filter.include_restricted(include);
        self
    }

    /// Capture panics of original methods as failures (default: on)
    pub fn catch_panics(mut self, catch: bool) -> Self {
        self.options.catch_panics = catch;
        self
    }

    /// Use `cache` instead of the global cache
    pub fn cache(mut self, cache: &'c ProxyCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Current options
    pub fn options(&self) -> &ProxyOptions {
        &self.options
    }

    fn cache_ref(&self) -> &ProxyCache {
        match self.cache {
            Some(cache) => cache,
            None => ProxyCache::global(),
        }
    }

    /// Generated type for interceptor type `I`, synthesized on first request
    pub fn proxy_type<I: Interceptor>(&self) -> Result<Arc<GeneratedProxyType<T, I>>, ProxyError> {
        self.cache_ref().get_or_create::<T, I>(&self.options)
    }

    /// Create a proxy through a declared constructor
    pub fn create<I: Interceptor>(
        &self,
        interceptor: Arc<I>,
        args: Vec<Value>,
    ) -> Result<ProxyInstance<T, I>, ProxyError> {
        let proxy_type = self.proxy_type::<I>()?;
        factory::instantiate(proxy_type, interceptor, args)
    }

    /// Proxy an existing value
    pub fn decorate<I: Interceptor>(
        &self,
        target: T,
        interceptor: Arc<I>,
    ) -> Result<ProxyInstance<T, I>, ProxyError> {
        let proxy_type = self.proxy_type::<I>()?;
        Ok(factory::decorate(proxy_type, target, interceptor))
    }

    /// Create a proxy from `T::default()` without running a declared
    /// constructor. See [`factory::instantiate_bypassing`].
    pub fn create_bypassing_constructors<I: Interceptor>(
        &self,
        interceptor: Arc<I>,
    ) -> Result<ProxyInstance<T, I>, ProxyError>
    where
        T: Default,
    {
        let proxy_type = self.proxy_type::<I>()?;
        Ok(factory::instantiate_bypassing(proxy_type, interceptor))
    }
}

impl<T> fmt::Debug for Enhancer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enhancer")
            .field("target", &std::any::type_name::<T>())
            .field("options", &self.options)
            .field("shared_cache", &self.cache.is_none())
            .finish()
    }
}

/// Create a proxy of `T` with default options and the global cache
pub fn new_proxy<T: Proxyable, I: Interceptor>(
    interceptor: I,
    args: Vec<Value>,
) -> Result<ProxyInstance<T, I>, ProxyError> {
    Enhancer::<T>::new().create(Arc::new(interceptor), args)
}
