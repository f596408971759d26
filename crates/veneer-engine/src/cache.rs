//! Proxy type cache
//!
//! Memoizes generated proxy types by (target type, interceptor type, options).
//! Lookup-or-create is single-flight: concurrent first requests for one key
//! block on a per-key cell until exactly one synthesis finishes, and all of
//! them observe the same `Arc`.
//!
//! A failed synthesis leaves its cell empty, so the next request for that key
//! synthesizes again.

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use veneer_sdk::Interceptor;

use crate::config::ProxyOptions;
use crate::decl::Proxyable;
use crate::descriptor::describe;
use crate::error::ProxyError;
use crate::synth::{synthesize, CapabilitySignature, GeneratedProxyType};

type ErasedType = Arc<dyn Any + Send + Sync>;
type Cell = Arc<OnceCell<ErasedType>>;

/// Cache key of a generated proxy type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyKey {
    target: TypeId,
    target_name: &'static str,
    capability: CapabilitySignature,
    options: ProxyOptions,
}

impl ProxyKey {
    /// Key for proxies of `T` bound to interceptor type `I`
    pub fn new<T: Proxyable, I: Interceptor>(options: ProxyOptions) -> Self {
        Self {
            target: TypeId::of::<T>(),
            target_name: std::any::type_name::<T>(),
            capability: CapabilitySignature::of::<I>(),
            options,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from the cache
    pub hits: u64,
    /// Successful syntheses
    pub syntheses: u64,
    /// Failed syntheses
    pub failures: u64,
    /// Current number of keys
    pub entries: usize,
}

/// Thread-safe cache of generated proxy types
pub struct ProxyCache {
    /// Key → once-initialized generated type
    entries: Mutex<FxHashMap<ProxyKey, Cell>>,
    hits: AtomicU64,
    syntheses: AtomicU64,
    failures: AtomicU64,
}

static GLOBAL: Lazy<ProxyCache> = Lazy::new(ProxyCache::new);

impl Default for ProxyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyCache {
    /// Create an empty cache
    pub fn new() -> Self {
        ProxyCache {
            entries: Mutex::new(FxHashMap::default()),
            hits: AtomicU64::new(0),
            syntheses: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Process-wide cache used unless a caller supplies its own
    pub fn global() -> &'static ProxyCache {
        &GLOBAL
    }

    /// Get the proxy type for `T` and `I`, synthesizing it on first request
    pub fn get_or_create<T: Proxyable, I: Interceptor>(
        &self,
        options: &ProxyOptions,
    ) -> Result<Arc<GeneratedProxyType<T, I>>, ProxyError> {
        let key = ProxyKey::new::<T, I>(options.clone());
        let erased = self.get_or_insert_with(key, || {
            let target = describe::<T>(&options.filter)?;
            let generated = synthesize::<T, I>(target, options.clone())?;
            Ok(Arc::new(generated) as ErasedType)
        })?;

        erased
            .downcast::<GeneratedProxyType<T, I>>()
            .map_err(|_| ProxyError::Generation {
                type_name: std::any::type_name::<T>().to_string(),
                method: String::new(),
                reason: "cached proxy type has an unexpected shape".to_string(),
            })
    }

    /// Look up `key`, running `synthesize` at most once across all threads
    pub fn get_or_insert_with<F>(&self, key: ProxyKey, synthesize: F) -> Result<ErasedType, ProxyError>
    where
        F: FnOnce() -> Result<ErasedType, ProxyError>,
    {
        // The map lock only covers fetching the cell
        let cell = {
            let mut entries = self.entries.lock();
            entries.entry(key.clone()).or_default().clone()
        };

        if let Some(found) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(target: "veneer::cache", target_type = key.target_name, "cache hit");
            return Ok(found.clone());
        }

        let mut ran = false;
        let result = cell.get_or_try_init(|| {
            ran = true;
            tracing::debug!(target: "veneer::cache", target_type = key.target_name, "cache miss");
            let outcome = synthesize();
            match &outcome {
                Ok(_) => self.syntheses.fetch_add(1, Ordering::Relaxed),
                Err(_) => self.failures.fetch_add(1, Ordering::Relaxed),
            };
            outcome
        });

        match result {
            Ok(found) => {
                if !ran {
                    // Another thread finished the synthesis while we waited
                    self.hits.fetch_add(1, Ordering::Relaxed);
                }
                Ok(found.clone())
            }
            Err(e) => Err(e),
        }
    }

    /// Check if a proxy type for `T` and `I` is cached
    pub fn contains<T: Proxyable, I: Interceptor>(&self, options: &ProxyOptions) -> bool {
        let key = ProxyKey::new::<T, I>(options.clone());
        self.entries
            .lock()
            .get(&key)
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Remove entries that nothing outside the cache references.
    ///
    /// Types still used by live proxy instances (or held by callers) stay.
    /// Returns the number of removed entries.
    pub fn purge_unused(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, cell| {
            // A cell cloned by an in-flight request is kept
            Arc::strong_count(cell) > 1
                || cell.get().is_some_and(|ty| Arc::strong_count(ty) > 1)
        });
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(target: "veneer::cache", removed, remaining = entries.len(), "purged unused proxy types");
        }
        removed
    }

    /// Drop every entry; live instances keep their own types
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached keys (including keys whose synthesis failed)
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            syntheses: self.syntheses.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MethodFilter;
    use crate::decl::{ConstructorDecl, MethodDecl, TypeDecl};
    use std::sync::atomic::AtomicUsize;
    use veneer_sdk::{MethodSignature, Receiver, TypeDesc, Value};

    struct Noop;
    impl Interceptor for Noop {}

    struct Other;
    impl Interceptor for Other {}

    struct Meter(u32);

    impl Proxyable for Meter {
        fn declared_type() -> TypeDecl<Self> {
            TypeDecl::new("tests::Meter", "Meter")
                .constructor(ConstructorDecl::new("new", |_| Ok(Meter(0))))
                .method(MethodDecl::shared(
                    MethodSignature::new("read", Receiver::Shared).returns(TypeDesc::UInt("u32")),
                    |this, _| Ok(Value::UInt(this.0 as u64)),
                ))
        }
    }

    struct Sealed;

    impl Proxyable for Sealed {
        fn declared_type() -> TypeDecl<Self> {
            TypeDecl::new("tests::Sealed", "Sealed")
                .sealed()
                .constructor(ConstructorDecl::new("new", |_| Ok(Sealed)))
        }
    }

    #[test]
    fn test_same_key_same_type() {
        let cache = ProxyCache::new();
        let options = ProxyOptions::default();
        let a = cache.get_or_create::<Meter, Noop>(&options).unwrap();
        let b = cache.get_or_create::<Meter, Noop>(&options).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let stats = cache.stats();
        assert_eq!(stats.syntheses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_key_components() {
        let cache = ProxyCache::new();
        let default = ProxyOptions::default();
        let filtered = ProxyOptions::new().with_filter(MethodFilter::new().skip("read"));

        let a = cache.get_or_create::<Meter, Noop>(&default).unwrap();
        let b = cache.get_or_create::<Meter, Other>(&default).unwrap();
        let c = cache.get_or_create::<Meter, Noop>(&filtered).unwrap();

        assert_ne!(a.name(), b.name());
        assert_ne!(a.name(), c.name());
        assert_eq!(c.slot_count(), 0);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_failure_not_cached() {
        let cache = ProxyCache::new();
        let options = ProxyOptions::default();
        assert!(cache.get_or_create::<Sealed, Noop>(&options).is_err());
        assert!(cache.get_or_create::<Sealed, Noop>(&options).is_err());
        assert!(!cache.contains::<Sealed, Noop>(&options));
        assert_eq!(cache.stats().failures, 2);
    }

    #[test]
    fn test_single_flight_closure() {
        let cache = ProxyCache::new();
        let calls = AtomicUsize::new(0);
        let key = ProxyKey::new::<Meter, Noop>(ProxyOptions::default());

        for _ in 0..3 {
            cache
                .get_or_insert_with(key.clone(), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(7u8) as ErasedType)
                })
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_purge_keeps_live_types() {
        let cache = ProxyCache::new();
        let options = ProxyOptions::default();
        let held = cache.get_or_create::<Meter, Noop>(&options).unwrap();
        cache.get_or_create::<Meter, Other>(&options).unwrap();

        assert_eq!(cache.purge_unused(), 1);
        assert!(cache.contains::<Meter, Noop>(&options));
        assert!(!cache.contains::<Meter, Other>(&options));

        drop(held);
        assert_eq!(cache.purge_unused(), 1);
        assert!(cache.is_empty());
    }
}
