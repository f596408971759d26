//! Proxy type cache tests: identity, keying and single synthesis under
//! concurrent first requests.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use common::*;
use veneer_engine::interceptors::{FixedValue, Hooks, PassThrough};
use veneer_engine::{
    new_proxy, ConstructorDecl, Enhancer, MethodDecl, MethodSignature, ProxyCache, Proxyable,
    Receiver, TypeDecl, TypeDesc, Value,
};

static DESCRIBE_CALLS: AtomicUsize = AtomicUsize::new(0);

/// Declares itself slowly so concurrent first requests overlap
struct Slow;

impl Proxyable for Slow {
    fn declared_type() -> TypeDecl<Self> {
        DESCRIBE_CALLS.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        TypeDecl::new("cache_tests::Slow", "Slow")
            .constructor(ConstructorDecl::new("new", |_| Ok(Slow)))
            .method(MethodDecl::shared(
                MethodSignature::new("ping", Receiver::Shared).returns(TypeDesc::Bool),
                |_, _| Ok(Value::Bool(true)),
            ))
    }
}

// ============================================================================
// Identity
// ============================================================================

#[test]
fn test_same_request_same_type() {
    let a = new_proxy::<Collection, _>(PassThrough, vec![]).unwrap();
    let b = new_proxy::<Collection, _>(PassThrough, vec![]).unwrap();
    assert!(Arc::ptr_eq(a.proxy_type(), b.proxy_type()));
    assert!(ProxyCache::global().contains::<Collection, PassThrough>(&Default::default()));
}

#[test]
fn test_interceptor_type_is_part_of_key() {
    let cache = ProxyCache::new();
    let enhancer = Enhancer::<Collection>::new().cache(&cache);
    let pass = enhancer.proxy_type::<PassThrough>().unwrap();
    let fixed = enhancer.proxy_type::<FixedValue>().unwrap();
    let hooks = enhancer.proxy_type::<Hooks>().unwrap();

    assert_ne!(pass.name(), fixed.name());
    assert_ne!(fixed.name(), hooks.name());
    assert_ne!(pass.capability(), fixed.capability());
    assert_eq!(pass.target_type_id(), fixed.target_type_id());
    assert_eq!(cache.len(), 3);
}

#[test]
fn test_options_are_part_of_key() {
    let cache = ProxyCache::new();
    let all = Enhancer::<Collection>::new()
        .cache(&cache)
        .proxy_type::<PassThrough>()
        .unwrap();
    let some = Enhancer::<Collection>::new()
        .skip("clear")
        .cache(&cache)
        .proxy_type::<PassThrough>()
        .unwrap();
    let again = Enhancer::<Collection>::new()
        .skip("clear")
        .cache(&cache)
        .proxy_type::<PassThrough>()
        .unwrap();

    assert!(!Arc::ptr_eq(&all, &some));
    assert!(Arc::ptr_eq(&some, &again));
    assert!(all.is_intercepted("clear"));
    assert!(!some.is_intercepted("clear"));
    assert_eq!(all.slot_count(), some.slot_count() + 1);
}

#[test]
fn test_generated_names_are_unique() {
    let cache = ProxyCache::new();
    let first = Enhancer::<Collection>::new()
        .cache(&cache)
        .proxy_type::<PassThrough>()
        .unwrap();
    cache.clear();
    let second = Enhancer::<Collection>::new()
        .cache(&cache)
        .proxy_type::<PassThrough>()
        .unwrap();
    assert!(first.name().starts_with("Collection$$Proxy$$"));
    assert_ne!(first.name(), second.name());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_first_requests_synthesize_once() {
    const THREADS: usize = 16;
    let cache = ProxyCache::new();
    let barrier = Barrier::new(THREADS);

    let types: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    Enhancer::<Slow>::new()
                        .cache(&cache)
                        .proxy_type::<PassThrough>()
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(DESCRIBE_CALLS.load(Ordering::SeqCst), 1);
    assert!(types.iter().all(|t| Arc::ptr_eq(t, &types[0])));
    let stats = cache.stats();
    assert_eq!(stats.syntheses, 1);
    assert_eq!(stats.hits, (THREADS - 1) as u64);
}

#[test]
fn test_proxies_used_across_threads() {
    let recording = Arc::new(Recording::proceeding());
    let enhancer = Enhancer::<Collection>::new();

    thread::scope(|s| {
        for t in 0..4 {
            let recording = Arc::clone(&recording);
            let enhancer = &enhancer;
            s.spawn(move || {
                let mut proxy = enhancer.create(recording, vec![]).unwrap();
                for i in 0..10 {
                    proxy.add(format!("{}-{}", t, i));
                }
                assert_eq!(proxy.size(), 10);
            });
        }
    });

    // 4 threads * (10 adds + 1 size) * (pre + post)
    assert_eq!(recording.events().len(), 88);
}

// ============================================================================
// Purging
// ============================================================================

#[test]
fn test_purge_keeps_types_in_use() {
    let cache = ProxyCache::new();
    let live = Enhancer::<Collection>::new()
        .cache(&cache)
        .create(Arc::new(PassThrough), vec![])
        .unwrap();
    drop(
        Enhancer::<Account>::new()
            .cache(&cache)
            .proxy_type::<PassThrough>()
            .unwrap(),
    );
    assert_eq!(cache.len(), 2);

    assert_eq!(cache.purge_unused(), 1);
    assert!(cache.contains::<Collection, PassThrough>(&Default::default()));
    assert!(!cache.contains::<Account, PassThrough>(&Default::default()));

    drop(live);
    assert_eq!(cache.purge_unused(), 1);
    assert!(cache.is_empty());
}

#[test]
fn test_clear_leaves_live_instances_working() {
    let cache = ProxyCache::new();
    let mut proxy = Enhancer::<Collection>::new()
        .cache(&cache)
        .create(Arc::new(PassThrough), vec![])
        .unwrap();
    cache.clear();
    assert!(cache.is_empty());
    assert!(proxy.add("still".to_string()));
    assert_eq!(proxy.size(), 1);
}
