//! Proxy creation tests: constructor selection, extendability checks and
//! instance management.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::*;
use veneer_engine::interceptors::{FixedValue, PassThrough};
use veneer_engine::{
    new_proxy, proxyable, Enhancer, Interceptor, ProxyCache, ProxyError, ProxyOptions, Value,
};

pub struct Constant;

#[proxyable(sealed)]
impl Constant {
    pub fn new() -> Self {
        Constant
    }

    pub fn value(&self) -> u32 {
        7
    }
}

pub struct Hidden;

#[proxyable]
impl Hidden {
    fn create() -> Self {
        Hidden
    }

    pub fn ping(&self) -> bool {
        true
    }
}

pub struct Raw {
    bytes: Vec<u8>,
}

#[proxyable]
impl Raw {
    pub fn new() -> Self {
        Raw { bytes: vec![1, 2, 3] }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn view(&self) -> &[u8] {
        &self.bytes
    }
}

/// Helpers take types with no value conversions
#[derive(Default)]
pub struct Registry {
    counts: HashMap<String, u32>,
}

#[proxyable]
impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn count(&self) -> usize {
        self.counts.len()
    }

    pub fn register(&mut self, name: String) {
        self.merge(HashMap::from([(name, 1)]));
    }

    fn merge(&mut self, other: HashMap<String, u32>) {
        for (name, n) in other {
            *self.counts.entry(name).or_insert(0) += n;
        }
    }

    pub fn tally(entries: &HashMap<String, u32>) -> u32 {
        entries.values().sum()
    }

    #[proxy(final)]
    pub fn snapshot(&self) -> HashMap<String, u32> {
        self.counts.clone()
    }
}

fn collection_of(items: &[&str]) -> Vec<Value> {
    vec![Value::List(
        items.iter().map(|s| Value::Str(s.to_string())).collect(),
    )]
}

// ============================================================================
// Extendability
// ============================================================================

#[test]
fn test_sealed_type_rejected() {
    let err = new_proxy::<Constant, _>(PassThrough, vec![]).unwrap_err();
    match err {
        ProxyError::NotExtendable { type_name, reason } => {
            assert!(type_name.ends_with("Constant"));
            assert!(reason.contains("sealed"));
        }
        other => panic!("expected NotExtendable, got {:?}", other),
    }
}

#[test]
fn test_no_accessible_constructor_rejected() {
    let err = new_proxy::<Hidden, _>(PassThrough, vec![]).unwrap_err();
    assert!(matches!(err, ProxyError::NotExtendable { .. }));
    assert!(err.to_string().contains("constructor"));
}

#[test]
fn test_unrepresentable_method_rejected() {
    let err = new_proxy::<Raw, _>(PassThrough, vec![]).unwrap_err();
    match err {
        ProxyError::Generation { method, .. } => assert_eq!(method, "view"),
        other => panic!("expected Generation, got {:?}", other),
    }

    // excluding the method makes the type proxyable
    let cache = ProxyCache::new();
    let raw = Enhancer::<Raw>::new()
        .skip("view")
        .cache(&cache)
        .create(Arc::new(PassThrough), vec![])
        .unwrap();
    assert_eq!(raw.len(), 3);
    assert_eq!(raw.view(), &[1, 2, 3]);
}

#[test]
fn test_generation_failure_not_cached() {
    let cache = ProxyCache::new();
    for _ in 0..2 {
        let err = Enhancer::<Raw>::new()
            .cache(&cache)
            .proxy_type::<PassThrough>()
            .unwrap_err();
        assert!(matches!(err, ProxyError::Generation { .. }));
    }
    let stats = cache.stats();
    assert_eq!(stats.failures, 2);
    assert_eq!(stats.syntheses, 0);
    assert!(!cache.contains::<Raw, PassThrough>(&ProxyOptions::default()));
}

#[test]
fn test_helpers_with_native_types_are_proxyable() {
    let recording = Arc::new(Recording::proceeding());
    let mut registry = Enhancer::<Registry>::new()
        .create(Arc::clone(&recording), vec![])
        .unwrap();

    registry.register("a".to_string());
    registry.register("a".to_string());
    assert_eq!(registry.count(), 1);
    assert_eq!(registry.snapshot().get("a"), Some(&2));
    assert_eq!(Registry::tally(&registry.snapshot()), 2);
    assert_eq!(
        recording.events(),
        vec![
            "pre:register".to_string(),
            "post:register:returned".to_string(),
            "pre:register".to_string(),
            "post:register:returned".to_string(),
            "pre:count".to_string(),
            "post:count:returned".to_string(),
        ]
    );

    let ty = registry.proxy_type();
    assert_eq!(ty.slot_count(), 2);
    assert!(!ty.is_intercepted("merge"));
    assert!(!ty.is_intercepted("snapshot"));
    assert!(registry.invoke("merge", vec![]).is_err());
}

// ============================================================================
// Constructors
// ============================================================================

#[test]
fn test_constructor_selected_by_arguments() {
    let empty = new_proxy::<Collection, _>(PassThrough, vec![]).unwrap();
    assert_eq!(empty.size(), 0);

    let filled = new_proxy::<Collection, _>(PassThrough, collection_of(&["a", "b"])).unwrap();
    assert_eq!(filled.size(), 2);
    assert_eq!(filled.first(), Some("a".to_string()));
}

#[test]
fn test_construction_error() {
    let err = new_proxy::<Collection, _>(PassThrough, vec![Value::Int(1)]).unwrap_err();
    match err {
        ProxyError::Construction { reason, .. } => {
            assert!(reason.contains("no accessible constructor"));
            assert!(reason.contains("int"));
        }
        other => panic!("expected Construction, got {:?}", other),
    }
}

#[test]
fn test_construction_error_keeps_type_cached() {
    let cache = ProxyCache::new();
    let enhancer = Enhancer::<Account>::new().cache(&cache);
    assert!(enhancer.create(Arc::new(PassThrough), vec![]).is_err());
    assert!(cache.contains::<Account, PassThrough>(enhancer.options()));

    let account = enhancer
        .create(
            Arc::new(PassThrough),
            vec![Value::Str("ana".to_string()), Value::UInt(3)],
        )
        .unwrap();
    assert_eq!(account.balance(), 3);
}

// ============================================================================
// Instances
// ============================================================================

#[test]
fn test_decorate_existing_value() {
    let recording = Arc::new(Recording::proceeding());
    let mut proxy = Enhancer::<Collection>::new()
        .decorate(Collection::with_items(vec!["x".to_string()]), Arc::clone(&recording))
        .unwrap();
    assert_eq!(proxy.size(), 1);
    assert!(proxy.add("y".to_string()));
    assert_eq!(recording.events().len(), 4);

    let inner = proxy.into_target();
    assert_eq!(inner.size(), 2);
}

#[test]
fn test_decorate_and_create_share_type() {
    let cache = ProxyCache::new();
    let enhancer = Enhancer::<Collection>::new().cache(&cache);
    let created = enhancer.create(Arc::new(PassThrough), vec![]).unwrap();
    let decorated = enhancer
        .decorate(Collection::new(), Arc::new(PassThrough))
        .unwrap();
    assert!(Arc::ptr_eq(created.proxy_type(), decorated.proxy_type()));
}

#[test]
fn test_new_instance_shares_type() {
    let first = new_proxy::<Collection, _>(PassThrough, vec![]).unwrap();
    let second = first
        .new_instance(Arc::new(PassThrough), collection_of(&["z"]))
        .unwrap();
    assert!(Arc::ptr_eq(first.proxy_type(), second.proxy_type()));
    assert_eq!(second.size(), 1);
    assert_eq!(first.size(), 0);
}

#[test]
fn test_set_interceptor_rebinds() {
    let mut account = new_proxy::<Account, _>(
        FixedValue::new(1u64),
        vec![Value::Str("bo".to_string()), Value::UInt(50)],
    )
    .unwrap();
    assert_eq!(account.balance(), 1);

    let previous = account.set_interceptor(Arc::new(FixedValue::new(2u64)));
    assert_eq!(previous.value(), &Value::UInt(1));
    assert_eq!(account.balance(), 2);
    assert_eq!(account.target().balance(), 50);
}

#[test]
fn test_boxed_interceptors_share_one_type() {
    let cache = ProxyCache::new();
    let enhancer = Enhancer::<Account>::new().cache(&cache);
    let args = || vec![Value::Str("cy".to_string()), Value::UInt(10)];

    let policies: Vec<Box<dyn Interceptor>> = vec![
        Box::new(PassThrough),
        Box::new(FixedValue::new(99u64)),
    ];
    let accounts: Vec<_> = policies
        .into_iter()
        .map(|policy| enhancer.create(Arc::new(policy), args()).unwrap())
        .collect();

    assert!(Arc::ptr_eq(accounts[0].proxy_type(), accounts[1].proxy_type()));
    assert_eq!(accounts[0].balance(), 10);
    assert_eq!(accounts[1].balance(), 99);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_bypassing_constructors() {
    let recording = Arc::new(Recording::proceeding());
    let mut proxy = Enhancer::<Collection>::new()
        .create_bypassing_constructors(Arc::clone(&recording))
        .unwrap();
    assert_eq!(proxy.size(), 0);
    assert!(proxy.add("q".to_string()));
    assert_eq!(recording.events().len(), 4);
}

// ============================================================================
// Dynamic invocation
// ============================================================================

#[test]
fn test_invoke_by_name() {
    let mut proxy = new_proxy::<Collection, _>(PassThrough, vec![]).unwrap();
    assert_eq!(
        proxy
            .invoke("add", vec![Value::Str("a".to_string())])
            .unwrap(),
        Value::Bool(true)
    );
    assert_eq!(proxy.invoke("size", vec![]).unwrap(), Value::UInt(1));
    assert_eq!(
        proxy.invoke("get", vec![Value::UInt(0)]).unwrap(),
        Value::Str("a".to_string())
    );
}

#[test]
fn test_invoke_unknown_method() {
    let mut proxy = new_proxy::<Collection, _>(PassThrough, vec![]).unwrap();
    for name in ["missing", "dump"] {
        let err = proxy.invoke(name, vec![]).unwrap_err();
        assert!(matches!(err, ProxyError::NoSuchMethod { ref method, .. } if method == name));
    }
}

#[test]
fn test_invoke_static_method_unavailable() {
    let mut proxy = new_proxy::<Collection, _>(PassThrough, vec![]).unwrap();
    let err = proxy.invoke("kind", vec![]).unwrap_err();
    assert!(err.to_string().contains("kind"));
}

#[test]
fn test_invoke_invalid_arguments() {
    let mut proxy = new_proxy::<Collection, _>(PassThrough, vec![]).unwrap();
    let err = proxy.invoke("add", vec![Value::Int(3)]).unwrap_err();
    match err {
        ProxyError::InvalidArguments { method, expected, got } => {
            assert_eq!(method, "add");
            assert_eq!(got, "int");
            assert!(!expected.is_empty());
        }
        other => panic!("expected InvalidArguments, got {:?}", other),
    }
    assert!(proxy.invoke("add", vec![]).is_err());
    assert_eq!(proxy.target().size(), 0);
}

#[test]
fn test_object_values_cross_the_boundary() {
    let mut account = new_proxy::<Account, _>(
        PassThrough,
        vec![Value::Str("di".to_string()), Value::UInt(10)],
    )
    .unwrap();
    account.withdraw(4).unwrap();
    let receipt = account.invoke("last_receipt", vec![]).unwrap();
    assert_eq!(receipt.downcast_object::<Receipt>(), Some(&Receipt { amount: 4 }));
}
