//! Shared fixtures for the integration tests
#![allow(dead_code)]

use parking_lot::Mutex;
use veneer_engine::{proxyable, Failure, Interceptor, Invocation, SuperOutcome, Value};

// ============================================================================
// Collection
// ============================================================================

#[derive(Debug, Default)]
pub struct Collection {
    items: Vec<String>,
}

#[proxyable]
impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<String>) -> Self {
        Collection { items }
    }

    pub fn add(&mut self, item: String) -> bool {
        if self.items.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, index: usize) -> Option<String> {
        self.items.get(index).cloned()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[proxy(final)]
    pub fn first(&self) -> Option<String> {
        self.items.first().cloned()
    }

    #[proxy(final)]
    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }

    pub fn kind() -> String {
        "collection".to_string()
    }

    fn helper(&self) -> usize {
        self.items.len() * 2
    }

    #[proxy(skip)]
    pub fn dump(&self) -> String {
        self.items.join(",")
    }
}

// ============================================================================
// Account
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("insufficient funds: balance {balance}, requested {requested}")]
pub struct Insufficient {
    pub balance: u64,
    pub requested: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub amount: u64,
}

veneer_engine::object_value!(Receipt);

#[derive(Debug)]
pub struct Account {
    owner: String,
    balance: u64,
    receipts: Vec<Receipt>,
}

#[proxyable(wrapper = AccountOps)]
impl Account {
    pub fn open(owner: String, deposit: u64) -> Self {
        Account {
            owner,
            balance: deposit,
            receipts: Vec::new(),
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn deposit(&mut self, amount: u64) {
        self.balance += amount;
    }

    pub fn withdraw(&mut self, amount: u64) -> Result<u64, Insufficient> {
        if amount > self.balance {
            return Err(Insufficient {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        self.receipts.push(Receipt { amount });
        Ok(self.balance)
    }

    pub fn last_receipt(&self) -> Option<Receipt> {
        self.receipts.last().cloned()
    }

    pub fn explode(&self) -> u64 {
        panic!("kaboom")
    }

    #[proxy(final)]
    pub fn owner(&self) -> String {
        self.owner.clone()
    }

    pub(crate) fn audit(&self) -> bool {
        !self.owner.is_empty()
    }
}

// ============================================================================
// Interceptors
// ============================================================================

/// Records every hook call as `pre:<method>` / `post:<method>:<outcome>`
pub struct Recording {
    proceed: bool,
    fallback: Value,
    events: Mutex<Vec<String>>,
}

impl Recording {
    pub fn proceeding() -> Self {
        Recording {
            proceed: true,
            fallback: Value::Null,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn denying(fallback: Value) -> Self {
        Recording {
            proceed: false,
            fallback,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl Interceptor for Recording {
    fn pre_invoke(&self, call: &Invocation<'_>) -> Result<bool, Failure> {
        self.events.lock().push(format!("pre:{}", call.method_name()));
        Ok(self.proceed)
    }

    fn post_invoke(&self, call: &Invocation<'_>, outcome: SuperOutcome) -> Result<Value, Failure> {
        self.events
            .lock()
            .push(format!("post:{}:{}", call.method_name(), outcome.kind()));
        outcome.resume_or(self.fallback.clone())
    }
}
