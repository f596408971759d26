//! Proxy configuration
//!
//! Both types are part of the proxy type cache key, so two requests with equal
//! options share one generated type.

use std::collections::BTreeSet;

use veneer_sdk::{MethodSignature, Visibility};

/// Which eligible methods are intercepted.
///
/// Methods the filter rejects still run, directly and without interception.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodFilter {
    only: Option<BTreeSet<String>>,
    skip: BTreeSet<String>,
    include_restricted: bool,
}

impl Default for MethodFilter {
    fn default() -> Self {
        Self {
            only: None,
            skip: BTreeSet::new(),
            include_restricted: true,
        }
    }
}

impl MethodFilter {
    /// Accept every eligible method
    pub fn new() -> Self {
        Self::default()
    }

    /// Intercept only the named methods
    pub fn only<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.only
            .get_or_insert_with(BTreeSet::new)
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Never intercept the named method
    pub fn skip(mut self, name: impl Into<String>) -> Self {
        self.skip.insert(name.into());
        self
    }

    /// Whether `pub(crate)` / `pub(super)` methods are intercepted
    pub fn include_restricted(mut self, include: bool) -> Self {
        self.include_restricted = include;
        self
    }

    /// Check if an otherwise eligible method passes the filter
    pub fn admits(&self, signature: &MethodSignature) -> bool {
        if let Some(only) = &self.only {
            if !only.contains(signature.name) {
                return false;
            }
        }
        if self.skip.contains(signature.name) {
            return false;
        }
        self.include_restricted || signature.visibility != Visibility::Restricted
    }
}

/// Options of a proxy request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyOptions {
    /// Eligibility filter
    pub filter: MethodFilter,
    /// Capture panics of the original method as failures
    pub catch_panics: bool,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            filter: MethodFilter::default(),
            catch_panics: true,
        }
    }
}

impl ProxyOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the eligibility filter
    pub fn with_filter(mut self, filter: MethodFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set panic capture
    pub fn catch_panics(mut self, catch: bool) -> Self {
        self.catch_panics = catch;
        self
    }
}
