//! Pluggable config transformation hooks.
//!
//! Filters are carried as an explicit ordered chain threaded into the
//! resolver, constructed once at process wiring time. There is no global
//! registry; registration order is application order.

use serde_yaml::Value;

/// A single transformation applied to the merged configuration document.
/// May add, remove, or rewrite any key.
pub trait ConfigFilter: Send + Sync {
    fn apply(&self, doc: Value) -> Value;
}

impl<F> ConfigFilter for F
where
    F: Fn(Value) -> Value + Send + Sync,
{
    fn apply(&self, doc: Value) -> Value {
        self(doc)
    }
}

/// An ordered sequence of [`ConfigFilter`]s.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn ConfigFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter; filters run in registration order.
    pub fn register<F: ConfigFilter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Run the whole chain over `doc`.
    pub fn apply_all(&self, mut doc: Value) -> Value {
        for filter in &self.filters {
            doc = filter.apply(doc);
        }
        doc
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
