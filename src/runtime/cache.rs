//! Wrapper identity cache
//!
//! Wrapping the same host allocation twice within one evaluator yields the
//! same script object. Each wrapper keeps its backing `Rc` alive, so a cached
//! address cannot be reused by another allocation while its entry exists.

use std::collections::HashMap;

use log::trace;

use super::object::ObjectHandle;

#[derive(Debug, Default)]
pub struct WrapperCache {
    entries: HashMap<usize, ObjectHandle>,
    hits: u64,
    misses: u64,
}

impl WrapperCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: usize) -> Option<ObjectHandle> {
        self.entries.get(&identity).cloned()
    }

    /// Cached wrapper for `identity`, creating it with `make` on first use
    pub fn get_or_insert_with<F>(&mut self, identity: usize, make: F) -> ObjectHandle
    where
        F: FnOnce() -> ObjectHandle,
    {
        if let Some(existing) = self.entries.get(&identity) {
            self.hits += 1;
            return existing.clone();
        }
        self.misses += 1;
        let wrapper = make();
        trace!("caching wrapper {:?} for host #{:x}", wrapper, identity);
        self.entries.insert(identity, wrapper.clone());
        wrapper
    }

    /// Drop the wrapper for `identity`; the next wrap creates a fresh one
    pub fn evict(&mut self, identity: usize) -> Option<ObjectHandle> {
        self.entries.remove(&identity)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
