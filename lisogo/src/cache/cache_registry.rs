use dashmap::DashMap;
use itertools::Itertools;
use std::ops::Deref;
use std::sync::Arc;

use crate::cache::IdentityCache;

/// The identity caches of one database, keyed by collection name.
///
/// A registry is created when a database is opened and torn down when it is
/// closed; databases never share registries.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    inner: Arc<CacheRegistryInner>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        CacheRegistry {
            inner: Arc::new(CacheRegistryInner::default()),
        }
    }
}

impl Deref for CacheRegistry {
    type Target = CacheRegistryInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Default)]
pub struct CacheRegistryInner {
    caches: DashMap<String, IdentityCache>,
}

impl CacheRegistryInner {
    /// Returns the cache registered for `name`. When `create_if_needed` is
    /// set, a missing cache is created enabled and registered.
    pub fn get_cache(&self, name: &str, create_if_needed: bool) -> Option<IdentityCache> {
        if create_if_needed {
            let cache = self
                .caches
                .entry(name.to_string())
                .or_insert_with(|| {
                    log::debug!("Creating identity cache for {}", name);
                    IdentityCache::new(true)
                })
                .clone();
            Some(cache)
        } else {
            self.caches.get(name).map(|entry| entry.value().clone())
        }
    }

    /// Registers `cache` for `name` and returns the cache it replaces.
    pub fn set_cache(&self, name: &str, cache: IdentityCache) -> Option<IdentityCache> {
        self.caches.insert(name.to_string(), cache)
    }

    pub fn remove_cache(&self, name: &str) -> Option<IdentityCache> {
        self.caches.remove(name).map(|(_, cache)| cache)
    }

    pub fn enable_all(&self) {
        self.caches.iter().for_each(|entry| entry.value().enable());
    }

    pub fn disable_all(&self) {
        self.caches.iter().for_each(|entry| entry.value().disable());
    }

    pub fn clear_all(&self) {
        self.caches.iter().for_each(|entry| entry.value().clear());
    }

    pub fn names(&self) -> Vec<String> {
        self.caches.iter().map(|entry| entry.key().clone()).sorted().collect()
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Clears every cache and unregisters them all.
    pub(crate) fn teardown(&self) {
        self.clear_all();
        self.caches.clear();
    }
}
