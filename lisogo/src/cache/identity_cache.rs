use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use itertools::Itertools;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::common::Value;
use crate::document::DocumentId;
use crate::entity::{EntityRef, WeakEntityRef};
use crate::errors::{ErrorKind, OdmError, OdmResult};

/// Per-collection map from identifier to the live instance last seen for it.
///
/// Entries do not keep their entity alive: once every [EntityRef] to an
/// instance is dropped, its entry behaves as absent and is purged.
///
/// Disabling the cache hides its entries without removing them: writes are
/// dropped, lookups miss and the size reads zero until the cache is enabled
/// again. [IdentityCacheInner::clear] empties the cache in either state.
///
/// # Examples
///
/// ```rust,ignore
/// let cache = IdentityCache::new(true);
/// cache.insert(id.clone(), &note);
/// assert!(cache.get(&id).unwrap().ptr_eq(&note));
/// ```
#[derive(Clone)]
pub struct IdentityCache {
    inner: Arc<IdentityCacheInner>,
}

impl IdentityCache {
    pub fn new(enabled: bool) -> Self {
        IdentityCache {
            inner: Arc::new(IdentityCacheInner::new(enabled)),
        }
    }

    /// Returns `true` if both handles share the same entries.
    pub fn ptr_eq(&self, other: &IdentityCache) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for IdentityCache {
    fn default() -> Self {
        IdentityCache::new(true)
    }
}

impl Deref for IdentityCache {
    type Target = IdentityCacheInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub struct IdentityCacheInner {
    enabled: AtomicBool,
    entries: DashMap<DocumentId, WeakEntityRef>,
}

impl IdentityCacheInner {
    fn new(enabled: bool) -> Self {
        IdentityCacheInner {
            enabled: AtomicBool::new(enabled),
            entries: DashMap::new(),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Caches `entity` under the identifier held by `key`.
    ///
    /// Fails with [ErrorKind::InvalidCacheKey] if `key` cannot identify a
    /// document. Nothing is checked or stored while the cache is disabled.
    pub fn put(&self, key: &Value, entity: &EntityRef) -> OdmResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        match key.to_document_id() {
            Some(id) => {
                self.insert(id, entity);
                Ok(())
            }
            None => {
                log::error!("{:?} is not a valid identity cache key", key);
                Err(OdmError::new(
                    &format!("{:?} is not a valid identity cache key", key),
                    ErrorKind::InvalidCacheKey,
                ))
            }
        }
    }

    /// Caches `entity` under `id`. Dropped while the cache is disabled.
    pub fn insert(&self, id: DocumentId, entity: &EntityRef) {
        if !self.is_enabled() {
            return;
        }
        self.entries.insert(id, entity.downgrade());
    }

    /// Returns the live instance cached under `id`, caching `entity` there
    /// first if there is none.
    ///
    /// The lookup and the insertion happen under the same entry lock, so
    /// concurrent callers for one `id` all get the same instance back.
    /// While the cache is disabled `entity` is returned as is.
    pub fn get_or_insert(&self, id: DocumentId, entity: &EntityRef) -> EntityRef {
        if !self.is_enabled() {
            return entity.clone();
        }

        match self.entries.entry(id) {
            Entry::Occupied(mut occupied) => match occupied.get().upgrade() {
                Some(cached) => {
                    log::debug!("Identity cache hit for {}", occupied.key());
                    cached
                }
                None => {
                    occupied.insert(entity.downgrade());
                    entity.clone()
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(entity.downgrade());
                entity.clone()
            }
        }
    }

    pub fn get(&self, id: &DocumentId) -> Option<EntityRef> {
        if !self.is_enabled() {
            return None;
        }

        let weak = self.entries.get(id).map(|entry| entry.value().clone())?;
        match weak.upgrade() {
            Some(entity) => {
                log::debug!("Identity cache hit for {}", id);
                Some(entity)
            }
            None => {
                log::debug!("Identity cache entry for {} was dropped", id);
                self.entries.remove_if(id, |_, entry| !entry.is_alive());
                None
            }
        }
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.get(id).is_some()
    }

    /// Removes the entry for `id`, whether or not the cache is enabled.
    pub fn remove(&self, id: &DocumentId) -> Option<EntityRef> {
        self.entries.remove(id).and_then(|(_, entry)| entry.upgrade())
    }

    pub fn len(&self) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        self.purge();
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached identifiers in order.
    pub fn ids(&self) -> Vec<DocumentId> {
        if !self.is_enabled() {
            return Vec::new();
        }
        self.purge();
        self.entries.iter().map(|entry| entry.key().clone()).sorted().collect()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    fn purge(&self) {
        self.entries.retain(|_, entry| entry.is_alive());
    }
}
