//! The database handle: collections, caches and loading policy.

use itertools::Itertools;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cache::{CacheRegistry, IdentityCache};
use crate::collection::Collection;
use crate::common::{INVALID_COLLECTION_CHARS, NAMESPACE_SEPARATOR, SYSTEM_COLLECTION_PREFIX};
use crate::database_builder::DatabaseBuilder;
use crate::database_config::DatabaseConfig;
use crate::entity::TypeRegistry;
use crate::errors::{ErrorKind, OdmError, OdmResult};
use crate::store::Store;
use crate::transformer::Transformer;

/// An open database over a [Store].
///
/// A database owns its transformer and its identity caches, one per
/// collection name. Caches are created on first access while caching is
/// enabled and torn down when the database is closed. Clones share the same
/// state.
///
/// # Examples
///
/// ```rust,ignore
/// let db = Database::builder().registry(registry).open()?;
///
/// let note = EntityRef::new(Note::new("hi", "world"));
/// note.save(&db)?;
///
/// db.close()?;
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    pub(crate) fn new(config: DatabaseConfig, store: Store, owns_store: bool, registry: TypeRegistry) -> Self {
        let cache_enabled = config.cache_enabled();
        let lazy_loading = config.lazy_loading();
        log::info!(
            "Opening database {} (cache: {}, lazy loading: {})",
            config.name(),
            cache_enabled,
            lazy_loading
        );

        Database {
            inner: Arc::new(DatabaseInner {
                name: config.name(),
                config,
                store,
                owns_store,
                transformer: Transformer::new(registry),
                caches: CacheRegistry::new(),
                cache_enabled: AtomicBool::from(cache_enabled),
                lazy_loading: AtomicBool::from(lazy_loading),
                closed: AtomicBool::from(false),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    pub fn transformer(&self) -> &Transformer {
        &self.inner.transformer
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.inner.transformer.registry()
    }

    pub fn cache_registry(&self) -> &CacheRegistry {
        &self.inner.caches
    }

    /// Returns the collection `name`.
    ///
    /// While caching is enabled the collection uses the database's cache for
    /// `name`, created on first access; otherwise it gets a private cache
    /// that stays disabled.
    ///
    /// Fails with [ErrorKind::InvalidCollectionName] if `name` is empty,
    /// holds `$` or NUL, or starts with `system.`.
    pub fn collection(&self, name: &str) -> OdmResult<Collection> {
        self.check_opened()?;
        validate_collection_name(name)?;

        let cache = if self.cache_enabled() {
            self.inner.caches.get_cache(name, true).unwrap_or_default()
        } else {
            IdentityCache::new(false)
        };
        Ok(Collection::new(name, self.clone(), cache))
    }

    /// Returns the names of the stored collections of this database.
    pub fn collection_names(&self) -> OdmResult<Vec<String>> {
        self.check_opened()?;
        let prefix = self.namespace_of("");
        Ok(self
            .store()
            .collection_names()?
            .into_iter()
            .filter_map(|namespace| namespace.strip_prefix(&prefix).map(str::to_string))
            .sorted()
            .collect())
    }

    pub fn has_collection(&self, name: &str) -> OdmResult<bool> {
        Ok(self.collection_names()?.iter().any(|it| it == name))
    }

    /// Drops the stored collection `name` and clears its cache.
    pub fn drop_collection(&self, name: &str) -> OdmResult<()> {
        self.collection(name)?.drop()
    }

    pub fn enable_cache(&self) {
        log::debug!("Enabling identity caches of {}", self.name());
        self.inner.cache_enabled.store(true, Ordering::Relaxed);
        self.inner.caches.enable_all();
    }

    /// Disables every cache of this database. Entries are kept and become
    /// visible again when caching is enabled.
    pub fn disable_cache(&self) {
        log::debug!("Disabling identity caches of {}", self.name());
        self.inner.cache_enabled.store(false, Ordering::Relaxed);
        self.inner.caches.disable_all();
    }

    pub fn cache_enabled(&self) -> bool {
        self.inner.cache_enabled.load(Ordering::Relaxed)
    }

    pub fn clear_cache(&self) {
        self.inner.caches.clear_all();
    }

    /// References read from now on are returned as
    /// [LazyReference](crate::entity::LazyReference)s.
    pub fn enable_lazy_loading(&self) {
        self.inner.lazy_loading.store(true, Ordering::Relaxed);
    }

    pub fn disable_lazy_loading(&self) {
        self.inner.lazy_loading.store(false, Ordering::Relaxed);
    }

    pub fn lazy_loading_enabled(&self) -> bool {
        self.inner.lazy_loading.load(Ordering::Relaxed)
    }

    /// Tears down the identity caches and closes the store if this database
    /// created it. Every further operation fails with
    /// [ErrorKind::StoreClosed].
    pub fn close(&self) -> OdmResult<()> {
        if self.inner.closed.swap(true, Ordering::Relaxed) {
            return Ok(());
        }

        self.inner.caches.teardown();
        if self.inner.owns_store {
            self.inner.store.close()?;
        }
        log::info!("Closed database {}", self.name());
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Relaxed) || self.inner.store.is_closed()
    }

    /// Returns `true` if both handles refer to the same open database.
    pub fn ptr_eq(&self, other: &Database) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn check_opened(&self) -> OdmResult<()> {
        if self.inner.closed.load(Ordering::Relaxed) {
            log::error!("Database {} is closed", self.name());
            return Err(OdmError::new(
                &format!("Database {} is closed", self.name()),
                ErrorKind::StoreClosed,
            ));
        }
        if self.inner.store.is_closed() {
            log::error!("The store of database {} is closed", self.name());
            return Err(OdmError::new(
                &format!("The store of database {} is closed", self.name()),
                ErrorKind::StoreClosed,
            ));
        }
        Ok(())
    }

    pub(crate) fn namespace_of(&self, collection: &str) -> String {
        format!("{}{}{}", self.name(), NAMESPACE_SEPARATOR, collection)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Database({})", self.name())
    }
}

struct DatabaseInner {
    name: String,
    config: DatabaseConfig,
    store: Store,
    owns_store: bool,
    transformer: Transformer,
    caches: CacheRegistry,
    cache_enabled: AtomicBool,
    lazy_loading: AtomicBool,
    closed: AtomicBool,
}

fn validate_collection_name(name: &str) -> OdmResult<()> {
    if name.is_empty() {
        log::error!("Collection name cannot be empty");
        return Err(OdmError::new(
            "Collection name cannot be empty",
            ErrorKind::InvalidCollectionName,
        ));
    }

    if name.contains(INVALID_COLLECTION_CHARS) || name.starts_with(SYSTEM_COLLECTION_PREFIX) {
        log::error!("Invalid collection name {:?}", name);
        return Err(OdmError::new(
            &format!("Invalid collection name {:?}", name),
            ErrorKind::InvalidCollectionName,
        ));
    }
    Ok(())
}
