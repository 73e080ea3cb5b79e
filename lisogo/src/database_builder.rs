//! Fluent construction of a [Database].

use crate::database::Database;
use crate::database_config::DatabaseConfig;
use crate::entity::TypeRegistry;
use crate::errors::{ErrorKind, OdmError, OdmResult};
use crate::store::memory::InMemoryStore;
use crate::store::Store;

/// Builds and opens a [Database].
///
/// Errors raised while configuring are kept and returned by
/// [DatabaseBuilder::open].
///
/// # Examples
///
/// ```rust,ignore
/// let registry = TypeRegistry::new("blog.model");
/// registry.register::<Post>().register::<User>();
///
/// let db = Database::builder()
///     .name("blog")
///     .registry(registry)
///     .lazy_loading(true)
///     .open()?;
/// ```
#[derive(Default)]
pub struct DatabaseBuilder {
    error: Option<OdmError>,
    config: DatabaseConfig,
    store: Option<Store>,
    registry: Option<TypeRegistry>,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        DatabaseBuilder {
            error: None,
            config: DatabaseConfig::new(),
            store: None,
            registry: None,
        }
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        DatabaseBuilder {
            error: None,
            config,
            store: None,
            registry: None,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_name(name) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the namespace of the type registry created when none is given.
    pub fn namespace(mut self, namespace: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_namespace(namespace) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Uses `store` instead of a private in-memory store. Several databases
    /// may share one store.
    pub fn store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn cache(mut self, enabled: bool) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_cache_enabled(enabled) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn lazy_loading(mut self, enabled: bool) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_lazy_loading(enabled) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn open(self) -> OdmResult<Database> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let owns_store = self.store.is_none();
        let store = self.store.unwrap_or_else(|| Store::new(InMemoryStore::new()));
        if store.is_closed() {
            log::error!("Cannot open a database over a closed store");
            return Err(OdmError::new(
                "Cannot open a database over a closed store",
                ErrorKind::StoreClosed,
            ));
        }

        let registry = match self.registry {
            Some(registry) => {
                if registry.namespace() != self.config.namespace() {
                    self.config.set_namespace(registry.namespace())?;
                }
                registry
            }
            None => TypeRegistry::new(&self.config.namespace()),
        };

        self.config.initialize();
        Ok(Database::new(self.config, store, owns_store, registry))
    }
}
