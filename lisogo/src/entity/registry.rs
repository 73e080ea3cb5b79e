use dashmap::DashMap;
use itertools::Itertools;
use std::ops::Deref;
use std::sync::Arc;

use crate::entity::{Entity, EntityRef};
use crate::errors::{ErrorKind, OdmError, OdmResult};

/// Builds a fresh, empty entity.
pub type EntityFactory = Arc<dyn Fn() -> EntityRef + Send + Sync>;

/// Maps type tags to entity factories.
///
/// Types are registered once at startup; the transformer then resolves the
/// `_type` tags and `_types_mapping` entries it reads back from the store.
/// Clones share the same table.
///
/// # Examples
///
/// ```rust,ignore
/// let registry = TypeRegistry::new("blog.model");
/// registry.register::<Post>().register::<User>();
/// let user = registry.resolve("User")?;
/// ```
#[derive(Clone)]
pub struct TypeRegistry {
    inner: Arc<TypeRegistryInner>,
}

impl TypeRegistry {
    pub fn new(namespace: &str) -> Self {
        TypeRegistry {
            inner: Arc::new(TypeRegistryInner::new(namespace)),
        }
    }
}

impl Deref for TypeRegistry {
    type Target = TypeRegistryInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub struct TypeRegistryInner {
    namespace: String,
    factories: DashMap<String, EntityFactory>,
}

impl TypeRegistryInner {
    fn new(namespace: &str) -> Self {
        TypeRegistryInner {
            namespace: namespace.to_string(),
            factories: DashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Registers `E` under the tag reported by `E::default().type_name()`.
    pub fn register<E: Entity + Default + 'static>(&self) -> &Self {
        let tag = E::default().type_name().to_string();
        self.register_factory(&tag, || EntityRef::new(E::default()))
    }

    /// Registers a custom constructor for `tag`, replacing any previous one.
    pub fn register_factory<F>(&self, tag: &str, factory: F) -> &Self
    where
        F: Fn() -> EntityRef + Send + Sync + 'static,
    {
        if self.factories.insert(tag.to_string(), Arc::new(factory)).is_some() {
            log::warn!("Type {} was already registered in {}, replacing it", tag, self.namespace);
        } else {
            log::debug!("Registered type {} in {}", tag, self.namespace);
        }
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Returns the registered tags in lexical order.
    pub fn tags(&self) -> Vec<String> {
        self.factories.iter().map(|entry| entry.key().clone()).sorted().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Creates an empty instance of the type registered as `tag`.
    ///
    /// Fails with [ErrorKind::UnknownType] if no such type is registered.
    pub fn resolve(&self, tag: &str) -> OdmResult<EntityRef> {
        let factory = self
            .factories
            .get(tag)
            .map(|entry| entry.value().clone());

        match factory {
            Some(factory) => Ok(factory()),
            None => {
                log::error!("Unknown type {} in namespace {}", tag, self.namespace);
                Err(OdmError::new(
                    &format!("Unknown type {} in namespace {}", tag, self.namespace),
                    ErrorKind::UnknownType,
                ))
            }
        }
    }
}
