use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt::Debug;
use std::sync::{Arc, Weak};

use crate::common::DOC_ID;
use crate::database::Database;
use crate::document::{Document, DocumentId, ObjectId};
use crate::entity::{AsAny, Entity};
use crate::errors::{ErrorKind, OdmError, OdmResult};

/// A shared handle to a live entity.
///
/// Clones point to the same instance, which is what the identity cache hands
/// out: two handles obtained for the same stored document compare equal with
/// [EntityRef::ptr_eq].
///
/// # Examples
///
/// ```rust,ignore
/// let note = EntityRef::new(Note::new("hi", "world"));
/// note.save(&db)?;
/// let title = note.with(|n: &Note| n.title().to_string())?;
/// ```
#[derive(Clone)]
pub struct EntityRef {
    inner: Arc<RwLock<dyn Entity>>,
}

impl EntityRef {
    pub fn new<E: Entity + 'static>(entity: E) -> Self {
        EntityRef {
            inner: Arc::new(RwLock::new(entity)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, dyn Entity> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, dyn Entity> {
        self.inner.write()
    }

    /// Returns `true` if both handles point to the same instance.
    pub fn ptr_eq(&self, other: &EntityRef) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }

    pub fn downgrade(&self) -> WeakEntityRef {
        WeakEntityRef {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn id(&self) -> Option<DocumentId> {
        self.read().id()
    }

    pub fn type_name(&self) -> String {
        self.read().type_name().to_string()
    }

    pub fn is_modified(&self) -> bool {
        self.read().is_modified()
    }

    pub fn is<E: Entity + 'static>(&self) -> bool {
        let guard = self.read();
        let entity: &dyn Entity = &*guard;
        entity.as_any().is::<E>()
    }

    /// Runs `f` against the concrete entity behind this handle.
    ///
    /// Fails with [ErrorKind::TypeMismatch] if the entity is not an `E`.
    pub fn with<E: Entity + 'static, R>(&self, f: impl FnOnce(&E) -> R) -> OdmResult<R> {
        let guard = self.read();
        let entity: &dyn Entity = &*guard;
        match entity.as_any().downcast_ref::<E>() {
            Some(concrete) => Ok(f(concrete)),
            None => {
                log::error!("Entity of type {} cannot be accessed as {}", entity.type_name(), std::any::type_name::<E>());
                Err(OdmError::new(
                    &format!("Entity of type {} cannot be accessed as {}", entity.type_name(), std::any::type_name::<E>()),
                    ErrorKind::TypeMismatch,
                ))
            }
        }
    }

    /// Runs `f` against the concrete entity behind this handle, mutably.
    ///
    /// Fails with [ErrorKind::TypeMismatch] if the entity is not an `E`.
    pub fn with_mut<E: Entity + 'static, R>(&self, f: impl FnOnce(&mut E) -> R) -> OdmResult<R> {
        let mut guard = self.write();
        let entity: &mut dyn Entity = &mut *guard;
        let type_name = entity.type_name().to_string();
        match entity.as_any_mut().downcast_mut::<E>() {
            Some(concrete) => Ok(f(concrete)),
            None => {
                log::error!("Entity of type {} cannot be accessed as {}", type_name, std::any::type_name::<E>());
                Err(OdmError::new(
                    &format!("Entity of type {} cannot be accessed as {}", type_name, std::any::type_name::<E>()),
                    ErrorKind::TypeMismatch,
                ))
            }
        }
    }

    /// Persists the entity in its own collection.
    ///
    /// Does nothing if the entity is not modified. Otherwise the entity is
    /// written through its collection, receives its identifier and becomes
    /// unmodified.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::PersistError] if the type has no collection of
    /// its own.
    pub fn save(&self, db: &Database) -> OdmResult<()> {
        self.save_within(db, &mut Vec::new())
    }

    /// [EntityRef::save] as part of saving the entities in `path`.
    pub(crate) fn save_within(&self, db: &Database, path: &mut Vec<EntityRef>) -> OdmResult<()> {
        if !self.is_modified() {
            log::debug!("{} is not modified, skipping save", self.describe());
            return Ok(());
        }
        self.persist_within(db, path)
    }

    /// Writes the entity even when it is not modified.
    pub(crate) fn persist_within(&self, db: &Database, path: &mut Vec<EntityRef>) -> OdmResult<()> {
        let collection = {
            let entity = self.read();
            match entity.collection(db)? {
                Some(collection) => collection,
                None => {
                    log::error!("The object of type {} can only be nested (no collection defined)", entity.type_name());
                    return Err(OdmError::new(
                        &format!("The object of type {} can only be nested (no collection defined)", entity.type_name()),
                        ErrorKind::PersistError,
                    ));
                }
            }
        };

        collection.save_within(self, path)?;
        self.write().state_mut().mark_clean();
        Ok(())
    }

    /// Populates the entity with the stored document matching `spec_or_id`.
    ///
    /// The lookup goes straight to the store and bypasses the identity
    /// cache, so the entity reflects what is currently stored.
    ///
    /// # Errors
    ///
    /// * [ErrorKind::RetrieveError] if the type has no collection of its own,
    ///   or if a query document has no `_id`.
    /// * [ErrorKind::NotFound] if nothing matches.
    pub fn retrieve(&self, spec_or_id: impl Into<SpecOrId>, db: &Database) -> OdmResult<()> {
        let collection = {
            let entity = self.read();
            match entity.collection(db)? {
                Some(collection) => collection,
                None => {
                    log::error!("The object of type {} can only be nested (no collection defined)", entity.type_name());
                    return Err(OdmError::new(
                        &format!("The object of type {} can only be nested (no collection defined)", entity.type_name()),
                        ErrorKind::RetrieveError,
                    ));
                }
            }
        };

        let query = spec_or_id.into().into_query()?;
        let found = collection.find_stored(&query)?;
        match found {
            Some(document) => db.transformer().load_entity(self, document, &collection),
            None => {
                let id = query.get(DOC_ID).map(|v| format!("{:?}", v)).unwrap_or_default();
                let type_name = self.type_name();
                log::error!("No object with id {} in {}'s collection", id, type_name);
                Err(OdmError::new(
                    &format!("No object with id {} in {}'s collection", id, type_name),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    fn describe(&self) -> String {
        match self.inner.try_read() {
            Some(entity) => match entity.id() {
                Some(id) => format!("{}({})", entity.type_name(), id),
                None => format!("{}(unsaved)", entity.type_name()),
            },
            None => "Entity(locked)".to_string(),
        }
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Debug for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// A non-owning handle to a live entity, as held by the identity cache.
#[derive(Clone)]
pub struct WeakEntityRef {
    inner: Weak<RwLock<dyn Entity>>,
}

impl WeakEntityRef {
    pub fn upgrade(&self) -> Option<EntityRef> {
        self.inner.upgrade().map(|inner| EntityRef { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

/// The argument of [EntityRef::retrieve]: an identifier or a query document
/// holding an `_id`.
#[derive(Clone, Debug)]
pub enum SpecOrId {
    Id(DocumentId),
    Spec(Document),
}

impl SpecOrId {
    /// Turns the argument into the query sent to the store.
    ///
    /// Fails with [ErrorKind::RetrieveError] if a query document has no `_id`.
    pub fn into_query(self) -> OdmResult<Document> {
        match self {
            SpecOrId::Id(id) => {
                let mut query = Document::new();
                query.set_id(id);
                Ok(query)
            }
            SpecOrId::Spec(spec) => {
                if !spec.contains_key(DOC_ID) {
                    log::error!("\"spec_or_id\" as a document must have an \"_id\" field");
                    return Err(OdmError::new(
                        "\"spec_or_id\" as a document must have an \"_id\" field",
                        ErrorKind::RetrieveError,
                    ));
                }
                Ok(spec)
            }
        }
    }
}

impl From<DocumentId> for SpecOrId {
    fn from(id: DocumentId) -> Self {
        SpecOrId::Id(id)
    }
}

impl From<&DocumentId> for SpecOrId {
    fn from(id: &DocumentId) -> Self {
        SpecOrId::Id(id.clone())
    }
}

impl From<ObjectId> for SpecOrId {
    fn from(id: ObjectId) -> Self {
        SpecOrId::Id(DocumentId::Object(id))
    }
}

impl From<&str> for SpecOrId {
    fn from(id: &str) -> Self {
        SpecOrId::Id(DocumentId::from(id))
    }
}

impl From<String> for SpecOrId {
    fn from(id: String) -> Self {
        SpecOrId::Id(DocumentId::from(id))
    }
}

impl From<i64> for SpecOrId {
    fn from(id: i64) -> Self {
        SpecOrId::Id(DocumentId::Int(id))
    }
}

impl From<Document> for SpecOrId {
    fn from(spec: Document) -> Self {
        SpecOrId::Spec(spec)
    }
}
