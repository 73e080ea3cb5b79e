use std::sync::Arc;

use crate::cache::IdentityCache;
use crate::collection::{limit_to, Cursor, FindOptions, UpdateResult, WriteResult};
use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use crate::database::Database;
use crate::document::{Document, DocumentId};
use crate::entity::EntityRef;
use crate::errors::OdmResult;
use crate::store::Store;

/// A named collection of entities within a [Database].
///
/// Obtained from [Database::collection]. Clones share the same identity
/// cache: while caching is enabled, reading the same stored document twice
/// yields the same [EntityRef].
///
/// # Examples
///
/// ```rust,ignore
/// let notes = db.collection("notes")?;
/// let note = EntityRef::new(Note::new("hi", "world"));
/// let id = notes.insert(&note)?;
///
/// let found = notes.find_by_id(&id)?.unwrap();
/// assert!(found.ptr_eq(&note));
/// ```
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

impl Collection {
    pub(crate) fn new(name: &str, database: Database, cache: IdentityCache) -> Self {
        let namespace = database.namespace_of(name);
        Collection {
            inner: Arc::new(CollectionInner {
                name: name.to_string(),
                namespace,
                database,
                cache: atomic(cache),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The name of the stored collection, `"<database>.<collection>"`.
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn database(&self) -> &Database {
        &self.inner.database
    }

    pub fn cache(&self) -> IdentityCache {
        self.inner.cache.read_with(|cache| cache.clone())
    }

    /// Replaces the identity cache used by this handle and its clones.
    pub fn set_cache(&self, cache: IdentityCache) {
        self.inner.cache.write_with(|current| *current = cache);
    }

    fn store(&self) -> &Store {
        self.inner.database.store()
    }

    /// Converts `entity` into the document written to the store. Entities it
    /// references are saved on the way.
    pub fn serialize(&self, entity: &EntityRef) -> OdmResult<Document> {
        self.serialize_within(entity, &mut Vec::new())
    }

    /// [Collection::serialize] as part of saving the entities in `path`.
    ///
    /// An entity referenced from its own graph is stored as a reference to
    /// itself, under an identifier assigned on the way if it had none.
    pub(crate) fn serialize_within(&self, entity: &EntityRef, path: &mut Vec<EntityRef>) -> OdmResult<Document> {
        path.push(entity.clone());
        let document = entity.read().to_document();
        let result = self.database().transformer().incoming_document(document, Some(self), path);
        path.pop();

        let mut document = result?;
        if !document.has_id() {
            if let Some(id) = entity.id() {
                document.set_id(id);
            }
        }
        Ok(document)
    }

    /// Maps a stored document to a new entity, bypassing the identity cache.
    pub fn deserialize(&self, document: Document) -> OdmResult<EntityRef> {
        self.database().transformer().deserialize(document, Some(self))
    }

    /// Writes `entity`, replacing the stored document with the same id.
    ///
    /// The entity receives its identifier, becomes unmodified and is cached.
    pub fn save(&self, entity: &EntityRef) -> OdmResult<DocumentId> {
        self.save_within(entity, &mut Vec::new())
    }

    pub(crate) fn save_within(&self, entity: &EntityRef, path: &mut Vec<EntityRef>) -> OdmResult<DocumentId> {
        self.database().check_opened()?;
        let document = self.serialize_within(entity, path)?;
        let id = self.store().save(self.namespace(), document)?;
        self.written(entity, id.clone());
        Ok(id)
    }

    /// Writes `entity` as a new document.
    ///
    /// Fails with [ErrorKind::DuplicateKey](crate::errors::ErrorKind::DuplicateKey)
    /// if its identifier is already stored.
    pub fn insert(&self, entity: &EntityRef) -> OdmResult<DocumentId> {
        self.database().check_opened()?;
        let document = self.serialize(entity)?;
        let id = self.store().insert(self.namespace(), document)?;
        self.written(entity, id.clone());
        Ok(id)
    }

    /// Inserts `entities` in order, stopping at the first failure.
    ///
    /// Every entity written before the failure keeps its identifier, is
    /// unmodified and is cached, like after [Collection::insert].
    pub fn insert_many(&self, entities: &[EntityRef]) -> OdmResult<WriteResult> {
        self.database().check_opened()?;
        let mut ids = Vec::with_capacity(entities.len());
        for entity in entities {
            ids.push(self.insert(entity)?);
        }
        Ok(WriteResult::new(ids))
    }

    /// Replaces the first document matching `spec` with `entity`.
    ///
    /// When exactly one document is written the entity takes its identifier
    /// and is cached.
    pub fn update(&self, spec: &Document, entity: &EntityRef) -> OdmResult<UpdateResult> {
        self.replace(spec, entity, false)
    }

    /// Like [Collection::update], inserting `entity` when nothing matches.
    pub fn upsert(&self, spec: &Document, entity: &EntityRef) -> OdmResult<UpdateResult> {
        self.replace(spec, entity, true)
    }

    fn replace(&self, spec: &Document, entity: &EntityRef, upsert: bool) -> OdmResult<UpdateResult> {
        self.database().check_opened()?;
        let document = self.serialize(entity)?;
        let result = self.store().update(self.namespace(), spec, document, upsert)?;
        if let Some(id) = result.written_id() {
            self.written(entity, id.clone());
        }
        Ok(result)
    }

    /// Removes the documents matching `query` and evicts them from the
    /// identity cache.
    pub fn remove(&self, query: &Document) -> OdmResult<WriteResult> {
        self.database().check_opened()?;
        let result = self.store().remove(self.namespace(), query)?;
        let cache = self.cache();
        for id in result.affected_ids() {
            cache.remove(id);
        }
        Ok(result)
    }

    pub fn find(&self, query: &Document) -> OdmResult<Cursor> {
        self.find_with_options(query, FindOptions::new())
    }

    pub fn find_with_options(&self, query: &Document, options: FindOptions) -> OdmResult<Cursor> {
        self.database().check_opened()?;
        Ok(Cursor::new(self.clone(), query.clone(), options))
    }

    pub fn find_one(&self, query: &Document) -> OdmResult<Option<EntityRef>> {
        self.find_with_options(query, limit_to(1))?.next().transpose()
    }

    pub fn find_by_id(&self, id: &DocumentId) -> OdmResult<Option<EntityRef>> {
        let mut query = Document::new();
        query.set_id(id.clone());
        self.find_one(&query)
    }

    pub fn count(&self, query: &Document) -> OdmResult<usize> {
        self.database().check_opened()?;
        self.store().count(self.namespace(), query)
    }

    /// Drops the stored collection and clears its identity cache.
    pub fn drop(&self) -> OdmResult<()> {
        self.database().check_opened()?;
        self.store().drop_collection(self.namespace())?;
        self.cache().clear();
        log::debug!("Dropped collection {}", self.namespace());
        Ok(())
    }

    /// Returns the raw stored document matching `query`.
    pub(crate) fn find_stored(&self, query: &Document) -> OdmResult<Option<Document>> {
        self.database().check_opened()?;
        self.store().find_one(self.namespace(), query)
    }

    fn written(&self, entity: &EntityRef, id: DocumentId) {
        {
            let mut guard = entity.write();
            let state = guard.state_mut();
            state.set_id(id.clone());
            state.mark_clean();
        }
        self.cache().insert(id, entity);
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Collection({})", self.namespace())
    }
}

struct CollectionInner {
    name: String,
    namespace: String,
    database: Database,
    cache: Atomic<IdentityCache>,
}
