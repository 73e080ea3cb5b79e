use crate::collection::{Collection, FindOptions};
use crate::document::{Document, DocumentId};
use crate::entity::EntityRef;
use crate::errors::OdmResult;
use crate::store::DocumentStream;

/// Iterates over the entities matching a query.
///
/// The store is queried on the first call to `next`. Every stored document
/// is looked up in the identity cache by `_id` before being deserialized,
/// and freshly deserialized entities are cached, so an entity already in
/// memory is always returned as the same instance.
///
/// A query made of a single `_id` (no projection, no skip) is answered from
/// the cache alone when possible, without touching the store.
///
/// Projected queries never read from or write to the cache.
pub struct Cursor {
    collection: Collection,
    query: Document,
    options: FindOptions,
    source: Option<DocumentStream>,
    cache_checked: bool,
    exhausted: bool,
}

impl Cursor {
    pub(crate) fn new(collection: Collection, query: Document, options: FindOptions) -> Self {
        Cursor {
            collection,
            query,
            options,
            source: None,
            cache_checked: false,
            exhausted: false,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn query(&self) -> &Document {
        &self.query
    }

    /// Returns the queried identifier if this cursor can be answered by a
    /// single cache lookup.
    fn cacheable_id(&self) -> Option<DocumentId> {
        if self.options.is_projected()
            || self.options.skip_count().unwrap_or(0) > 0
            || self.options.limit_count() == Some(0)
            || self.query.size() != 1
        {
            return None;
        }
        self.query.id()
    }

    fn open_source(&mut self) -> OdmResult<()> {
        if self.source.is_none() {
            let stream = self.collection.database().store().find(
                self.collection.namespace(),
                &self.query,
                &self.options,
            )?;
            self.source = Some(stream);
        }
        Ok(())
    }

    fn materialize(&self, document: Document) -> OdmResult<EntityRef> {
        if self.options.is_projected() {
            return self.collection.deserialize(document);
        }

        let cache = self.collection.cache();
        if let Some(id) = document.id() {
            if let Some(entity) = cache.get(&id) {
                return Ok(entity);
            }
        }

        // another reader may have cached the same document meanwhile
        let entity = self.collection.deserialize(document)?;
        match entity.id() {
            Some(id) => Ok(cache.get_or_insert(id, &entity)),
            None => Ok(entity),
        }
    }
}

impl Iterator for Cursor {
    type Item = OdmResult<EntityRef>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        if !self.cache_checked {
            self.cache_checked = true;
            if let Some(id) = self.cacheable_id() {
                if let Some(entity) = self.collection.cache().get(&id) {
                    self.exhausted = true;
                    return Some(Ok(entity));
                }
            }
        }

        if let Err(err) = self.open_source() {
            self.exhausted = true;
            return Some(Err(err));
        }

        let next = self.source.as_mut().and_then(|source| source.next());
        match next {
            Some(Ok(document)) => Some(self.materialize(document)),
            Some(Err(err)) => Some(Err(err)),
            None => {
                self.exhausted = true;
                None
            }
        }
    }
}
