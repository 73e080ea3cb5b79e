use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use itertools::Itertools;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::collection::{FindOptions, UpdateResult, WriteResult};
use crate::document::{Document, DocumentId};
use crate::errors::{ErrorKind, OdmError, OdmResult};
use crate::store::{DocumentStream, StoreProvider};

type DocumentMap = Arc<SkipMap<DocumentId, Document>>;

/// In-memory implementation of [StoreProvider].
///
/// Each collection is a concurrent skip list ordered by identifier, so
/// results come back in identifier order. Generated identifiers grow over
/// time, which keeps documents saved without an `_id` in write order.
/// All data is lost when the store is closed.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore {
            inner: Arc::new(InMemoryStoreInner::new()),
        }
    }
}

impl StoreProvider for InMemoryStore {
    fn find_one(&self, namespace: &str, query: &Document) -> OdmResult<Option<Document>> {
        self.inner.find_one(namespace, query)
    }

    fn find(&self, namespace: &str, query: &Document, options: &FindOptions) -> OdmResult<DocumentStream> {
        self.inner.find(namespace, query, options)
    }

    fn save(&self, namespace: &str, document: Document) -> OdmResult<DocumentId> {
        self.inner.save(namespace, document)
    }

    fn insert(&self, namespace: &str, document: Document) -> OdmResult<DocumentId> {
        self.inner.insert(namespace, document)
    }

    fn update(&self, namespace: &str, query: &Document, document: Document, upsert: bool) -> OdmResult<UpdateResult> {
        self.inner.update(namespace, query, document, upsert)
    }

    fn remove(&self, namespace: &str, query: &Document) -> OdmResult<WriteResult> {
        self.inner.remove(namespace, query)
    }

    fn count(&self, namespace: &str, query: &Document) -> OdmResult<usize> {
        self.inner.count(namespace, query)
    }

    fn collection_names(&self) -> OdmResult<Vec<String>> {
        self.inner.collection_names()
    }

    fn drop_collection(&self, namespace: &str) -> OdmResult<()> {
        self.inner.drop_collection(namespace)
    }

    fn close(&self) -> OdmResult<()> {
        self.inner.close()
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
struct InMemoryStoreInner {
    closed: AtomicBool,
    collections: DashMap<String, DocumentMap>,
}

impl InMemoryStoreInner {
    fn new() -> InMemoryStoreInner {
        InMemoryStoreInner {
            closed: AtomicBool::from(false),
            collections: DashMap::new(),
        }
    }

    fn check_opened(&self) -> OdmResult<()> {
        if self.closed.load(Ordering::Relaxed) {
            log::error!("Store is closed");
            return Err(OdmError::new("Store is closed", ErrorKind::StoreClosed));
        }
        Ok(())
    }

    /// Returns the map of `namespace` without holding the registry lock.
    fn map(&self, namespace: &str) -> Option<DocumentMap> {
        self.collections.get(namespace).map(|entry| entry.value().clone())
    }

    fn map_or_create(&self, namespace: &str) -> DocumentMap {
        self.collections
            .entry(namespace.to_string())
            .or_insert_with(|| {
                log::debug!("Creating collection {}", namespace);
                Arc::new(SkipMap::new())
            })
            .clone()
    }

    fn matching(&self, namespace: &str, query: &Document) -> Vec<Document> {
        match self.map(namespace) {
            Some(map) => {
                if let Some(id) = query.id() {
                    // a lookup by identifier touches a single entry
                    return map
                        .get(&id)
                        .map(|entry| entry.value().clone())
                        .filter(|document| matches(document, query))
                        .into_iter()
                        .collect();
                }
                map.iter()
                    .map(|entry| entry.value().clone())
                    .filter(|document| matches(document, query))
                    .collect()
            }
            None => Vec::new(),
        }
    }

    fn find_one(&self, namespace: &str, query: &Document) -> OdmResult<Option<Document>> {
        self.check_opened()?;
        log::debug!("find_one {} {:?}", namespace, query);
        Ok(self.matching(namespace, query).into_iter().next())
    }

    fn find(&self, namespace: &str, query: &Document, options: &FindOptions) -> OdmResult<DocumentStream> {
        self.check_opened()?;
        log::debug!("find {} {:?} {:?}", namespace, query, options);

        let skip = options.skip_count().unwrap_or(0) as usize;
        let limit = options.limit_count().map(|l| l as usize).unwrap_or(usize::MAX);
        let projection = options.projected_fields().map(|fields| fields.to_vec());

        let documents = self
            .matching(namespace, query)
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(move |document| match &projection {
                Some(fields) => Ok(document.project(fields)),
                None => Ok(document),
            })
            .collect_vec();

        Ok(Box::new(documents.into_iter()))
    }

    fn save(&self, namespace: &str, mut document: Document) -> OdmResult<DocumentId> {
        self.check_opened()?;
        let id = match document.id() {
            Some(id) => id,
            None => {
                let id = DocumentId::generate();
                document.set_id(id.clone());
                id
            }
        };

        log::debug!("save {} {}", namespace, id);
        self.map_or_create(namespace).insert(id.clone(), document);
        Ok(id)
    }

    fn insert(&self, namespace: &str, mut document: Document) -> OdmResult<DocumentId> {
        self.check_opened()?;
        let id = match document.id() {
            Some(id) => id,
            None => {
                let id = DocumentId::generate();
                document.set_id(id.clone());
                id
            }
        };

        let map = self.map_or_create(namespace);
        if map.contains_key(&id) {
            log::error!("Document with id {} already exists in {}", id, namespace);
            return Err(OdmError::new(
                &format!("Document with id {} already exists in {}", id, namespace),
                ErrorKind::DuplicateKey,
            ));
        }

        log::debug!("insert {} {}", namespace, id);
        map.insert(id.clone(), document);
        Ok(id)
    }

    fn update(&self, namespace: &str, query: &Document, mut document: Document, upsert: bool) -> OdmResult<UpdateResult> {
        self.check_opened()?;

        let matched = self.matching(namespace, query).into_iter().next();
        match matched.and_then(|current| current.id()) {
            Some(id) => {
                if let Some(new_id) = document.id() {
                    if new_id != id {
                        log::error!("Cannot change the _id of {} to {} in {}", id, new_id, namespace);
                        return Err(OdmError::new(
                            &format!("Cannot change the _id of {} to {} in {}", id, new_id, namespace),
                            ErrorKind::InvalidOperation,
                        ));
                    }
                }

                log::debug!("update {} {}", namespace, id);
                document.set_id(id.clone());
                self.map_or_create(namespace).insert(id.clone(), document);
                Ok(UpdateResult::matched(vec![id]))
            }
            None if upsert => {
                if !document.has_id() {
                    if let Some(id) = query.id() {
                        document.set_id(id);
                    }
                }
                let id = self.insert(namespace, document)?;
                log::debug!("upsert {} {}", namespace, id);
                Ok(UpdateResult::upserted(id))
            }
            None => Ok(UpdateResult::matched(Vec::new())),
        }
    }

    fn remove(&self, namespace: &str, query: &Document) -> OdmResult<WriteResult> {
        self.check_opened()?;
        let ids = self
            .matching(namespace, query)
            .iter()
            .filter_map(Document::id)
            .collect_vec();

        if let Some(map) = self.map(namespace) {
            for id in &ids {
                map.remove(id);
            }
        }

        log::debug!("remove {} {:?}", namespace, ids);
        Ok(WriteResult::new(ids))
    }

    fn count(&self, namespace: &str, query: &Document) -> OdmResult<usize> {
        self.check_opened()?;
        if query.is_empty() {
            return Ok(self.map(namespace).map(|map| map.len()).unwrap_or(0));
        }
        Ok(self.matching(namespace, query).len())
    }

    fn collection_names(&self) -> OdmResult<Vec<String>> {
        self.check_opened()?;
        Ok(self
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .sorted()
            .collect())
    }

    fn drop_collection(&self, namespace: &str) -> OdmResult<()> {
        self.check_opened()?;
        log::debug!("drop {}", namespace);
        self.collections.remove(namespace);
        Ok(())
    }

    fn close(&self) -> OdmResult<()> {
        if self.closed.swap(true, Ordering::Relaxed) {
            return Ok(());
        }
        self.collections.clear();
        log::info!("In-memory store closed");
        Ok(())
    }
}

/// Query-by-example: every field of `query` must equal the stored field.
fn matches(document: &Document, query: &Document) -> bool {
    query
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}
