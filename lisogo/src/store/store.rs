use std::ops::Deref;
use std::sync::Arc;

use crate::collection::{FindOptions, UpdateResult, WriteResult};
use crate::document::{Document, DocumentId};
use crate::errors::OdmResult;

/// A lazily consumed sequence of raw documents returned by a store.
pub type DocumentStream = Box<dyn Iterator<Item = OdmResult<Document>> + Send>;

/// Low-level interface of a document store.
///
/// Collections are addressed by namespace (`"<database>.<collection>"`).
/// Queries are documents: a stored document matches when every field of the
/// query equals the stored field, and the empty query matches everything.
///
/// Every operation fails with [ErrorKind::StoreClosed](crate::errors::ErrorKind::StoreClosed)
/// once the store is closed.
pub trait StoreProvider: Send + Sync {
    /// Returns the first document matching `query`.
    fn find_one(&self, namespace: &str, query: &Document) -> OdmResult<Option<Document>>;

    /// Returns the documents matching `query`, honoring `options`.
    fn find(&self, namespace: &str, query: &Document, options: &FindOptions) -> OdmResult<DocumentStream>;

    /// Writes `document`, replacing any document with the same `_id`. An
    /// identifier is generated when the document has none.
    fn save(&self, namespace: &str, document: Document) -> OdmResult<DocumentId>;

    /// Writes a new document.
    ///
    /// Fails with [ErrorKind::DuplicateKey](crate::errors::ErrorKind::DuplicateKey)
    /// if a document with the same `_id` exists.
    fn insert(&self, namespace: &str, document: Document) -> OdmResult<DocumentId>;

    /// Replaces the first document matching `query` with `document`, keeping
    /// the matched `_id`. When nothing matches and `upsert` is set,
    /// `document` is inserted instead.
    fn update(&self, namespace: &str, query: &Document, document: Document, upsert: bool) -> OdmResult<UpdateResult>;

    /// Removes every document matching `query`.
    fn remove(&self, namespace: &str, query: &Document) -> OdmResult<WriteResult>;

    fn count(&self, namespace: &str, query: &Document) -> OdmResult<usize>;

    /// Returns the namespaces holding a collection, in order.
    fn collection_names(&self) -> OdmResult<Vec<String>>;

    fn drop_collection(&self, namespace: &str) -> OdmResult<()>;

    fn close(&self) -> OdmResult<()>;

    fn is_closed(&self) -> bool;
}

/// A cloneable handle to a [StoreProvider].
///
/// # Examples
///
/// ```rust,ignore
/// let store = Store::new(InMemoryStore::new());
/// let id = store.save("lisogo.notes", doc! { title: "hi" })?;
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn StoreProvider>,
}

impl Store {
    pub fn new<T: StoreProvider + 'static>(inner: T) -> Self {
        Store { inner: Arc::new(inner) }
    }

    /// Returns `true` if both handles share the same backend.
    pub fn ptr_eq(&self, other: &Store) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }
}

impl Deref for Store {
    type Target = Arc<dyn StoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
