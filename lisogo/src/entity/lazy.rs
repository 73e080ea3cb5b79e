use std::fmt::Debug;

use crate::collection::Collection;
use crate::document::DocumentId;
use crate::entity::EntityRef;
use crate::errors::{ErrorKind, OdmError, OdmResult};

/// A reference that is resolved only when [LazyReference::fetch] is called.
///
/// The transformer substitutes lazy references for referenced entities when
/// lazy loading is enabled. Fetching goes through the collection, so an
/// instance already held by the identity cache is returned as is.
#[derive(Clone)]
pub struct LazyReference {
    collection: Collection,
    id: DocumentId,
    type_name: String,
}

impl LazyReference {
    pub fn new(collection: Collection, id: DocumentId, type_name: &str) -> Self {
        LazyReference {
            collection,
            id,
            type_name: type_name.to_string(),
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Loads the referenced entity.
    ///
    /// Fails with [ErrorKind::NotFound] if the document no longer exists.
    pub fn fetch(&self) -> OdmResult<EntityRef> {
        match self.collection.find_by_id(&self.id)? {
            Some(entity) => Ok(entity),
            None => {
                log::error!("No object with id {} in {}'s collection", self.id, self.type_name);
                Err(OdmError::new(
                    &format!("No object with id {} in {}'s collection", self.id, self.type_name),
                    ErrorKind::NotFound,
                ))
            }
        }
    }
}

impl PartialEq for LazyReference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.collection.namespace() == other.collection.namespace()
    }
}

impl Debug for LazyReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lazy({}:{}#{})", self.type_name, self.collection.namespace(), self.id)
    }
}
