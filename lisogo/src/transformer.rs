//! Conversion between live entity graphs and stored documents.
//!
//! On the way in, entities found in a document are either written to their
//! own collection and replaced by their identifier (a reference), or
//! replaced by their own document (embedded). References are recorded in
//! `_types_mapping` so the way out knows which type to instantiate for each
//! identifier.

use std::collections::HashMap;

use crate::collection::Collection;
use crate::common::{Value, DOC_ID, DOC_TYPE, DOC_TYPES_MAPPING};
use crate::document::{Document, DocumentId};
use crate::entity::{EntityRef, LazyReference, TypeRegistry};
use crate::errors::{ErrorKind, OdmError, OdmResult};

/// Entities being loaded by one outgoing transformation, by collection
/// namespace and identifier.
type Loading = HashMap<(String, DocumentId), EntityRef>;

/// Maps entity graphs to stored documents and back.
///
/// A database holds exactly one transformer; it is reached through
/// [Database::transformer](crate::database::Database::transformer).
#[derive(Clone)]
pub struct Transformer {
    registry: TypeRegistry,
}

impl Transformer {
    pub fn new(registry: TypeRegistry) -> Self {
        Transformer { registry }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn namespace(&self) -> &str {
        self.registry.namespace()
    }

    /// Turns `document` into its storable form.
    ///
    /// Nested documents and arrays are transformed recursively. An entity
    /// value is handled according to its type:
    ///
    /// * with a collection of its own (and a `collection` context), it is
    ///   saved first and replaced by its identifier, recorded in
    ///   `_types_mapping`;
    /// * otherwise it is embedded as its own transformed document.
    ///
    /// Lazy references are replaced by their identifier. Every referenced
    /// entity has an identifier by the time this returns.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::ObjectMappingError] if an embedded entity
    /// contains itself.
    pub fn transform_incoming(&self, document: Document, collection: Option<&Collection>) -> OdmResult<Document> {
        self.incoming_document(document, collection, &mut Vec::new())
    }

    /// Like [Transformer::transform_incoming], with `path` holding the
    /// entities whose documents are being built around this one.
    pub(crate) fn incoming_document(
        &self,
        document: Document,
        collection: Option<&Collection>,
        path: &mut Vec<EntityRef>,
    ) -> OdmResult<Document> {
        let mut mapping = Document::new();
        let mut result = Document::new();

        for (key, value) in document {
            if key == DOC_TYPES_MAPPING {
                if let Value::Document(existing) = value {
                    for (id, tag) in existing {
                        mapping.insert_raw(id, tag);
                    }
                }
                continue;
            }

            let value = self.incoming_value(value, collection, &mut mapping, path)?;
            result.insert_raw(key, value);
        }

        if !mapping.is_empty() {
            result.insert_raw(DOC_TYPES_MAPPING.to_string(), Value::Document(mapping));
        }
        Ok(result)
    }

    fn incoming_value(
        &self,
        value: Value,
        collection: Option<&Collection>,
        mapping: &mut Document,
        path: &mut Vec<EntityRef>,
    ) -> OdmResult<Value> {
        match value {
            Value::Document(nested) => Ok(Value::Document(self.incoming_document(nested, collection, path)?)),
            Value::Array(values) => values
                .into_iter()
                .map(|value| self.incoming_value(value, collection, mapping, path))
                .collect::<OdmResult<Vec<Value>>>()
                .map(Value::Array),
            Value::Entity(entity) => self.incoming_entity(&entity, collection, mapping, path),
            Value::Lazy(lazy) => {
                mapping.insert_raw(lazy.id().mapping_key(), Value::String(lazy.type_name().to_string()));
                Ok(Value::Id(lazy.id().clone()))
            }
            other => Ok(other),
        }
    }

    fn incoming_entity(
        &self,
        entity: &EntityRef,
        collection: Option<&Collection>,
        mapping: &mut Document,
        path: &mut Vec<EntityRef>,
    ) -> OdmResult<Value> {
        let in_progress = path.iter().any(|outer| outer.ptr_eq(entity));

        if let Some(collection) = collection {
            let database = collection.database();
            let own_collection = entity.read().collection(database)?;

            if own_collection.is_some() {
                let id = if in_progress {
                    // the outer save writes it
                    self.reserve_id(entity)
                } else {
                    if entity.id().is_none() {
                        entity.persist_within(database, path)?;
                    } else {
                        entity.save_within(database, path)?;
                    }
                    match entity.id() {
                        Some(id) => id,
                        None => {
                            log::error!("{:?} has no id after being saved", entity);
                            return Err(OdmError::new(
                                &format!("{:?} has no id after being saved", entity),
                                ErrorKind::InternalError,
                            ));
                        }
                    }
                };

                let type_name = entity.type_name();
                log::debug!("Storing {} {} as a reference", type_name, id);
                mapping.insert_raw(id.mapping_key(), Value::String(type_name));
                return Ok(Value::Id(id));
            }
        }

        if in_progress {
            log::error!("{:?} cannot be embedded within itself", entity);
            return Err(OdmError::new(
                &format!("{:?} cannot be embedded within itself", entity),
                ErrorKind::ObjectMappingError,
            ));
        }

        log::debug!("Embedding {:?}", entity);
        path.push(entity.clone());
        let document = entity.read().to_document();
        let result = self.incoming_document(document, collection, path);
        path.pop();
        Ok(Value::Document(result?))
    }

    /// Returns the identifier of an entity whose save is still in progress,
    /// assigning one if it has none yet.
    fn reserve_id(&self, entity: &EntityRef) -> DocumentId {
        if let Some(id) = entity.id() {
            return id;
        }
        let id = DocumentId::generate();
        log::debug!("Reserving id {} for {:?}", id, entity);
        entity.write().state_mut().set_id(id.clone());
        id
    }

    /// Turns a stored document back into live values.
    ///
    /// Identifiers listed in `_types_mapping` become [Value::Lazy] when lazy
    /// loading is enabled, or fully retrieved entities otherwise. Nested
    /// documents carrying a `_type` become entities; other nested documents
    /// are transformed recursively.
    ///
    /// A reference whose type cannot be resolved is left as a raw
    /// identifier, as is every reference when no `collection` is given.
    /// Within one call, every reference to the same stored document yields
    /// the same instance, so stored cycles load as cycles.
    ///
    /// # Errors
    ///
    /// * [ErrorKind::UnknownType] if an embedded document names an
    ///   unregistered type.
    /// * [ErrorKind::NotFound] if an eagerly loaded reference points to a
    ///   missing document.
    pub fn transform_outgoing(&self, document: Document, collection: Option<&Collection>) -> OdmResult<Document> {
        self.outgoing_document(document, collection, &mut Loading::new())
    }

    fn outgoing_document(&self, document: Document, collection: Option<&Collection>, loading: &mut Loading) -> OdmResult<Document> {
        let mapping = document.types_mapping().cloned();
        let mut result = Document::new();

        for (key, value) in document {
            if key == DOC_ID || key == DOC_TYPE || key == DOC_TYPES_MAPPING {
                result.insert_raw(key, value);
                continue;
            }

            let value = self.outgoing_value(value, mapping.as_ref(), collection, loading)?;
            result.insert_raw(key, value);
        }
        Ok(result)
    }

    fn outgoing_value(
        &self,
        value: Value,
        mapping: Option<&Document>,
        collection: Option<&Collection>,
        loading: &mut Loading,
    ) -> OdmResult<Value> {
        match value {
            Value::Id(id) => self.resolve_reference(id, mapping, collection, loading),
            Value::Document(nested) => {
                if nested.contains_key(DOC_TYPE) {
                    let nested = self.outgoing_document(nested, collection, loading)?;
                    Ok(Value::Entity(self.instantiate(&nested)?))
                } else {
                    Ok(Value::Document(self.outgoing_document(nested, collection, loading)?))
                }
            }
            Value::Array(values) => values
                .into_iter()
                .map(|value| self.outgoing_value(value, mapping, collection, loading))
                .collect::<OdmResult<Vec<Value>>>()
                .map(Value::Array),
            other => Ok(other),
        }
    }

    fn resolve_reference(
        &self,
        id: DocumentId,
        mapping: Option<&Document>,
        collection: Option<&Collection>,
        loading: &mut Loading,
    ) -> OdmResult<Value> {
        let tag = match mapping
            .and_then(|mapping| mapping.get(&id.mapping_key()))
            .and_then(Value::as_string)
        {
            Some(tag) => tag,
            None => return Ok(Value::Id(id)),
        };

        let collection = match collection {
            Some(collection) => collection,
            None => {
                log::debug!("No collection to resolve {} {}, keeping the id", tag, id);
                return Ok(Value::Id(id));
            }
        };
        let database = collection.database();

        let entity = match self.registry.resolve(tag) {
            Ok(entity) => entity,
            Err(err) => {
                log::warn!("Keeping reference {} unresolved: {}", id, err);
                return Ok(Value::Id(id));
            }
        };

        let target = entity.read().collection(database);
        let target = match target {
            Ok(Some(target)) => target,
            Ok(None) => {
                log::warn!("Keeping reference {} unresolved: {} has no collection", id, tag);
                return Ok(Value::Id(id));
            }
            Err(err) => {
                log::warn!("Keeping reference {} unresolved: {}", id, err);
                return Ok(Value::Id(id));
            }
        };

        if database.lazy_loading_enabled() {
            log::debug!("Loading {} {} lazily", tag, id);
            return Ok(Value::Lazy(LazyReference::new(target, id, tag)));
        }

        let key = (target.namespace().to_string(), id);
        if let Some(loaded) = loading.get(&key) {
            log::debug!("{} {} is already being loaded", tag, key.1);
            return Ok(Value::Entity(loaded.clone()));
        }

        log::debug!("Loading {} {} eagerly", tag, key.1);
        let mut query = Document::new();
        query.set_id(key.1.clone());
        match target.find_stored(&query)? {
            Some(document) => {
                self.load_into(&entity, document, &target, loading)?;
                Ok(Value::Entity(entity))
            }
            None => {
                log::error!("No object with id {} in {}'s collection", key.1, tag);
                Err(OdmError::new(
                    &format!("No object with id {} in {}'s collection", key.1, tag),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    /// Populates `entity` with a document stored in `collection`, resolving
    /// the references it holds.
    pub(crate) fn load_entity(&self, entity: &EntityRef, document: Document, collection: &Collection) -> OdmResult<()> {
        self.load_into(entity, document, collection, &mut Loading::new())
    }

    fn load_into(&self, entity: &EntityRef, document: Document, collection: &Collection, loading: &mut Loading) -> OdmResult<()> {
        if let Some(id) = document.id() {
            loading.insert((collection.namespace().to_string(), id), entity.clone());
        }
        let document = self.outgoing_document(document, Some(collection), loading)?;
        entity.write().load_document(&document)
    }

    /// Maps a top-level stored document to a new entity.
    ///
    /// Fails with [ErrorKind::MissingField] if the document has no `_type`.
    pub fn deserialize(&self, document: Document, collection: Option<&Collection>) -> OdmResult<EntityRef> {
        if !document.contains_key(DOC_TYPE) {
            log::error!("Cannot map a document without _type to an entity");
            return Err(OdmError::new(
                "Cannot map a document without _type to an entity",
                ErrorKind::MissingField,
            ));
        }

        let entity = self.resolve_type(&document)?;
        match collection {
            Some(collection) => self.load_entity(&entity, document, collection)?,
            None => {
                let document = self.transform_outgoing(document, None)?;
                entity.write().load_document(&document)?;
            }
        }
        Ok(entity)
    }

    fn instantiate(&self, document: &Document) -> OdmResult<EntityRef> {
        let entity = self.resolve_type(document)?;
        entity.write().load_document(document)?;
        Ok(entity)
    }

    fn resolve_type(&self, document: &Document) -> OdmResult<EntityRef> {
        match document.type_name() {
            Some(tag) => self.registry.resolve(tag),
            None => {
                log::error!("Invalid _type {:?}", document.get(DOC_TYPE));
                Err(OdmError::new(
                    &format!("Invalid _type {:?}", document.get(DOC_TYPE)),
                    ErrorKind::ObjectMappingError,
                ))
            }
        }
    }
}
