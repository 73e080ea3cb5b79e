use std::any::Any;

use crate::collection::Collection;
use crate::common::{Value, DOC_ID, DOC_TYPE};
use crate::database::Database;
use crate::document::{Document, DocumentId};
use crate::entity::EntityState;
use crate::errors::{ErrorKind, OdmError, OdmResult};

/// Access to the concrete type behind a trait object.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A record that can be converted to and from a stored [Document].
///
/// Implementors hold an [EntityState] and name the collection they are
/// stored in. Everything else (dirty tracking, `to_document`,
/// `load_document`) is provided.
///
/// # Examples
///
/// ```rust,ignore
/// use lisogo::prelude::*;
///
/// #[derive(Default)]
/// struct Note {
///     state: EntityState,
/// }
///
/// impl Entity for Note {
///     fn type_name(&self) -> &str {
///         "Note"
///     }
///
///     fn state(&self) -> &EntityState {
///         &self.state
///     }
///
///     fn state_mut(&mut self) -> &mut EntityState {
///         &mut self.state
///     }
///
///     fn collection(&self, db: &Database) -> OdmResult<Option<Collection>> {
///         Ok(Some(db.collection("notes")?))
///     }
/// }
/// ```
pub trait Entity: AsAny + Send + Sync {
    /// The type tag written as `_type`.
    fn type_name(&self) -> &str;

    fn state(&self) -> &EntityState;

    fn state_mut(&mut self) -> &mut EntityState;

    /// Returns the collection entities of this type are stored in, or `None`
    /// when the type can only be embedded in another entity.
    fn collection(&self, db: &Database) -> OdmResult<Option<Collection>>;

    fn id(&self) -> Option<DocumentId> {
        self.state().id().cloned()
    }

    fn is_modified(&self) -> bool {
        self.state().is_modified()
    }

    fn fields_to_store(&self) -> Vec<(String, Value)> {
        self.state().fields_to_store().to_vec()
    }

    /// Builds the stored mapping of this entity: the stored fields, `_id`
    /// once persisted and `_type`.
    fn to_document(&self) -> Document {
        let mut document = Document::new();
        if let Some(id) = self.id() {
            document.set_id(id);
        }

        for (name, value) in self.state().fields_to_store() {
            document.insert_raw(name.clone(), value.clone());
        }

        document.insert_raw(DOC_TYPE.to_string(), Value::String(self.type_name().to_string()));
        document
    }

    /// Populates this entity from a stored mapping and leaves it unmodified.
    ///
    /// # Errors
    ///
    /// * [ErrorKind::MissingField] if `_type` is absent.
    /// * [ErrorKind::TypeMismatch] if `_type` names another type.
    /// * [ErrorKind::InvalidId] if `_id` is not an identifier.
    fn load_document(&mut self, document: &Document) -> OdmResult<()> {
        match document.get(DOC_TYPE) {
            None => {
                log::error!("Cannot load {}: the stored mapping has no _type", self.type_name());
                return Err(OdmError::new(
                    &format!("Cannot load {}: the stored mapping has no _type", self.type_name()),
                    ErrorKind::MissingField,
                ));
            }
            Some(Value::String(type_name)) if type_name == self.type_name() => {}
            Some(other) => {
                log::error!("Cannot load a {:?} mapping into a {}", other, self.type_name());
                return Err(OdmError::new(
                    &format!("Cannot load a {:?} mapping into a {}", other, self.type_name()),
                    ErrorKind::TypeMismatch,
                ));
            }
        }

        let id = match document.get(DOC_ID) {
            None => None,
            Some(value) => match value.to_document_id() {
                Some(id) => Some(id),
                None => {
                    log::error!("Invalid _id {:?} for {}", value, self.type_name());
                    return Err(OdmError::new(
                        &format!("Invalid _id {:?} for {}", value, self.type_name()),
                        ErrorKind::InvalidId,
                    ));
                }
            },
        };

        self.state_mut().load(document, id);
        Ok(())
    }
}
