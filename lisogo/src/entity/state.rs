use indexmap::{IndexMap, IndexSet};
use once_cell::sync::OnceCell;

use crate::common::{Value, DEFAULT_IGNORED_FIELDS, DOC_ID, METADATA_FIELDS, RESERVED_PREFIX};
use crate::document::{Document, DocumentId};
use crate::entity::{EntityRef, LazyReference};

/// The mapped state of an entity: its identifier, its dirty flag and the
/// named fields that make up its business data.
///
/// Every write goes through [EntityState::set], which keeps the `modified`
/// flag and the cached list of stored fields in sync:
///
/// * private names (empty or starting with `_`) and ignored names are kept
///   but never stored and never mark the entity as modified;
/// * assigning a different value to a stored field, or assigning a field for
///   the first time, marks the entity as modified;
/// * once modified, the entity stays modified until it is loaded from or
///   saved to the store.
pub struct EntityState {
    id: Option<DocumentId>,
    modified: bool,
    fields: IndexMap<String, Value>,
    ignored: IndexSet<String>,
    stored_fields: OnceCell<Vec<(String, Value)>>,
}

impl EntityState {
    /// Creates an empty, unmodified state ignoring `id` and `modified`.
    pub fn new() -> Self {
        EntityState {
            id: None,
            modified: false,
            fields: IndexMap::new(),
            ignored: DEFAULT_IGNORED_FIELDS.iter().map(|f| f.to_string()).collect(),
            stored_fields: OnceCell::new(),
        }
    }

    /// Adds `names` to the ignore-list.
    pub fn with_ignored(mut self, names: &[&str]) -> Self {
        for name in names {
            self.ignore(name);
        }
        self
    }

    /// Excludes `name` from the stored form of the entity.
    pub fn ignore(&mut self, name: &str) {
        if self.ignored.insert(name.to_string()) {
            self.invalidate();
        }
    }

    /// Returns `true` if `name` never appears in the stored form.
    pub fn is_ignored(&self, name: &str) -> bool {
        name.is_empty() || name.starts_with(RESERVED_PREFIX) || self.ignored.contains(name)
    }

    pub fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    /// Sets the identifier. This never marks the entity as modified.
    pub fn set_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Assigns `value` to the field `name`.
    pub fn set<V: Into<Value>>(&mut self, name: &str, value: V) {
        let value = value.into();

        if !self.is_ignored(name) {
            let changed = match self.fields.get(name) {
                Some(current) => *current != value,
                None => true,
            };

            if changed {
                self.invalidate();
                if !self.modified {
                    log::debug!("Field {} modified", name);
                    self.modified = true;
                }
            }
        }

        self.fields.insert(name.to_string(), value);
    }

    /// Removes the field `name` and returns its value.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        let removed = self.fields.shift_remove(name);
        if removed.is_some() && !self.is_ignored(name) {
            self.invalidate();
            self.modified = true;
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_string).map(String::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64).copied()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64).copied()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool).copied()
    }

    pub fn get_entity(&self, name: &str) -> Option<&EntityRef> {
        self.get(name).and_then(Value::as_entity)
    }

    pub fn get_lazy(&self, name: &str) -> Option<&LazyReference> {
        self.get(name).and_then(Value::as_lazy)
    }

    pub fn get_document(&self, name: &str) -> Option<&Document> {
        self.get(name).and_then(Value::as_document)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the fields written by `to_document`, in assignment order.
    ///
    /// The list is computed once and reused until a stored field changes.
    pub fn fields_to_store(&self) -> &[(String, Value)] {
        self.stored_fields.get_or_init(|| {
            self.fields
                .iter()
                .filter(|(name, _)| !self.is_ignored(name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect()
        })
    }

    pub fn field_names_to_store(&self) -> Vec<&str> {
        self.fields
            .keys()
            .filter(|name| !self.is_ignored(name))
            .map(String::as_str)
            .collect()
    }

    /// Replaces the state with the content of a stored mapping.
    ///
    /// Every field except `_type` and `_types_mapping` is copied without
    /// dirty tracking; `_id` becomes the identifier. The entity is left
    /// unmodified.
    pub(crate) fn load(&mut self, document: &Document, id: Option<DocumentId>) {
        if let Some(id) = id {
            self.id = Some(id);
        }

        for (key, value) in document.iter() {
            if key == DOC_ID || METADATA_FIELDS.contains(&key.as_str()) {
                continue;
            }
            self.fields.insert(key.clone(), value.clone());
        }

        self.invalidate();
        self.modified = false;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.modified = false;
    }

    fn invalidate(&mut self) {
        self.stored_fields.take();
    }
}

impl Default for EntityState {
    fn default() -> Self {
        EntityState::new()
    }
}

impl std::fmt::Debug for EntityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityState")
            .field("id", &self.id)
            .field("modified", &self.modified)
            .field("fields", &self.fields)
            .finish()
    }
}
