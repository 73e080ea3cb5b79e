use im::OrdMap;

use crate::common::{Value, DOC_ID, DOC_TYPE, DOC_TYPES_MAPPING};
use crate::document::DocumentId;
use crate::errors::{ErrorKind, OdmError, OdmResult};
use std::borrow::Cow;
use std::fmt::Debug;

/// A stored mapping: the storable form of an entity.
///
/// A document is an ordered map from field names to [Value]s. The fields
/// below carry metadata written by the mapper:
///
/// * `_id` - the identifier of the document, present once it is persisted.
/// * `_type` - the type tag of the entity the document was produced from.
/// * `_types_mapping` - a nested document from
///   [DocumentId::mapping_key](crate::document::DocumentId::mapping_key) to
///   type tag, present only when at least one field is stored as a reference.
///
/// Documents are backed by a persistent ordered map, so cloning is cheap and
/// clones never observe each other's mutations.
#[derive(Clone, PartialEq, Default)]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::InvalidOperation] for an empty key and with
    /// [ErrorKind::InvalidId] when `_id` is given a value that cannot
    /// identify a document. Accepted `_id` values are normalized to
    /// [Value::Id].
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let mut doc = Document::new();
    /// doc.put("title", "hi")?;
    /// doc.put("_id", 42i64)?;
    /// assert_eq!(doc.id(), Some(DocumentId::Int(42)));
    /// ```
    pub fn put<'a, T: Into<Value>>(&mut self, key: impl Into<Cow<'a, str>>, value: T) -> OdmResult<()> {
        let key = key.into();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(OdmError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        let value = value.into();
        if key == DOC_ID {
            return match value.to_document_id() {
                Some(id) => {
                    self.data.insert(DOC_ID.to_string(), Value::Id(id));
                    Ok(())
                }
                None => {
                    log::error!("Value {:?} cannot be used as document id", value);
                    Err(OdmError::new(
                        &format!("Value {:?} cannot be used as document id", value),
                        ErrorKind::InvalidId,
                    ))
                }
            };
        }

        self.data.insert(key.into_owned(), value);
        Ok(())
    }

    /// Returns the value associated with `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the nested document stored at `key`, if `key` holds one.
    pub fn get_document(&self, key: &str) -> Option<&Document> {
        self.data.get(key).and_then(Value::as_document)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Removes `key` and returns its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Returns the `_id` of this document, if it has one.
    pub fn id(&self) -> Option<DocumentId> {
        self.data.get(DOC_ID).and_then(Value::to_document_id)
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Sets `_id`. Unlike [Document::put] this cannot fail.
    pub fn set_id(&mut self, id: DocumentId) {
        self.data.insert(DOC_ID.to_string(), Value::Id(id));
    }

    /// Returns the `_type` tag of this document, if present.
    pub fn type_name(&self) -> Option<&str> {
        self.data
            .get(DOC_TYPE)
            .and_then(Value::as_string)
            .map(String::as_str)
    }

    /// Returns the `_types_mapping` metadata, if present.
    pub fn types_mapping(&self) -> Option<&Document> {
        self.get_document(DOC_TYPES_MAPPING)
    }

    /// Returns a copy holding only `fields`, plus `_id` and the mapping
    /// metadata so the copy can still be mapped back to an entity.
    pub fn project(&self, fields: &[String]) -> Document {
        self.data
            .iter()
            .filter(|(key, _)| {
                key.as_str() == DOC_ID
                    || key.as_str() == DOC_TYPE
                    || key.as_str() == DOC_TYPES_MAPPING
                    || fields.iter().any(|field| field == *key)
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Inserts without validation; callers guarantee a non-empty key.
    pub(crate) fn insert_raw(&mut self, key: String, value: Value) {
        self.data.insert(key, value);
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = im::ordmap::ConsumingIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

#[doc(hidden)]
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// # Examples
///
/// ```rust,ignore
/// use lisogo::doc;
///
/// let note = doc! {
///     title: "hi",
///     body: "world",
///     meta: { views: 3 },
///     tags: ["a", "b"],
/// };
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::document::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            #[allow(unused_mut)]
            let mut doc = $crate::document::Document::new();
            $(
                doc.put($crate::document::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro converting values for [doc!].
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
