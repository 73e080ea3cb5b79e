use crate::document::ObjectId;
use std::fmt::{Debug, Display};

/// Identifier of a stored document.
///
/// The store generates [ObjectId] values, but documents saved with a string
/// or integer `_id` keep that identifier. All variants are hashable and
/// ordered so they can key the identity cache.
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, serde::Deserialize, serde::Serialize)]
pub enum DocumentId {
    Object(ObjectId),
    String(String),
    Int(i64),
}

impl DocumentId {
    /// Creates a new store-style identifier.
    pub fn generate() -> Self {
        DocumentId::Object(ObjectId::new())
    }

    pub fn as_object_id(&self) -> Option<&ObjectId> {
        match self {
            DocumentId::Object(id) => Some(id),
            _ => None,
        }
    }

    /// The key of this identifier in `_types_mapping`.
    ///
    /// Object ids are written as their hex form. String and integer ids get
    /// an `s:` or `i:` prefix so that `"5"` and `5` never share a key.
    pub fn mapping_key(&self) -> String {
        match self {
            DocumentId::Object(id) => id.to_string(),
            DocumentId::String(id) => format!("s:{}", id),
            DocumentId::Int(id) => format!("i:{}", id),
        }
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentId::Object(id) => write!(f, "{}", id),
            DocumentId::String(id) => write!(f, "{}", id),
            DocumentId::Int(id) => write!(f, "{}", id),
        }
    }
}

impl Debug for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentId::Object(id) => write!(f, "{:?}", id),
            DocumentId::String(id) => write!(f, "{:?}", id),
            DocumentId::Int(id) => write!(f, "{}", id),
        }
    }
}

impl From<ObjectId> for DocumentId {
    fn from(id: ObjectId) -> Self {
        DocumentId::Object(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        DocumentId::String(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        DocumentId::String(id)
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        DocumentId::Int(id)
    }
}
