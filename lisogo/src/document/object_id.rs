use crate::errors::{ErrorKind, OdmError, OdmResult};
use crate::ID_GENERATOR;
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// A store-generated document identifier.
///
/// Identifiers come from a process-wide snowflake generator, so they are
/// unique, roughly ordered by creation time and need no coordination with
/// the store. The textual form is 16 lowercase hex digits, which is also the
/// key used for the identifier in a `_types_mapping` entry (see
/// [DocumentId::mapping_key](crate::document::DocumentId::mapping_key)).
///
/// # Examples
///
/// ```rust,ignore
/// use lisogo::document::ObjectId;
///
/// let id = ObjectId::new();
/// let parsed: ObjectId = id.to_string().parse()?;
/// assert_eq!(id, parsed);
/// ```
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy, serde::Deserialize, serde::Serialize)]
pub struct ObjectId {
    id_value: u64,
}

impl ObjectId {
    /// Generates a new unique `ObjectId`.
    pub fn new() -> Self {
        ObjectId {
            id_value: ID_GENERATOR.get_id(),
        }
    }

    /// Wraps a raw identifier value. Zero is reserved and rejected.
    pub fn create_id(id_value: u64) -> OdmResult<ObjectId> {
        if id_value == 0 {
            log::error!("ObjectId value cannot be zero");
            return Err(OdmError::new(
                "ObjectId value cannot be zero",
                ErrorKind::InvalidId,
            ));
        }
        Ok(ObjectId { id_value })
    }

    pub fn id_value(&self) -> u64 {
        self.id_value
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::new()
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.id_value)
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({:016x})", self.id_value)
    }
}

impl FromStr for ObjectId {
    type Err = OdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 16 {
            log::error!("Invalid ObjectId {:?}: expected 16 hex digits", s);
            return Err(OdmError::new(
                &format!("Invalid ObjectId {:?}: expected 16 hex digits", s),
                ErrorKind::InvalidId,
            ));
        }

        match u64::from_str_radix(s, 16) {
            Ok(value) => ObjectId::create_id(value),
            Err(e) => {
                log::error!("Invalid ObjectId {:?}: {}", s, e);
                Err(OdmError::new(
                    &format!("Invalid ObjectId {:?}: {}", s, e),
                    ErrorKind::InvalidId,
                ))
            }
        }
    }
}
