//! Stored documents and their identifiers.
//!
//! A [Document] is the flat, possibly nested, mapping the store persists.
//! Documents are identified by a [DocumentId], usually an [ObjectId]
//! generated by the process-wide snowflake generator.

#[allow(clippy::module_inception)]
mod document;
mod document_id;
mod object_id;
pub(crate) mod snowflake;

pub use document::*;
pub use document_id::*;
pub use object_id::*;
