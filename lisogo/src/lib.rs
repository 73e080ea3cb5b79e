#![allow(
    dead_code,
    unused_imports,
    clippy::module_inception,
)]
//! # Lisogo - Object-Document Mapper
//!
//! Lisogo maps live, change-tracked records to the flat documents of a
//! document store and back.
//!
//! ## Key Features
//!
//! - **Change tracking**: entities know whether they differ from what is stored
//! - **References and embedding**: an entity field holding another entity is
//!   stored as a reference when the nested type has a collection of its own,
//!   and embedded otherwise
//! - **Identity map**: per-collection caches hand out one live instance per
//!   stored document
//! - **Lazy loading**: references can be resolved on demand
//! - **Pluggable stores**: an in-memory store is included
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lisogo::prelude::*;
//!
//! let registry = TypeRegistry::new("blog.model");
//! registry.register::<Post>().register::<User>();
//!
//! let db = Database::builder().name("blog").registry(registry).open()?;
//!
//! let author = EntityRef::new(User::new("martin"));
//! let post = EntityRef::new(Post::new("hello", &author));
//! post.save(&db)?;
//!
//! // the author was saved on the way and is stored as a reference
//! assert!(author.id().is_some());
//! ```
//!
//! ## Modules
//!
//! - [`cache`] - Identity caches
//! - [`collection`] - Collections, cursors and find options
//! - [`common`] - Values and constants
//! - [`database`] - The database handle
//! - [`document`] - Stored documents and identifiers
//! - [`entity`] - The entity contract, shared handles and the type registry
//! - [`errors`] - Error types
//! - [`store`] - The raw document store
//! - [`transformer`] - Entity graph to document conversion

use crate::document::snowflake::SnowflakeIdGenerator;
use std::sync::LazyLock;

pub mod cache;
pub mod collection;
pub mod common;
pub mod database;
pub mod database_builder;
pub mod database_config;
pub mod document;
pub mod entity;
pub mod errors;
pub mod store;
pub mod transformer;

#[cfg(test)]
pub(crate) mod test_entities;

pub(crate) static ID_GENERATOR: LazyLock<SnowflakeIdGenerator> =
    LazyLock::new(SnowflakeIdGenerator::new);

/// The types needed to define entities and work with a database.
pub mod prelude {
    pub use crate::collection::{limit_to, project, skip_by, Collection, Cursor, FindOptions};
    pub use crate::common::Value;
    pub use crate::database::Database;
    pub use crate::database_builder::DatabaseBuilder;
    pub use crate::document::{Document, DocumentId, ObjectId};
    pub use crate::entity::{Entity, EntityRef, EntityState, LazyReference, SpecOrId, TypeRegistry};
    pub use crate::errors::{ErrorKind, OdmError, OdmResult};
    pub use crate::store::memory::InMemoryStore;
    pub use crate::store::{Store, StoreProvider};
    pub use crate::doc;
}
