//! Collections of entities and the cursors reading them.
//!
//! A [Collection] wraps one stored collection: every write goes through the
//! transformer's incoming path, every read through deserialization and the
//! collection's identity cache.

#[allow(clippy::module_inception)]
mod collection;
mod cursor;
mod find_options;
mod write_result;

pub use collection::*;
pub use cursor::*;
pub use find_options::*;
pub use write_result::*;
