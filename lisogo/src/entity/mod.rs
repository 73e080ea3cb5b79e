//! The entity contract and its supporting types.
//!
//! An [Entity] is a live record with tracked changes. It is shared through
//! an [EntityRef], instantiated from type tags by the [TypeRegistry] and may
//! appear in another entity's fields as a [LazyReference] when lazy loading
//! is enabled.

#[allow(clippy::module_inception)]
mod entity;
mod entity_ref;
mod lazy;
mod registry;
mod state;

pub use entity::*;
pub use entity_ref::*;
pub use lazy::*;
pub use registry::*;
pub use state::*;
