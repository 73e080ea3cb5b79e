//! Identity caches: one live instance per stored document.

mod cache_registry;
mod identity_cache;

pub use cache_registry::*;
pub use identity_cache::*;
