//! The raw document store the mapper is built on.
//!
//! A store keeps plain [Document](crate::document::Document)s in named
//! collections and knows nothing about entities, type tags or references.
//! Implement [StoreProvider] to plug in another backend; [memory] holds the
//! in-memory store used by default and in tests.

pub mod memory;
mod store;

pub use store::*;
