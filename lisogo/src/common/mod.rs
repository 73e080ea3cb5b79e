//! Shared building blocks: the storable [Value] union, reserved field names
//! and the lock helpers used by every handle in the crate.

mod constants;
mod type_utils;
mod value;

pub use constants::*;
pub use type_utils::*;
pub use value::*;
