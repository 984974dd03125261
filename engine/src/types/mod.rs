//! Type identity: stable per-build names, hashes and ordered keys for
//! arbitrary `'static` types.
//!
//! [`TypeKey`] is what the keyed storage engine files categories under. It
//! compares by [`std::any::TypeId`], so two distinct types can never share a
//! category even if their short names collide.
//!
//! Names and hashes derive from [`std::any::type_name`], which is only
//! stable within one build. Nothing here is meant to be persisted.

pub mod hash;
mod key;
mod name;

pub use hash::{fnv1a, hash_str};
pub use key::TypeKey;
pub use name::{hashof, nameof, short_name};
