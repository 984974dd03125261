//! Type-erased keyed storage, flat ordered containers and a compile-time
//! entity component system, all drawing memory from pluggable allocators.

// Lets `::meme_engine::...` paths emitted by `ecs_settings!` resolve inside
// this crate as well.
extern crate self as meme_engine;

pub mod any;
pub mod context;
pub mod ds;
pub mod ecs;
pub mod error;
pub mod logging;
pub mod memory;
pub mod storage;
pub mod types;

pub use context::Context;
pub use error::{Error, Result};
