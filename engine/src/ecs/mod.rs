//! Entity component system over a closed, compile-time world.
//!
//! A world is declared once with [`ecs_settings!`], which fixes its
//! components, tags and signatures. A [`Manager`] then owns entities of that
//! world: each entity is a slot in a dense array with a bitset of attached
//! components and tags, and component values live in one column per type.
//!
//! ```rust,ignore
//! ecs_settings! {
//!     pub struct Game {
//!         components: [Position, Velocity],
//!         tags: [Frozen],
//!         signatures: {
//!             Movable: [Position, Velocity],
//!         },
//!     }
//! }
//!
//! let mut manager = Manager::<Game>::new();
//! let e = manager.create_index();
//! manager.add_component(e, Position::default());
//! manager.add_component(e, Velocity { dx: 1.0, dy: 0.0 });
//! manager.refresh();
//!
//! manager.for_matching::<Movable>(|manager, e| {
//!     let (position, velocity) = manager.query::<Movable>(e).unwrap();
//!     position.x += velocity.dx;
//! });
//! ```
//!
//! Component types must implement `Default`; their columns are grown with
//! default rows. Signatures may only name declared components and tags:
//!
//! ```
//! use meme_engine::ecs::ecs_settings;
//!
//! #[derive(Default)]
//! struct Position;
//! struct Frozen;
//!
//! ecs_settings! {
//!     struct World {
//!         components: [Position],
//!         tags: [Frozen],
//!         signatures: {
//!             Placed: [Position, Frozen],
//!         },
//!     }
//! }
//! # fn main() {}
//! ```
//!
//! ```compile_fail
//! use meme_engine::ecs::ecs_settings;
//!
//! #[derive(Default)]
//! struct Position;
//! struct Frozen;
//!
//! ecs_settings! {
//!     struct World {
//!         components: [Position],
//!         tags: [],
//!         signatures: {
//!             Placed: [Position, Frozen],
//!         },
//!     }
//! }
//! # fn main() {}
//! ```
//!
//! ```compile_fail
//! use meme_engine::ecs::ecs_settings;
//!
//! #[derive(Default)]
//! struct Position;
//!
//! ecs_settings! {
//!     struct World {
//!         components: [Position, Position],
//!         tags: [],
//!         signatures: {},
//!     }
//! }
//! # fn main() {}
//! ```

mod bitset;
pub mod entity;
mod manager;
mod settings;

pub use bitset::{BitSet, Blocks, SignatureBitsets, words_for};
pub use entity::{Entity, EntityHandle, EntityIndex, Generation, HandleError};
pub use manager::{Manager, System};
pub use meme_macros::ecs_settings;
pub use settings::{
    ComponentStorage, HasComponent, HasSignature, HasTag, Options, Settings, bit_count,
    component_bit, component_count, component_id, signature_bitset, signature_count,
    signature_id, tag_bit, tag_count, tag_id,
};
