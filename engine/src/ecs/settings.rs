//! Compile-time component, tag and signature registry.
//!
//! A settings type is a zero-sized marker that fixes, for the whole program,
//! which component types, tag types and signatures an ECS world knows about.
//! It is normally declared with [`ecs_settings!`](crate::ecs::ecs_settings),
//! which implements every trait in this module.
//!
//! # Bit Layout
//!
//! Component `C` occupies bit `component_id::<S, C>()`, and tag `T` occupies
//! bit `component_count::<S>() + tag_id::<S, T>()`. Each signature owns one
//! precomputed [`BitSet`] with exactly the bits of its members set.
//!
//! Asking for the id of a type that was not declared does not compile: the
//! lookup is a trait bound, not a runtime search.

use super::bitset::{BitSet, Blocks, SignatureBitsets};
use crate::memory::{AllocVec, Allocator};

/// Entity storage tuning.
///
/// Growth from capacity `c` goes to `(c + grow_amount) * grow_multiplier`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options {
    /// Entities allocated up front.
    pub start_capacity: usize,
    /// Added to the capacity before multiplying.
    pub grow_amount: usize,
    /// Capacity multiplier applied on each growth.
    pub grow_multiplier: f32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            start_capacity: 42,
            grow_amount: 5,
            grow_multiplier: 2.0,
        }
    }
}

impl Options {
    /// Capacity to grow to from `current`. Always larger than `current`.
    pub fn next_capacity(&self, current: usize) -> usize {
        let grown = ((current + self.grow_amount) as f32 * self.grow_multiplier) as usize;
        grown.max(current + 1)
    }
}

/// Per-component columns for every entity slot.
///
/// Rows are filled with `Default` values as the columns grow, so every
/// component type of a world must implement [`Default`].
pub trait ComponentStorage: 'static {
    /// Empty columns on `alloc`.
    fn new_in(alloc: Allocator) -> Self;

    /// Extend every column with default values up to `capacity` rows.
    fn grow_to(&mut self, capacity: usize);
}

/// The closed world of component, tag and signature types.
pub trait Settings: Sized + 'static {
    type Storage: ComponentStorage;

    /// Inline words of every entity and signature bitset, wide enough for
    /// [`Settings::BIT_COUNT`] bits.
    type Blocks: Blocks;

    const COMPONENT_COUNT: usize;
    const TAG_COUNT: usize;
    const SIGNATURE_COUNT: usize;

    /// Width of every entity and signature bitset.
    const BIT_COUNT: usize = Self::COMPONENT_COUNT + Self::TAG_COUNT;

    /// One bitset per signature, built on first use.
    fn signature_bitsets() -> &'static SignatureBitsets<Self::Blocks>;

    /// Entity storage tuning for managers of this world.
    fn options() -> Options {
        Options::default()
    }
}

/// `C` is a declared component of this world.
pub trait HasComponent<C: 'static>: Settings {
    /// Position of `C` in the component list.
    const ID: usize;

    fn column(storage: &Self::Storage) -> &AllocVec<C>;

    fn column_mut(storage: &mut Self::Storage) -> &mut AllocVec<C>;
}

/// `T` is a declared tag of this world.
pub trait HasTag<T>: Settings {
    /// Position of `T` in the tag list.
    const ID: usize;
}

/// `Sig` is a declared signature of this world.
pub trait HasSignature<Sig>: Settings {
    /// Position of `Sig` in the signature list.
    const ID: usize;

    /// Mutable references to the signature's components, in declaration
    /// order. Tags contribute nothing.
    type Fetch<'a>
    where
        Self::Storage: 'a;

    /// Borrow the signature's components stored in `row`.
    fn fetch(storage: &mut Self::Storage, row: usize) -> Self::Fetch<'_>;
}

#[inline]
pub const fn component_count<S: Settings>() -> usize {
    S::COMPONENT_COUNT
}

#[inline]
pub const fn tag_count<S: Settings>() -> usize {
    S::TAG_COUNT
}

#[inline]
pub const fn signature_count<S: Settings>() -> usize {
    S::SIGNATURE_COUNT
}

#[inline]
pub const fn bit_count<S: Settings>() -> usize {
    S::BIT_COUNT
}

#[inline]
pub const fn component_id<S: HasComponent<C>, C: 'static>() -> usize {
    <S as HasComponent<C>>::ID
}

#[inline]
pub const fn tag_id<S: HasTag<T>, T>() -> usize {
    <S as HasTag<T>>::ID
}

#[inline]
pub const fn signature_id<S: HasSignature<Sig>, Sig>() -> usize {
    <S as HasSignature<Sig>>::ID
}

/// Bit index of component `C`.
#[inline]
pub const fn component_bit<S: HasComponent<C>, C: 'static>() -> usize {
    component_id::<S, C>()
}

/// Bit index of tag `T`.
#[inline]
pub const fn tag_bit<S: HasTag<T>, T>() -> usize {
    S::COMPONENT_COUNT + tag_id::<S, T>()
}

/// Precomputed bitset of signature `Sig`.
#[inline]
pub fn signature_bitset<S: HasSignature<Sig>, Sig>() -> &'static BitSet<S::Blocks> {
    S::signature_bitsets().get(signature_id::<S, Sig>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::ecs_settings;

    #[derive(Default)]
    struct C0;
    #[derive(Default)]
    struct C1;
    #[derive(Default)]
    struct C2;
    struct T0;
    struct T1;

    ecs_settings! {
        struct World {
            components: [C0, C1, C2],
            tags: [T0, T1],
            signatures: {
                Nothing: [],
                Pair: [C0, C2],
                Marked: [T1, T0],
                Mixed: [C1, T1],
            },
        }
    }

    // ==================== Ids ====================

    #[test]
    fn ids_are_dense_declaration_positions() {
        assert_eq!(component_id::<World, C0>(), 0);
        assert_eq!(component_id::<World, C1>(), 1);
        assert_eq!(component_id::<World, C2>(), 2);

        assert_eq!(tag_id::<World, T0>(), 0);
        assert_eq!(tag_id::<World, T1>(), 1);

        assert_eq!(signature_id::<World, Nothing>(), 0);
        assert_eq!(signature_id::<World, Pair>(), 1);
        assert_eq!(signature_id::<World, Marked>(), 2);
        assert_eq!(signature_id::<World, Mixed>(), 3);
    }

    #[test]
    fn counts_and_bit_layout() {
        assert_eq!(component_count::<World>(), 3);
        assert_eq!(tag_count::<World>(), 2);
        assert_eq!(signature_count::<World>(), 4);
        assert_eq!(bit_count::<World>(), 5);

        assert_eq!(component_bit::<World, C2>(), 2);
        assert_eq!(tag_bit::<World, T0>(), 3);
        assert_eq!(tag_bit::<World, T1>(), 4);
    }

    // ==================== Signature Bitsets ====================

    #[test]
    fn signature_bitsets_hold_exactly_their_members() {
        // Given
        let table = World::signature_bitsets();

        // Then
        assert_eq!(table.len(), 4);
        assert!(signature_bitset::<World, Nothing>().is_clear());
        assert_eq!(signature_bitset::<World, Pair>().to_string(), "00101");
        assert_eq!(signature_bitset::<World, Marked>().to_string(), "11000");
        assert_eq!(signature_bitset::<World, Mixed>().to_string(), "10010");
        assert!(table.iter().all(|bits| bits.len() == 5));
    }

    #[test]
    fn signature_bitsets_are_built_once() {
        assert!(std::ptr::eq(World::signature_bitsets(), World::signature_bitsets()));
    }

    // ==================== Options ====================

    #[test]
    fn default_options_and_growth() {
        let options = World::options();

        assert_eq!(options, Options::default());
        assert_eq!(options.start_capacity, 42);
        assert_eq!(options.next_capacity(42), 94);
        assert_eq!(options.next_capacity(0), 10);
    }

    #[test]
    fn growth_always_makes_progress() {
        let options = Options {
            start_capacity: 0,
            grow_amount: 0,
            grow_multiplier: 1.0,
        };

        assert_eq!(options.next_capacity(7), 8);
    }
}
