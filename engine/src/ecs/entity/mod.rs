//! Entity slots and the handles that track them across compaction.
//!
//! An entity is identified by its index in the manager's dense array. That
//! index changes whenever [`Manager::refresh`](super::Manager::refresh)
//! compacts the array, so long-lived references go through an
//! [`EntityHandle`]: a slot in a side table plus the [`Generation`] the slot
//! had when the handle was made. Killing an entity bumps its slot's
//! generation, which invalidates every handle to it.

use std::fmt;

use super::bitset::{BitSet, Blocks};

/// Position of an entity in its manager's dense array.
pub type EntityIndex = usize;

/// How many times a handle slot has been invalidated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u32);

impl Generation {
    /// The first generation of a handle slot.
    pub const FIRST: Self = Self(0);

    /// Get the next generation from the current.
    #[inline]
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// One slot of the dense entity array. The bitset is stored inline in `B`
/// words, so an entity owns no heap memory of its own.
#[derive(Debug, Clone)]
pub struct Entity<B: Blocks> {
    /// Row in the component columns; travels with the entity on compaction.
    pub(crate) data: usize,
    /// Slot in the handle table that points back here.
    pub(crate) handle: usize,
    pub(crate) bitset: BitSet<B>,
    pub(crate) alive: bool,
}

impl<B: Blocks> Entity<B> {
    pub(crate) fn new(slot: usize, width: usize) -> Self {
        Self {
            data: slot,
            handle: slot,
            bitset: BitSet::with_len(width),
            alive: false,
        }
    }

    /// Component row this entity's data lives in.
    #[inline]
    pub fn data_index(&self) -> usize {
        self.data
    }

    /// Components and tags currently attached.
    #[inline]
    pub fn bitset(&self) -> &BitSet<B> {
        &self.bitset
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Side-table entry resolving a handle to the entity's current index.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HandleData {
    pub(crate) entity: EntityIndex,
    pub(crate) generation: Generation,
}

/// Stable reference to an entity that survives compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle {
    pub(crate) slot: usize,
    pub(crate) generation: Generation,
}

impl EntityHandle {
    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot, self.generation.0)
    }
}

/// A handle no longer refers to a live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HandleError {
    #[error("entity handle {0} is stale")]
    Stale(EntityHandle),
}
