use std::ops::{Deref, DerefMut};

use super::Storage;
use crate::memory::Allocator;

/// Engine-wide store of named, arbitrarily typed globals.
///
/// A thin owner of a [`Storage`]; every storage operation is available
/// through deref. Unlike a [`Blackboard`](super::Blackboard) it cannot be
/// cloned, so each value has exactly one owning map.
#[derive(Default)]
pub struct DataManager {
    storage: Storage,
}

impl DataManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_in(alloc: Allocator) -> Self {
        Self {
            storage: Storage::new_in(alloc),
        }
    }

    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

impl Deref for DataManager {
    type Target = Storage;

    #[inline]
    fn deref(&self) -> &Storage {
        &self.storage
    }
}

impl DerefMut for DataManager {
    #[inline]
    fn deref_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[derive(Debug, Default, PartialEq)]
    struct FrameTimer {
        frames: u64,
    }

    #[test]
    fn stores_named_globals() {
        // Given
        let mut globals = DataManager::new();

        // When
        globals.emplace("timer", FrameTimer::default()).unwrap();
        globals.get_mut::<FrameTimer>("timer").unwrap().frames += 1;

        // Then
        assert_eq!(*globals.get::<FrameTimer>("timer").unwrap(), FrameTimer { frames: 1 });
    }

    #[test]
    fn wrong_type_is_rejected_without_damage() {
        let mut globals = DataManager::new();
        globals.emplace("id", 5_i32).unwrap();

        assert!(matches!(globals.get::<f32>("id"), Err(StorageError::Missing { .. })));
        assert_eq!(*globals.get::<i32>("id").unwrap(), 5);
    }
}
