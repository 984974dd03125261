use log::info;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};

use crate::{
    memory::Allocator,
    storage::{DataManager, SharedBlackboard, StorageError},
};

/// Engine-wide state handed to subsystems by reference.
///
/// Owns the allocator every container of the engine draws from, the named
/// globals and a blackboard that can be shared with worker threads.
pub struct Context {
    alloc: Allocator,
    globals: DataManager,
    blackboard: SharedBlackboard,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::new_in(Allocator::default())
    }

    pub fn new_in(alloc: Allocator) -> Self {
        info!("context: created on the {} resource", alloc.resource().name());
        Self {
            globals: DataManager::new_in(alloc.clone()),
            blackboard: SharedBlackboard::new_in(alloc.clone()),
            alloc,
        }
    }

    #[inline]
    pub fn allocator(&self) -> &Allocator {
        &self.alloc
    }

    #[inline]
    pub fn globals(&self) -> &DataManager {
        &self.globals
    }

    #[inline]
    pub fn globals_mut(&mut self) -> &mut DataManager {
        &mut self.globals
    }

    #[inline]
    pub fn blackboard(&self) -> &SharedBlackboard {
        &self.blackboard
    }

    /// Store a named global, replacing any previous value of the same type.
    pub fn set_global<T: Send + Sync + 'static>(&mut self, name: &str, value: T) -> Result<(), StorageError> {
        self.globals.emplace(name, value).map(drop)
    }

    pub fn global<T: 'static>(&self, name: &str) -> Result<MappedRwLockReadGuard<'_, T>, StorageError> {
        self.globals.get(name)
    }

    pub fn global_mut<T: 'static>(&mut self, name: &str) -> Result<MappedRwLockWriteGuard<'_, T>, StorageError> {
        self.globals.get_mut(name)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;
    use crate::memory::TestResource;

    #[test]
    fn globals_round_trip_by_name() {
        // Given
        let mut context = Context::new();

        // When
        context.set_global("tick_rate", 60_u32).unwrap();
        *context.global_mut::<u32>("tick_rate").unwrap() += 60;

        // Then
        assert_eq!(*context.global::<u32>("tick_rate").unwrap(), 120);
        assert!(matches!(
            context.global::<f32>("tick_rate"),
            Err(StorageError::Missing { .. })
        ));
    }

    #[test]
    fn containers_use_the_context_allocator() {
        // Given
        let resource = Arc::new(TestResource::new());
        let mut context = Context::new_in(Allocator::new(resource.clone()));

        // When
        context.set_global("name", String::from("meme")).unwrap();

        // Then
        assert_eq!(context.allocator(), &Allocator::new(resource.clone()));
        assert!(resource.stats().allocations > 0);
        drop(context);
        assert_eq!(resource.stats().bytes_in_use, 0);
    }

    #[test]
    fn blackboard_is_shared_with_workers() {
        // Given
        let context = Context::new();
        let board = context.blackboard().clone();

        // When
        thread::spawn(move || {
            board.with(|board| board.emplace("progress", 0.5_f32).map(drop)).unwrap();
        })
        .join()
        .unwrap();

        // Then
        let value = context.blackboard().with(|board| board.get::<f32>("progress").map(|v| *v));
        assert_eq!(value, Ok(0.5));
    }
}
