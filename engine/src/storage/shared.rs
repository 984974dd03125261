use std::{fmt, marker::PhantomData, sync::Arc};

use allocator_api2::alloc::AllocError;
use log::trace;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, Mutex, MutexGuard};

use super::{Blackboard, IntoKey, Key, blackboard::claim};
use crate::{
    any::{Element, TypeMismatch},
    memory::Allocator,
};

/// A [`Blackboard`] behind a mutex, shareable across threads.
///
/// Cloning shares the same board. Every map operation takes the lock;
/// values read through a [`SharedHandle`] only lock their own slot.
#[derive(Clone, Default)]
pub struct SharedBlackboard(Arc<Mutex<Blackboard>>);

impl SharedBlackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_in(alloc: Allocator) -> Self {
        Self::from(Blackboard::new_in(alloc))
    }

    /// Lock the board.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, Blackboard> {
        self.0.lock()
    }

    /// Run `f` with the board locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut Blackboard) -> R) -> R {
        f(&mut *self.0.lock())
    }

    /// Scoped variable that erases its entry when dropped.
    ///
    /// Dropping the handle takes the board lock, so it must not be dropped
    /// while the same thread holds [`SharedBlackboard::lock`].
    pub fn handle<T>(&self, id: impl IntoKey) -> Result<SharedHandle<T>, AllocError>
    where
        T: Default + Send + Sync + 'static,
    {
        let key = id.into_key();
        let element = claim::<T>(self.0.lock().load::<T>(key))?;
        Ok(SharedHandle {
            board: self.clone(),
            key,
            element,
            _marker: PhantomData,
        })
    }

    /// Whether both refer to the same board.
    #[inline]
    pub fn ptr_eq(&self, other: &SharedBlackboard) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Blackboard> for SharedBlackboard {
    fn from(board: Blackboard) -> Self {
        Self(Arc::new(Mutex::new(board)))
    }
}

impl fmt::Debug for SharedBlackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBlackboard")
            .field("boards", &Arc::strong_count(&self.0))
            .finish_non_exhaustive()
    }
}

/// Owned scoped variable on a [`SharedBlackboard`].
///
/// Any number may be alive at once. Two handles on the same key share one
/// slot; the first to drop erases the entry, the other keeps its value.
pub struct SharedHandle<T: 'static> {
    board: SharedBlackboard,
    key: Key,
    element: Element,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> SharedHandle<T> {
    #[inline]
    pub fn key(&self) -> Key {
        self.key
    }

    #[inline]
    pub fn element(&self) -> &Element {
        &self.element
    }

    #[inline]
    pub fn board(&self) -> &SharedBlackboard {
        &self.board
    }

    pub fn read(&self) -> Result<MappedRwLockReadGuard<'_, T>, TypeMismatch> {
        self.element.get::<T>()
    }

    pub fn write(&self) -> Result<MappedRwLockWriteGuard<'_, T>, TypeMismatch> {
        self.element.get_mut::<T>()
    }

    pub fn set(&self, value: T) -> Result<(), AllocError> {
        self.element.emplace(value).map(drop)
    }
}

impl<T: 'static> Drop for SharedHandle<T> {
    fn drop(&mut self) {
        trace!("blackboard: shared handle released {}", self.key);
        let mut board = self.board.0.lock();
        // Only erase the slot this handle claimed; the key may have been
        // re-created since.
        if board
            .find::<T>(self.key)
            .is_some_and(|element| element.ptr_eq(&self.element))
        {
            board.erase::<T>(self.key);
        }
    }
}
