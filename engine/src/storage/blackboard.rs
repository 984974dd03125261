use std::{
    collections::HashMap,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

use allocator_api2::alloc::AllocError;
use log::trace;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};

use super::{IntoKey, Key, Storage, StorageError};
use crate::{
    any::{Element, TypeMismatch},
    ds::FlatMap,
    memory::{AllocVec, Allocator},
};

/// Shared, dynamically typed scratch state.
///
/// Cloning a blackboard copies the maps but shares every slot, so a write
/// through one copy is visible through the other until either side erases
/// or re-creates the entry.
#[derive(Clone, Default)]
pub struct Blackboard {
    storage: Storage,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_in(alloc: Allocator) -> Self {
        Self {
            storage: Storage::new_in(alloc),
        }
    }

    /// Share every slot with a copy whose maps live in `alloc`.
    pub fn clone_in(&self, alloc: Allocator) -> Self {
        Self {
            storage: self.storage.clone_in(alloc),
        }
    }

    /// Exchange the entire contents of two blackboards.
    pub fn swap_contents(&mut self, other: &mut Blackboard) {
        std::mem::swap(&mut self.storage, &mut other.storage);
    }

    /// Scoped variable: the slot for `(T, id)` lives until the handle drops.
    ///
    /// The slot is created if missing and filled with `T::default()` unless
    /// it already holds a `T`.
    pub fn handle<T>(&mut self, id: impl IntoKey) -> Result<Handle<'_, T>, AllocError>
    where
        T: Default + Send + Sync + 'static,
    {
        let key = id.into_key();
        let element = claim::<T>(self.load::<T>(key))?;
        Ok(Handle {
            board: self,
            key,
            element,
            _marker: PhantomData,
        })
    }

    // ---------------------------------------------------------------- lists

    /// Store an empty list of `T` under `id`.
    pub fn emplace_list<T: Send + Sync + 'static>(
        &mut self,
        id: impl IntoKey,
    ) -> Result<MappedRwLockWriteGuard<'_, AllocVec<T>>, StorageError> {
        let list = AllocVec::<T>::new_in(self.allocator().clone());
        self.emplace(id, list)
    }

    pub fn get_list<T: 'static>(&self, id: impl IntoKey) -> Result<MappedRwLockReadGuard<'_, AllocVec<T>>, StorageError> {
        self.get::<AllocVec<T>>(id)
    }

    pub fn get_list_mut<T: 'static>(
        &mut self,
        id: impl IntoKey,
    ) -> Result<MappedRwLockWriteGuard<'_, AllocVec<T>>, StorageError> {
        self.get_mut::<AllocVec<T>>(id)
    }

    pub fn erase_list<T: 'static>(&mut self, id: impl IntoKey) -> Option<Element> {
        self.erase::<AllocVec<T>>(id)
    }

    // ----------------------------------------------------------------- maps

    /// Store an empty sorted map of `T` under `id`.
    pub fn emplace_map<T: Send + Sync + 'static>(
        &mut self,
        id: impl IntoKey,
    ) -> Result<MappedRwLockWriteGuard<'_, FlatMap<Key, T>>, StorageError> {
        let map = FlatMap::<Key, T>::new_in(self.allocator().clone());
        self.emplace(id, map)
    }

    pub fn get_map<T: 'static>(
        &self,
        id: impl IntoKey,
    ) -> Result<MappedRwLockReadGuard<'_, FlatMap<Key, T>>, StorageError> {
        self.get::<FlatMap<Key, T>>(id)
    }

    pub fn get_map_mut<T: 'static>(
        &mut self,
        id: impl IntoKey,
    ) -> Result<MappedRwLockWriteGuard<'_, FlatMap<Key, T>>, StorageError> {
        self.get_mut::<FlatMap<Key, T>>(id)
    }

    pub fn erase_map<T: 'static>(&mut self, id: impl IntoKey) -> Option<Element> {
        self.erase::<FlatMap<Key, T>>(id)
    }

    // ------------------------------------------------------------- hashmaps

    /// Store an empty hash map of `T` under `id`.
    pub fn emplace_hashmap<T: Send + Sync + 'static>(
        &mut self,
        id: impl IntoKey,
    ) -> Result<MappedRwLockWriteGuard<'_, HashMap<Key, T>>, StorageError> {
        self.emplace(id, HashMap::<Key, T>::new())
    }

    pub fn get_hashmap<T: 'static>(
        &self,
        id: impl IntoKey,
    ) -> Result<MappedRwLockReadGuard<'_, HashMap<Key, T>>, StorageError> {
        self.get::<HashMap<Key, T>>(id)
    }

    pub fn get_hashmap_mut<T: 'static>(
        &mut self,
        id: impl IntoKey,
    ) -> Result<MappedRwLockWriteGuard<'_, HashMap<Key, T>>, StorageError> {
        self.get_mut::<HashMap<Key, T>>(id)
    }

    pub fn erase_hashmap<T: 'static>(&mut self, id: impl IntoKey) -> Option<Element> {
        self.erase::<HashMap<Key, T>>(id)
    }
}

impl Deref for Blackboard {
    type Target = Storage;

    #[inline]
    fn deref(&self) -> &Storage {
        &self.storage
    }
}

impl DerefMut for Blackboard {
    #[inline]
    fn deref_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }
}

/// Fill `element` with a default `T` unless it already holds one, and hand
/// back a shared reference to it.
pub(super) fn claim<T>(element: &Element) -> Result<Element, AllocError>
where
    T: Default + Send + Sync + 'static,
{
    if !element.is::<T>() {
        element.emplace(T::default()).map(drop)?;
    }
    Ok(element.clone())
}

/// Scoped variable on a [`Blackboard`]; erases its entry when dropped.
///
/// Holds the blackboard mutably for its whole life. For several live
/// handles at once, use [`SharedBlackboard`](super::SharedBlackboard).
pub struct Handle<'a, T: 'static> {
    board: &'a mut Blackboard,
    key: Key,
    element: Element,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Handle<'_, T> {
    #[inline]
    pub fn key(&self) -> Key {
        self.key
    }

    /// The slot this handle keeps alive.
    #[inline]
    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn read(&self) -> Result<MappedRwLockReadGuard<'_, T>, TypeMismatch> {
        self.element.get::<T>()
    }

    pub fn write(&self) -> Result<MappedRwLockWriteGuard<'_, T>, TypeMismatch> {
        self.element.get_mut::<T>()
    }

    /// Replace the value.
    pub fn set(&self, value: T) -> Result<(), AllocError> {
        self.element.emplace(value).map(drop)
    }

    /// The blackboard, for reading other entries while the handle lives.
    #[inline]
    pub fn board(&self) -> &Blackboard {
        self.board
    }
}

impl<T: 'static> Drop for Handle<'_, T> {
    fn drop(&mut self) {
        trace!("blackboard: handle released {}", self.key);
        self.board.erase::<T>(self.key);
    }
}
