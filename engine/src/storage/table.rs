use std::any::type_name;

use log::{debug, trace};
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};

use super::{IntoKey, Key, StorageError};
use crate::{any::Element, ds::FlatMap, memory::Allocator, types::TypeKey};

/// All slots of one value type, by instance key.
pub type Category = FlatMap<Key, Element>;

/// Two-level `type -> key -> slot` map.
///
/// Typed methods take the value type as a generic parameter; the `_by`
/// variants take an explicit [`TypeKey`] for callers that only know the type
/// at runtime. Reads never create entries.
#[derive(Clone)]
pub struct Storage {
    vars: FlatMap<TypeKey, Category>,
    alloc: Allocator,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage {
    pub fn new() -> Self {
        Self::new_in(Allocator::default())
    }

    pub fn new_in(alloc: Allocator) -> Self {
        Self {
            vars: FlatMap::new_in(alloc.clone()),
            alloc,
        }
    }

    /// Copy of `self` whose maps live in `alloc`. Slots stay shared.
    pub fn clone_in(&self, alloc: Allocator) -> Self {
        let mut vars = FlatMap::with_capacity_in(self.vars.len(), alloc.clone());
        for (ty, category) in self.vars.iter() {
            let mut copy = Category::with_capacity_in(category.len(), alloc.clone());
            for (key, element) in category.iter() {
                copy.try_insert(*key, element.clone());
            }
            vars.try_insert(*ty, copy);
        }
        Self { vars, alloc }
    }

    #[inline]
    pub fn allocator(&self) -> &Allocator {
        &self.alloc
    }

    // ---------------------------------------------------------------- typed

    /// Slot for `(T, id)`, created empty when absent.
    pub fn load<T: 'static>(&mut self, id: impl IntoKey) -> &Element {
        self.load_by(TypeKey::of::<T>(), id.into_key())
    }

    /// Like [`Storage::load`], allocating a new slot's value from `alloc`.
    pub fn load_in<T: 'static>(&mut self, id: impl IntoKey, alloc: &Allocator) -> &Element {
        self.load_by_in(TypeKey::of::<T>(), id.into_key(), alloc)
    }

    /// Read the `T` stored under `id`.
    pub fn get<T: 'static>(&self, id: impl IntoKey) -> Result<MappedRwLockReadGuard<'_, T>, StorageError> {
        let key = id.into_key();
        let element = self.find::<T>(key).ok_or(StorageError::Missing {
            type_name: type_name::<T>(),
            key,
        })?;
        Ok(element.get::<T>()?)
    }

    /// Mutably borrow the `T` stored under `id`.
    pub fn get_mut<T: 'static>(&mut self, id: impl IntoKey) -> Result<MappedRwLockWriteGuard<'_, T>, StorageError> {
        let key = id.into_key();
        let element = self.find::<T>(key).ok_or(StorageError::Missing {
            type_name: type_name::<T>(),
            key,
        })?;
        Ok(element.get_mut::<T>()?)
    }

    /// Store `value` under `id`, replacing whatever the slot held.
    pub fn emplace<T: Send + Sync + 'static>(
        &mut self,
        id: impl IntoKey,
        value: T,
    ) -> Result<MappedRwLockWriteGuard<'_, T>, StorageError> {
        Ok(self.load::<T>(id).emplace(value)?)
    }

    /// Like [`Storage::emplace`], creating a missing slot on `alloc`.
    pub fn emplace_in<T: Send + Sync + 'static>(
        &mut self,
        id: impl IntoKey,
        alloc: &Allocator,
        value: T,
    ) -> Result<MappedRwLockWriteGuard<'_, T>, StorageError> {
        Ok(self.load_in::<T>(id, alloc).emplace(value)?)
    }

    #[inline]
    pub fn contains<T: 'static>(&self, id: impl IntoKey) -> bool {
        self.contains_by(TypeKey::of::<T>(), id.into_key())
    }

    #[inline]
    pub fn find<T: 'static>(&self, id: impl IntoKey) -> Option<&Element> {
        self.find_by(TypeKey::of::<T>(), id.into_key())
    }

    /// Remove the slot for `(T, id)`. No-op when absent.
    #[inline]
    pub fn erase<T: 'static>(&mut self, id: impl IntoKey) -> Option<Element> {
        self.erase_by(TypeKey::of::<T>(), id.into_key())
    }

    /// Empty the slot for `(T, id)` without removing it.
    #[inline]
    pub fn reset<T: 'static>(&mut self, id: impl IntoKey) -> bool {
        self.reset_by(TypeKey::of::<T>(), id.into_key())
    }

    /// Exchange the values stored under two keys of `T`.
    #[inline]
    pub fn swap<T: 'static>(&mut self, lhs: impl IntoKey, rhs: impl IntoKey) -> bool {
        self.swap_by(TypeKey::of::<T>(), lhs.into_key(), rhs.into_key())
    }

    /// Whether any slot of `T` exists.
    #[inline]
    pub fn contains_type<T: 'static>(&self) -> bool {
        self.contains_category(TypeKey::of::<T>())
    }

    // -------------------------------------------------------------- untyped

    pub fn load_by(&mut self, ty: TypeKey, key: Key) -> &Element {
        let alloc = self.alloc.clone();
        self.load_by_in(ty, key, &alloc)
    }

    pub fn load_by_in(&mut self, ty: TypeKey, key: Key, alloc: &Allocator) -> &Element {
        let map_alloc = self.alloc.clone();
        let category = self.vars.find_or_insert_with(ty, || {
            trace!("storage: new category {ty}");
            Category::new_in(map_alloc)
        });
        category.find_or_insert_with(key, || {
            trace!("storage: new slot {ty} {key}");
            Element::new_in(alloc.clone())
        })
    }

    pub fn contains_by(&self, ty: TypeKey, key: Key) -> bool {
        self.vars
            .get(&ty)
            .is_some_and(|category| category.contains_key(&key))
    }

    pub fn find_by(&self, ty: TypeKey, key: Key) -> Option<&Element> {
        self.vars.get(&ty)?.get(&key)
    }

    pub fn erase_by(&mut self, ty: TypeKey, key: Key) -> Option<Element> {
        let removed = self.vars.get_mut(&ty)?.remove(&key);
        if removed.is_some() {
            trace!("storage: erased {ty} {key}");
        }
        removed
    }

    /// Returns whether a slot existed.
    pub fn reset_by(&mut self, ty: TypeKey, key: Key) -> bool {
        match self.find_by(ty, key) {
            Some(element) => {
                element.reset();
                true
            }
            None => false,
        }
    }

    /// Returns whether both slots existed. Nothing changes otherwise.
    pub fn swap_by(&mut self, ty: TypeKey, lhs: Key, rhs: Key) -> bool {
        match (self.find_by(ty, lhs), self.find_by(ty, rhs)) {
            (Some(left), Some(right)) => {
                left.swap(right);
                true
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------ categories

    #[inline]
    pub fn contains_category(&self, ty: TypeKey) -> bool {
        self.vars.contains_key(&ty)
    }

    #[inline]
    pub fn find_category(&self, ty: TypeKey) -> Option<&Category> {
        self.vars.get(&ty)
    }

    pub fn erase_category(&mut self, ty: TypeKey) -> Option<Category> {
        let removed = self.vars.remove(&ty);
        if let Some(category) = &removed {
            debug!("storage: dropped category {ty} with {} slots", category.len());
        }
        removed
    }

    /// Remove every slot of `ty`, keeping the category.
    pub fn clear_category(&mut self, ty: TypeKey) {
        if let Some(category) = self.vars.get_mut(&ty) {
            category.clear();
        }
    }

    /// Reserve room for `additional` slots of `ty`, creating the category.
    pub fn reserve_category(&mut self, ty: TypeKey, additional: usize) {
        self.category_entry(ty).reserve(additional);
    }

    /// Keep at most `len` slots of `ty` (lowest keys first), or reserve up to
    /// `len` when the category is smaller.
    pub fn resize_category(&mut self, ty: TypeKey, len: usize) {
        let category = self.category_entry(ty);
        if len < category.len() {
            category.truncate(len);
        } else {
            category.reserve(len - category.len());
        }
    }

    pub fn shrink_category(&mut self, ty: TypeKey) {
        if let Some(category) = self.vars.get_mut(&ty) {
            category.shrink_to_fit();
        }
    }

    fn category_entry(&mut self, ty: TypeKey) -> &mut Category {
        let alloc = self.alloc.clone();
        self.vars.find_or_insert_with(ty, || Category::new_in(alloc))
    }

    // ------------------------------------------------------------------ bulk

    /// Drop every category.
    pub fn clear(&mut self) {
        debug!("storage: cleared {} categories", self.vars.len());
        self.vars.clear();
    }

    /// Keep at most `len` categories, or reserve up to `len`.
    pub fn resize(&mut self, len: usize) {
        if len < self.vars.len() {
            self.vars.truncate(len);
        } else {
            self.vars.reserve(len - self.vars.len());
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.vars.reserve(additional);
    }

    /// Release spare capacity at both levels.
    pub fn shrink_to_fit(&mut self) {
        for category in self.vars.values_mut() {
            category.shrink_to_fit();
        }
        self.vars.shrink_to_fit();
    }

    /// Number of categories.
    #[inline]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.vars.capacity()
    }

    /// Number of slots across all categories.
    pub fn element_count(&self) -> usize {
        self.vars.values().map(Category::len).sum()
    }

    /// Categories in type order.
    pub fn categories(&self) -> impl Iterator<Item = (&TypeKey, &Category)> {
        self.vars.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::TestResource;

    // ==================== Load ====================

    #[test]
    fn load_creates_empty_slot() {
        // Given
        let mut storage = Storage::new();

        // When
        let element = storage.load::<i32>("hp");

        // Then
        assert!(element.is_empty());
        assert!(storage.contains::<i32>("hp"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn load_twice_returns_same_slot() {
        // Given
        let mut storage = Storage::new();
        let first = storage.load::<i32>("hp").clone();
        first.emplace(10).unwrap();

        // When
        let second = storage.load::<i32>("hp").clone();

        // Then
        assert!(first.ptr_eq(&second));
        let a = &*first.get::<i32>().unwrap() as *const i32;
        let b = &*second.get::<i32>().unwrap() as *const i32;
        assert_eq!(a, b);
        assert_eq!(storage.element_count(), 1);
    }

    #[test]
    fn same_key_different_types_are_separate() {
        let mut storage = Storage::new();

        storage.emplace("value", 1_u8).unwrap();
        storage.emplace("value", String::from("text")).unwrap();

        assert_eq!(*storage.get::<u8>("value").unwrap(), 1);
        assert_eq!(*storage.get::<String>("value").unwrap(), "text");
        assert_eq!(storage.len(), 2);
    }

    // ==================== Get & Emplace ====================

    #[test]
    fn emplace_then_get_round_trips() {
        let mut storage = Storage::new();

        storage.emplace("name", String::from("meme")).unwrap();

        assert_eq!(*storage.get::<String>("name").unwrap(), "meme");
    }

    #[test]
    fn raw_and_named_keys_meet() {
        let mut storage = Storage::new();

        storage.emplace("speed", 3.5_f32).unwrap();

        assert_eq!(*storage.get::<f32>(Key::from_name("speed")).unwrap(), 3.5);
    }

    #[test]
    fn get_missing_does_not_create() {
        let storage = Storage::new();

        let err = storage.get::<i32>("missing").unwrap_err();

        assert!(matches!(err, StorageError::Missing { .. }));
        assert!(storage.is_empty());
    }

    #[test]
    fn get_empty_slot_is_a_mismatch() {
        let mut storage = Storage::new();
        storage.load::<i32>("empty");

        let err = storage.get::<i32>("empty").unwrap_err();

        assert!(matches!(err, StorageError::Mismatch(m) if m.found.is_none()));
    }

    #[test]
    fn mismatched_read_leaves_value_intact() {
        // Given: an i32 slot read back as f32 through the untyped path
        let mut storage = Storage::new();
        let ty = TypeKey::of::<i32>();
        storage.emplace("id", 5_i32).unwrap();
        let element = storage.find_by(ty, "id".into_key()).unwrap().clone();

        // When
        let err = element.get::<f32>().unwrap_err();

        // Then
        assert_eq!(err.found, Some("i32"));
        assert_eq!(*storage.get::<i32>("id").unwrap(), 5);
        assert_eq!(storage.element_count(), 1);
    }

    #[test]
    fn emplace_overwrites_previous_value() {
        let mut storage = Storage::new();
        storage.emplace("n", 1_u32).unwrap();

        storage.emplace("n", 2_u32).unwrap();

        assert_eq!(*storage.get::<u32>("n").unwrap(), 2);
        assert_eq!(storage.element_count(), 1);
    }

    #[test]
    fn get_mut_writes_through() {
        let mut storage = Storage::new();
        storage.emplace("list", vec![1]).unwrap();

        storage.get_mut::<Vec<i32>>("list").unwrap().push(2);

        assert_eq!(*storage.get::<Vec<i32>>("list").unwrap(), vec![1, 2]);
    }

    // ==================== Erase / Reset / Swap ====================

    #[test]
    fn erase_absent_is_a_no_op_and_idempotent() {
        // Given
        let mut storage = Storage::new();
        storage.emplace("kept", 1_i32).unwrap();

        // When
        let first = storage.erase::<i32>("gone");
        let second = storage.erase::<i32>("gone");
        let other_type = storage.erase::<u64>("kept");

        // Then
        assert!(first.is_none() && second.is_none() && other_type.is_none());
        assert_eq!(*storage.get::<i32>("kept").unwrap(), 1);
    }

    #[test]
    fn erase_removes_slot_but_shared_value_survives() {
        let mut storage = Storage::new();
        storage.emplace("shared", String::from("alive")).unwrap();
        let held = storage.find::<String>("shared").unwrap().clone();

        let removed = storage.erase::<String>("shared");

        assert!(removed.is_some());
        assert!(!storage.contains::<String>("shared"));
        assert_eq!(*held.get::<String>().unwrap(), "alive");
    }

    #[test]
    fn reset_keeps_entry() {
        let mut storage = Storage::new();
        storage.emplace("x", 9_i32).unwrap();

        assert!(storage.reset::<i32>("x"));

        assert!(storage.contains::<i32>("x"));
        assert!(storage.find::<i32>("x").unwrap().is_empty());
        assert!(!storage.reset::<i32>("absent"));
    }

    #[test]
    fn swap_exchanges_values() {
        // Given
        let mut storage = Storage::new();
        storage.emplace("a", 1_i32).unwrap();
        storage.emplace("b", 2_i32).unwrap();

        // When
        let swapped = storage.swap::<i32>("a", "b");

        // Then
        assert!(swapped);
        assert_eq!(*storage.get::<i32>("a").unwrap(), 2);
        assert_eq!(*storage.get::<i32>("b").unwrap(), 1);
    }

    #[test]
    fn swap_with_missing_key_changes_nothing() {
        let mut storage = Storage::new();
        storage.emplace("a", 1_i32).unwrap();

        assert!(!storage.swap::<i32>("a", "nope"));
        assert_eq!(*storage.get::<i32>("a").unwrap(), 1);
        assert!(!storage.contains::<i32>("nope"));
    }

    // ==================== Categories & Bulk ====================

    #[test]
    fn category_operations() {
        // Given
        let mut storage = Storage::new();
        let ty = TypeKey::of::<u16>();
        for i in 0..5_u64 {
            storage.emplace(i, i as u16).unwrap();
        }

        // Then
        assert!(storage.contains_category(ty));
        assert_eq!(storage.find_category(ty).unwrap().len(), 5);

        storage.resize_category(ty, 2);
        assert_eq!(storage.find_category(ty).unwrap().len(), 2);
        assert!(storage.contains::<u16>(0_u64));
        assert!(!storage.contains::<u16>(4_u64));

        storage.clear_category(ty);
        assert!(storage.contains_category(ty));
        assert_eq!(storage.element_count(), 0);

        assert!(storage.erase_category(ty).is_some());
        assert!(!storage.contains_type::<u16>());
    }

    #[test]
    fn reserve_category_creates_it() {
        let mut storage = Storage::new();
        let ty = TypeKey::of::<String>();

        storage.reserve_category(ty, 16);

        assert!(storage.find_category(ty).unwrap().capacity() >= 16);
    }

    #[test]
    fn clear_drops_every_value_and_returns_memory() {
        // Given
        let tracker = Arc::new(TestResource::new());
        let mut storage = Storage::new_in(Allocator::new(tracker.clone()));
        storage.emplace("a", String::from("x")).unwrap();
        storage.emplace("b", [0_u8; 128]).unwrap();

        // When
        storage.clear();
        storage.shrink_to_fit();

        // Then
        assert!(storage.is_empty());
        assert_eq!(tracker.stats().bytes_in_use, 0);
    }

    #[test]
    fn load_in_uses_given_allocator_for_value() {
        // Given
        let tracker = Arc::new(TestResource::new());
        let value_alloc = Allocator::new(tracker.clone());
        let mut storage = Storage::new();

        // When
        storage.emplace_in("big", &value_alloc, [1_u64; 4]).unwrap();

        // Then
        let stats = tracker.stats();
        assert_eq!(stats.live_allocations(), 2);
        assert!(stats.bytes_in_use > 32);
        assert_eq!(storage.find::<[u64; 4]>("big").unwrap().allocator(), value_alloc);
    }

    #[test]
    fn clone_in_shares_slots() {
        let mut storage = Storage::new();
        storage.emplace("v", 1_i32).unwrap();

        let copy = storage.clone_in(Allocator::system());
        *storage.get_mut::<i32>("v").unwrap() = 2;

        assert_eq!(*copy.get::<i32>("v").unwrap(), 2);
    }

    #[test]
    fn every_slot_is_allocated_from_the_storage_allocator() {
        // Given
        let tracker = Arc::new(TestResource::new());
        let mut storage = Storage::new_in(Allocator::new(tracker.clone()));

        // When
        for id in 0..100_u64 {
            storage.load::<u8>(id);
        }

        // Then
        assert!(tracker.stats().live_allocations() >= 100);
        assert_eq!(storage.element_count(), 100);

        storage.erase_category(TypeKey::of::<u8>());
        storage.shrink_to_fit();
        assert_eq!(tracker.stats().live_allocations(), 0);
    }
}
