use std::{
    alloc::{Layout, handle_alloc_error},
    fmt,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering, fence},
};

use allocator_api2::alloc::AllocError;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{TypeMismatch, Variable};
use crate::memory::Allocator;

const MAX_REFS: usize = isize::MAX as usize;

/// Shared cell behind every clone of one [`Element`].
struct Slot {
    refs: AtomicUsize,
    /// Resource the slot itself was allocated from. The variable's own
    /// allocator can change through [`Element::swap`].
    alloc: Allocator,
    var: RwLock<Variable>,
}

/// Shared, reference-counted slot around a [`Variable`].
///
/// Cloning an element shares the slot. The held value is dropped when it is
/// replaced, reset, or when the last clone goes away, whichever comes first.
/// The slot and the value are both allocated from the element's allocator.
pub struct Element {
    slot: NonNull<Slot>,
}

// SAFETY: the slot is only mutated through its atomic count and its lock,
// and a `Variable` only ever holds `Send + Sync` values.
unsafe impl Send for Element {}
unsafe impl Sync for Element {}

impl Default for Element {
    fn default() -> Self {
        Self::new()
    }
}

impl Element {
    /// Empty slot on the default allocator.
    pub fn new() -> Self {
        Self::new_in(Allocator::default())
    }

    /// Empty slot allocated, along with any value it will hold, from
    /// `alloc`. Aborts through [`handle_alloc_error`] when the resource is
    /// exhausted, like the containers built on it.
    pub fn new_in(alloc: Allocator) -> Self {
        let layout = Layout::new::<Slot>();
        let ptr = match alloc.allocate_bytes(layout) {
            Ok(ptr) => ptr.cast::<Slot>(),
            Err(_) => handle_alloc_error(layout),
        };
        let slot = Slot {
            refs: AtomicUsize::new(1),
            var: RwLock::new(Variable::new_in(alloc.clone())),
            alloc,
        };
        // SAFETY: freshly allocated for `Slot`'s layout.
        unsafe { ptr.write(slot) };
        Self { slot: ptr }
    }

    #[inline]
    fn slot(&self) -> &Slot {
        // SAFETY: the slot stays alive while any element refers to it.
        unsafe { self.slot.as_ref() }
    }

    #[inline]
    fn var(&self) -> &RwLock<Variable> {
        &self.slot().var
    }

    /// Read the value as a `T`.
    pub fn get<T: 'static>(&self) -> Result<MappedRwLockReadGuard<'_, T>, TypeMismatch> {
        RwLockReadGuard::try_map(self.var().read(), |var| var.downcast_ref::<T>().ok())
            .map_err(|guard| guard.mismatch::<T>())
    }

    /// Mutably borrow the value as a `T`.
    pub fn get_mut<T: 'static>(&self) -> Result<MappedRwLockWriteGuard<'_, T>, TypeMismatch> {
        RwLockWriteGuard::try_map(self.var().write(), |var| var.downcast_mut::<T>().ok())
            .map_err(|guard| guard.mismatch::<T>())
    }

    /// Replace whatever the slot holds with `value`.
    pub fn emplace<T: Send + Sync + 'static>(&self, value: T) -> Result<MappedRwLockWriteGuard<'_, T>, AllocError> {
        let mut guard = self.var().write();
        guard.emplace(value)?;
        // SAFETY: the slot was just filled with a `T` under this same lock.
        Ok(RwLockWriteGuard::map(guard, |var| unsafe { var.as_mut_unchecked::<T>() }))
    }

    /// Drop the held value, keeping the slot.
    pub fn reset(&self) {
        self.var().write().reset();
    }

    /// Move the value out as a `T`, leaving the slot empty.
    pub fn take<T: 'static>(&self) -> Result<T, TypeMismatch> {
        self.var().write().take::<T>()
    }

    /// Exchange contents with `other`. No-op when both share a slot.
    pub fn swap(&self, other: &Element) {
        if self.ptr_eq(other) {
            return;
        }
        // Lock in address order so two concurrent swaps cannot deadlock.
        let (first, second) = if self.slot < other.slot { (self, other) } else { (other, self) };
        let mut a = first.var().write();
        let mut b = second.var().write();
        a.swap(&mut b);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.var().read().is_empty()
    }

    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.var().read().is::<T>()
    }

    #[inline]
    pub fn type_name(&self) -> Option<&'static str> {
        self.var().read().type_name()
    }

    /// Allocator the held value comes from.
    pub fn allocator(&self) -> Allocator {
        self.var().read().allocator().clone()
    }

    /// Number of handles sharing this slot.
    #[inline]
    pub fn ref_count(&self) -> usize {
        self.slot().refs.load(Ordering::Acquire)
    }

    /// Whether both handles refer to the same slot.
    #[inline]
    pub fn ptr_eq(&self, other: &Element) -> bool {
        self.slot == other.slot
    }
}

impl Clone for Element {
    fn clone(&self) -> Self {
        let old = self.slot().refs.fetch_add(1, Ordering::Relaxed);
        if old > MAX_REFS {
            std::process::abort();
        }
        Self { slot: self.slot }
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        if self.slot().refs.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }
        fence(Ordering::Acquire);

        // SAFETY: this was the last reference; nothing else can reach the
        // slot, which was allocated from `alloc` with `Slot`'s layout.
        unsafe {
            let alloc = self.slot.as_ref().alloc.clone();
            self.slot.drop_in_place();
            alloc.deallocate_bytes(self.slot.cast(), Layout::new::<Slot>());
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("type", &self.type_name())
            .field("refs", &self.ref_count())
            .finish()
    }
}
