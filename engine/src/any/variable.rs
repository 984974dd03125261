use std::{
    alloc::Layout,
    any::{TypeId, type_name},
    fmt,
    ptr::NonNull,
};

use allocator_api2::alloc::AllocError;

use super::TypeMismatch;
use crate::memory::Allocator;

/// Runtime description of the value held by a [`Variable`].
#[derive(Clone, Copy)]
struct ValueInfo {
    type_id: TypeId,
    name: &'static str,
    layout: Layout,
    drop_fn: unsafe fn(NonNull<u8>),
}

impl ValueInfo {
    fn of<T: 'static>() -> Self {
        let drop_fn = if std::mem::needs_drop::<T>() {
            Self::drop_impl::<T>
        } else {
            Self::drop_noop
        };
        Self {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
            layout: Layout::new::<T>(),
            drop_fn,
        }
    }

    unsafe fn drop_impl<T>(ptr: NonNull<u8>) {
        unsafe {
            std::ptr::drop_in_place(ptr.as_ptr() as *mut T);
        }
    }

    unsafe fn drop_noop(_ptr: NonNull<u8>) {}
}

/// Owner of at most one type-erased value.
///
/// The value lives in memory from the variable's allocator. Replacing or
/// resetting it runs its destructor and gives the memory back.
pub struct Variable {
    value: Option<(NonNull<u8>, ValueInfo)>,
    alloc: Allocator,
}

// SAFETY: only `Send + Sync` values are ever stored, and the pointer is
// uniquely owned by this variable.
unsafe impl Send for Variable {}
unsafe impl Sync for Variable {}

impl Default for Variable {
    fn default() -> Self {
        Self::new()
    }
}

impl Variable {
    /// Empty variable on the default allocator.
    pub fn new() -> Self {
        Self::new_in(Allocator::default())
    }

    /// Empty variable on `alloc`.
    pub fn new_in(alloc: Allocator) -> Self {
        Self { value: None, alloc }
    }

    #[inline]
    pub fn allocator(&self) -> &Allocator {
        &self.alloc
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Whether the held value is a `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.value
            .as_ref()
            .is_some_and(|(_, info)| info.type_id == TypeId::of::<T>())
    }

    /// Full name of the held type.
    #[inline]
    pub fn type_name(&self) -> Option<&'static str> {
        self.value.as_ref().map(|(_, info)| info.name)
    }

    /// Destroy the current value, if any, and store `value`.
    ///
    /// When allocation fails the variable is left empty.
    pub fn emplace<T: Send + Sync + 'static>(&mut self, value: T) -> Result<&mut T, AllocError> {
        self.reset();
        let info = ValueInfo::of::<T>();
        let ptr = self.alloc.allocate_bytes(info.layout)?.cast::<T>();
        // SAFETY: freshly allocated for `T`'s layout.
        unsafe { ptr.write(value) };
        self.value = Some((ptr.cast(), info));
        // SAFETY: just initialized above.
        Ok(unsafe { &mut *ptr.as_ptr() })
    }

    /// Destroy the current value. No-op when empty.
    pub fn reset(&mut self) {
        if let Some((ptr, info)) = self.value.take() {
            // SAFETY: `ptr` holds an initialized value described by `info`,
            // allocated by `self.alloc`.
            unsafe {
                (info.drop_fn)(ptr);
                self.alloc.deallocate_bytes(ptr, info.layout);
            }
        }
    }

    /// Exchange contents with `other`, allocators included.
    #[inline]
    pub fn swap(&mut self, other: &mut Variable) {
        std::mem::swap(self, other);
    }

    /// Error describing a failed read as `T`.
    pub fn mismatch<T: 'static>(&self) -> TypeMismatch {
        TypeMismatch {
            expected: type_name::<T>(),
            found: self.type_name(),
        }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Result<&T, TypeMismatch> {
        match self.value {
            // SAFETY: type id matches, so `ptr` points at a live `T`.
            Some((ptr, info)) if info.type_id == TypeId::of::<T>() => Ok(unsafe { ptr.cast::<T>().as_ref() }),
            _ => Err(self.mismatch::<T>()),
        }
    }

    pub fn downcast_mut<T: 'static>(&mut self) -> Result<&mut T, TypeMismatch> {
        match self.value {
            // SAFETY: as in `downcast_ref`, and `&mut self` is exclusive.
            Some((ptr, info)) if info.type_id == TypeId::of::<T>() => Ok(unsafe { ptr.cast::<T>().as_mut() }),
            _ => Err(self.mismatch::<T>()),
        }
    }

    /// Move the value out, leaving the variable empty.
    pub fn take<T: 'static>(&mut self) -> Result<T, TypeMismatch> {
        match self.value {
            Some((ptr, info)) if info.type_id == TypeId::of::<T>() => {
                self.value = None;
                // SAFETY: a live `T` that nothing else will read or drop.
                unsafe {
                    let value = ptr.cast::<T>().read();
                    self.alloc.deallocate_bytes(ptr, info.layout);
                    Ok(value)
                }
            }
            _ => Err(self.mismatch::<T>()),
        }
    }

    /// Value pointer for a slot already known to hold a `T`.
    ///
    /// # Safety
    ///
    /// The variable must currently hold a `T`.
    pub(crate) unsafe fn as_mut_unchecked<T: 'static>(&mut self) -> &mut T {
        debug_assert!(self.is::<T>());
        match self.value {
            Some((ptr, _)) => unsafe { ptr.cast::<T>().as_mut() },
            None => unsafe { std::hint::unreachable_unchecked() },
        }
    }
}

impl Drop for Variable {
    fn drop(&mut self) {
        self.reset();
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("type", &self.type_name())
            .field("alloc", &self.alloc)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::memory::TestResource;

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    // ==================== Emplace & Read ====================

    #[test]
    fn new_variable_is_empty() {
        let var = Variable::new();

        assert!(var.is_empty());
        assert_eq!(var.type_name(), None);
    }

    #[test]
    fn emplace_then_read_back() {
        // Given
        let mut var = Variable::new();

        // When
        *var.emplace(String::from("hello")).unwrap() += " world";

        // Then
        assert!(var.is::<String>());
        assert_eq!(var.downcast_ref::<String>().unwrap(), "hello world");
    }

    #[test]
    fn wrong_type_read_reports_both_types() {
        // Given
        let mut var = Variable::new();
        var.emplace(5_i32).unwrap();

        // When
        let err = var.downcast_ref::<f32>().unwrap_err();

        // Then
        assert_eq!(err.expected, "f32");
        assert_eq!(err.found, Some("i32"));
        assert_eq!(*var.downcast_ref::<i32>().unwrap(), 5);
    }

    #[test]
    fn empty_read_reports_nothing_found() {
        let var = Variable::new();

        let err = var.downcast_ref::<u8>().unwrap_err();

        assert_eq!(err.found, None);
        assert!(err.to_string().contains("nothing"));
    }

    // ==================== Lifecycle ====================

    #[test]
    fn emplace_drops_previous_value() {
        // Given
        let drops = Arc::new(AtomicUsize::new(0));
        let mut var = Variable::new();
        var.emplace(DropCounter(drops.clone())).unwrap();

        // When
        var.emplace(1_u64).unwrap();

        // Then
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(var.is::<u64>());
    }

    #[test]
    fn reset_and_drop_release_memory() {
        // Given
        let tracker = Arc::new(TestResource::new());
        let mut var = Variable::new_in(Allocator::new(tracker.clone()));
        var.emplace([0_u64; 8]).unwrap();
        assert_eq!(tracker.stats().bytes_in_use, 64);

        // When
        var.reset();

        // Then
        assert!(var.is_empty());
        assert_eq!(tracker.stats().bytes_in_use, 0);

        var.emplace(7_u32).unwrap();
        drop(var);
        assert_eq!(tracker.stats().bytes_in_use, 0);
    }

    #[test]
    fn take_moves_value_without_dropping() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut var = Variable::new();
        var.emplace(DropCounter(drops.clone())).unwrap();

        let value = var.take::<DropCounter>().unwrap();

        assert!(var.is_empty());
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(value);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn swap_exchanges_types() {
        let mut a = Variable::new();
        let mut b = Variable::new();
        a.emplace(1_i32).unwrap();
        b.emplace("two").unwrap();

        a.swap(&mut b);

        assert_eq!(*a.downcast_ref::<&str>().unwrap(), "two");
        assert_eq!(*b.downcast_ref::<i32>().unwrap(), 1);
    }

    #[test]
    fn zero_sized_values_round_trip() {
        #[derive(Debug, PartialEq)]
        struct Marker;

        let mut var = Variable::new();
        var.emplace(Marker).unwrap();

        assert_eq!(var.downcast_ref::<Marker>().unwrap(), &Marker);
    }
}
