use std::{alloc::Layout, ptr::NonNull};

use allocator_api2::alloc::AllocError;

/// A source of raw memory.
///
/// Implementations must be shareable across threads; the crate hands out
/// resources behind an `Arc` and may allocate from several threads at once.
pub trait MemoryResource: Send + Sync {
    /// Allocate a block matching `layout`. Never called with a zero size.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Return a block previously handed out by [`MemoryResource::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this same resource with the same
    /// `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Human readable name used in logs.
    fn name(&self) -> &'static str {
        "resource"
    }
}

/// The global heap.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResource;

impl MemoryResource for SystemResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        // SAFETY: callers never pass a zero-sized layout.
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_resource_round_trips_a_block() {
        // Given
        let resource = SystemResource;
        let layout = Layout::from_size_align(64, 16).unwrap();

        // When
        let ptr = resource.allocate(layout).unwrap();

        // Then
        assert_eq!(ptr.as_ptr() as usize % 16, 0);
        unsafe { resource.deallocate(ptr, layout) };
    }
}
