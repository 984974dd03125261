use std::{
    alloc::Layout,
    fmt,
    ptr::NonNull,
    sync::{Arc, OnceLock},
};

use allocator_api2::alloc::AllocError;
use log::debug;
use parking_lot::RwLock;

use super::resource::{MemoryResource, SystemResource};

/// A vector whose buffer comes from an [`Allocator`].
pub type AllocVec<T> = allocator_api2::vec::Vec<T, Allocator>;

static DEFAULT_RESOURCE: RwLock<Option<Arc<dyn MemoryResource>>> = parking_lot::const_rwlock(None);

fn system_resource() -> Arc<dyn MemoryResource> {
    static SYSTEM: OnceLock<Arc<dyn MemoryResource>> = OnceLock::new();
    SYSTEM.get_or_init(|| Arc::new(SystemResource)).clone()
}

/// Replace the process-wide default resource.
///
/// Allocators already handed out keep the resource they were created with.
pub fn set_default_resource(resource: Arc<dyn MemoryResource>) {
    debug!("default memory resource set to {}", resource.name());
    *DEFAULT_RESOURCE.write() = Some(resource);
}

/// Restore the system heap as the process-wide default resource.
pub fn reset_default_resource() {
    *DEFAULT_RESOURCE.write() = None;
}

/// The current process-wide default resource.
pub fn default_resource() -> Arc<dyn MemoryResource> {
    DEFAULT_RESOURCE.read().clone().unwrap_or_else(system_resource)
}

/// Cloneable handle to a [`MemoryResource`].
///
/// Two allocators compare equal when they share the same resource, meaning
/// memory from one may be returned through the other.
#[derive(Clone)]
pub struct Allocator {
    resource: Arc<dyn MemoryResource>,
}

impl Allocator {
    /// Wrap a resource.
    #[inline]
    pub fn new(resource: Arc<dyn MemoryResource>) -> Self {
        Self { resource }
    }

    /// Handle to the system heap, ignoring the process default.
    pub fn system() -> Self {
        Self::new(system_resource())
    }

    /// The underlying resource.
    #[inline]
    pub fn resource(&self) -> &Arc<dyn MemoryResource> {
        &self.resource
    }

    /// Allocate raw bytes. Zero-sized requests never reach the resource.
    pub fn allocate_bytes(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            return NonNull::new(std::ptr::without_provenance_mut(layout.align())).ok_or(AllocError);
        }
        self.resource.allocate(layout)
    }

    /// Release bytes obtained from [`Allocator::allocate_bytes`].
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by an allocator equal to this one with
    /// the same `layout`.
    pub unsafe fn deallocate_bytes(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            unsafe { self.resource.deallocate(ptr, layout) }
        }
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new(default_resource())
    }
}

impl PartialEq for Allocator {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.resource), Arc::as_ptr(&other.resource))
    }
}

impl Eq for Allocator {}

impl fmt::Debug for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Allocator").field(&self.resource.name()).finish()
    }
}

// SAFETY: blocks stay valid until deallocated through an equal allocator;
// clones share the same resource.
unsafe impl allocator_api2::alloc::Allocator for Allocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = self.allocate_bytes(layout)?;
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { self.deallocate_bytes(ptr, layout) }
    }
}
