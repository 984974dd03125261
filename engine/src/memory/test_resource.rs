use std::{
    alloc::Layout,
    ptr::NonNull,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use allocator_api2::alloc::AllocError;

use super::resource::{MemoryResource, SystemResource};

/// Snapshot of the counters kept by a [`TestResource`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    /// Successful allocations since creation.
    pub allocations: usize,
    /// Deallocations since creation.
    pub deallocations: usize,
    /// Bytes currently handed out.
    pub bytes_in_use: usize,
    /// Highest value `bytes_in_use` reached since the last peak reset.
    pub peak_bytes: usize,
}

impl MemoryStats {
    /// Blocks handed out and not yet returned.
    #[inline]
    pub fn live_allocations(&self) -> usize {
        self.allocations - self.deallocations
    }
}

/// Passthrough resource that counts what flows through it.
///
/// Used to check that containers actually route their memory through the
/// allocator they were given, and that teardown returns all of it.
pub struct TestResource {
    upstream: Arc<dyn MemoryResource>,
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    bytes_in_use: AtomicUsize,
    peak_bytes: AtomicUsize,
}

impl Default for TestResource {
    fn default() -> Self {
        Self::new()
    }
}

impl TestResource {
    /// Count allocations served by the system heap.
    pub fn new() -> Self {
        Self::with_upstream(Arc::new(SystemResource))
    }

    /// Count allocations served by `upstream`.
    pub fn with_upstream(upstream: Arc<dyn MemoryResource>) -> Self {
        Self {
            upstream,
            allocations: AtomicUsize::new(0),
            deallocations: AtomicUsize::new(0),
            bytes_in_use: AtomicUsize::new(0),
            peak_bytes: AtomicUsize::new(0),
        }
    }

    /// Current counters.
    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            deallocations: self.deallocations.load(Ordering::Relaxed),
            bytes_in_use: self.bytes_in_use.load(Ordering::Relaxed),
            peak_bytes: self.peak_bytes.load(Ordering::Relaxed),
        }
    }

    /// Drop the peak down to the bytes currently in use.
    pub fn reset_peak(&self) {
        self.peak_bytes
            .store(self.bytes_in_use.load(Ordering::Relaxed), Ordering::Relaxed);
    }
}

impl MemoryResource for TestResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let ptr = self.upstream.allocate(layout)?;
        self.allocations.fetch_add(1, Ordering::Relaxed);
        let in_use = self.bytes_in_use.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
        self.peak_bytes.fetch_max(in_use, Ordering::Relaxed);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.deallocations.fetch_add(1, Ordering::Relaxed);
        self.bytes_in_use.fetch_sub(layout.size(), Ordering::Relaxed);
        unsafe { self.upstream.deallocate(ptr, layout) }
    }

    fn name(&self) -> &'static str {
        "test"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_allocations_and_bytes() {
        // Given
        let resource = TestResource::new();
        let layout = Layout::from_size_align(32, 8).unwrap();

        // When
        let a = resource.allocate(layout).unwrap();
        let b = resource.allocate(layout).unwrap();

        // Then
        let stats = resource.stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.bytes_in_use, 64);
        assert_eq!(stats.live_allocations(), 2);

        unsafe {
            resource.deallocate(a, layout);
            resource.deallocate(b, layout);
        }
        assert_eq!(resource.stats().bytes_in_use, 0);
        assert_eq!(resource.stats().live_allocations(), 0);
    }

    #[test]
    fn peak_survives_deallocation_until_reset() {
        let resource = TestResource::new();
        let layout = Layout::from_size_align(128, 8).unwrap();

        let ptr = resource.allocate(layout).unwrap();
        unsafe { resource.deallocate(ptr, layout) };

        assert_eq!(resource.stats().peak_bytes, 128);
        resource.reset_peak();
        assert_eq!(resource.stats().peak_bytes, 0);
    }
}
