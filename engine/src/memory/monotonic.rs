use std::{alloc::Layout, ptr::NonNull, sync::Arc};

use allocator_api2::alloc::AllocError;
use log::trace;
use parking_lot::Mutex;

use super::resource::{MemoryResource, SystemResource};

const MIN_CHUNK: usize = 1024;
const CHUNK_ALIGN: usize = 16;

struct Chunk {
    ptr: NonNull<u8>,
    layout: Layout,
}

#[derive(Default)]
struct Arena {
    chunks: Vec<Chunk>,
    cursor: usize,
    end: usize,
    next_size: usize,
}

/// Bump arena over an upstream resource.
///
/// Deallocation is a no-op; every chunk goes back upstream at once when the
/// resource is dropped.
pub struct MonotonicResource {
    upstream: Arc<dyn MemoryResource>,
    arena: Mutex<Arena>,
}

// SAFETY: chunk pointers are only touched under the arena mutex and are
// owned exclusively by this resource.
unsafe impl Send for MonotonicResource {}
unsafe impl Sync for MonotonicResource {}

impl Default for MonotonicResource {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicResource {
    /// Arena backed by the system heap.
    pub fn new() -> Self {
        Self::with_upstream(Arc::new(SystemResource))
    }

    /// Arena backed by `upstream`.
    pub fn with_upstream(upstream: Arc<dyn MemoryResource>) -> Self {
        Self::with_capacity(upstream, MIN_CHUNK)
    }

    /// Arena whose first chunk holds at least `initial` bytes.
    pub fn with_capacity(upstream: Arc<dyn MemoryResource>, initial: usize) -> Self {
        Self {
            upstream,
            arena: Mutex::new(Arena {
                next_size: initial.max(MIN_CHUNK),
                ..Arena::default()
            }),
        }
    }

    /// Number of chunks requested from upstream so far.
    pub fn chunk_count(&self) -> usize {
        self.arena.lock().chunks.len()
    }

    fn grow(&self, arena: &mut Arena, layout: Layout) -> Result<(), AllocError> {
        let size = arena.next_size.max(layout.size() + layout.align());
        let chunk_layout =
            Layout::from_size_align(size, CHUNK_ALIGN.max(layout.align())).map_err(|_| AllocError)?;
        let ptr = self.upstream.allocate(chunk_layout)?;
        trace!("monotonic arena grew by {size} bytes");

        arena.cursor = ptr.as_ptr() as usize;
        arena.end = arena.cursor + size;
        arena.next_size = size.saturating_mul(2);
        arena.chunks.push(Chunk { ptr, layout: chunk_layout });
        Ok(())
    }
}

impl MemoryResource for MonotonicResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let mut arena = self.arena.lock();
        loop {
            if let Some(base) = arena.chunks.last().map(|chunk| chunk.ptr) {
                let aligned = arena.cursor.next_multiple_of(layout.align());
                if aligned + layout.size() <= arena.end {
                    arena.cursor = aligned + layout.size();
                    let offset = aligned - base.as_ptr() as usize;
                    // SAFETY: `offset + size` lies inside the current chunk.
                    return Ok(unsafe { base.add(offset) });
                }
            }
            self.grow(&mut arena, layout)?;
        }
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}

    fn name(&self) -> &'static str {
        "monotonic"
    }
}

impl Drop for MonotonicResource {
    fn drop(&mut self) {
        for chunk in self.arena.get_mut().chunks.drain(..) {
            unsafe { self.upstream.deallocate(chunk.ptr, chunk.layout) };
        }
    }
}
