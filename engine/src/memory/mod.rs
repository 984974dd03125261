//! Polymorphic memory resources and the allocator handle threaded through
//! every container in the crate.
//!
//! # Overview
//!
//! A [`MemoryResource`] is the thing that actually hands out bytes. An
//! [`Allocator`] is a cheap, cloneable handle to one resource and implements
//! [`allocator_api2::alloc::Allocator`], so it can parametrize [`AllocVec`].
//!
//! Every constructor in the crate has an `_in` variant that takes an
//! [`Allocator`]; the plain constructor uses [`Allocator::default`], which
//! resolves the process-wide default resource at call time.
//!
//! # Example
//!
//! ```rust,ignore
//! let tracker = Arc::new(TestResource::new());
//! let alloc = Allocator::new(tracker.clone());
//!
//! let mut values: AllocVec<u32> = AllocVec::new_in(alloc);
//! values.push(7);
//!
//! assert_eq!(tracker.stats().allocations, 1);
//! ```

mod allocator;
mod monotonic;
mod resource;
mod test_resource;

pub use allocator::{AllocVec, Allocator, default_resource, reset_default_resource, set_default_resource};
pub use allocator_api2::alloc::AllocError;
pub use monotonic::MonotonicResource;
pub use resource::{MemoryResource, SystemResource};
pub use test_resource::{MemoryStats, TestResource};
