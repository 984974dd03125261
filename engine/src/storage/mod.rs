//! Keyed storage engine: a two-level map from `(type, instance key)` to a
//! shared type-erased slot.
//!
//! # Overview
//!
//! [`Storage`] files every slot under the [`TypeKey`](crate::types::TypeKey)
//! of the value type, then under an instance [`Key`] given either as a raw
//! hash or as a string hashed with FNV-1a. Both levels are sorted
//! [`FlatMap`](crate::ds::FlatMap)s drawing from one allocator.
//!
//! - [`DataManager`]: engine-wide named globals.
//! - [`Blackboard`]: shared scratch state with scoped [`Handle`]s and list and
//!   map helpers. Clones share their slots.
//! - [`SharedBlackboard`]: a blackboard behind a mutex, for use across threads.
//!
//! Nothing here locks on its own except [`SharedBlackboard`]; a plain
//! [`Storage`] is single-owner.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut globals = DataManager::new();
//! globals.emplace("frame_budget", 16.6_f32)?;
//!
//! assert_eq!(*globals.get::<f32>("frame_budget")?, 16.6);
//! assert!(globals.get::<u32>("frame_budget").is_err());
//! ```

mod blackboard;
mod data_manager;
mod key;
mod shared;
mod table;

use allocator_api2::alloc::AllocError;

pub use blackboard::{Blackboard, Handle};
pub use data_manager::DataManager;
pub use key::{IntoKey, Key};
pub use shared::{SharedBlackboard, SharedHandle};
pub use table::{Category, Storage};

use crate::any::TypeMismatch;

/// Failure reading from or writing to keyed storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// No slot exists for the requested type and key.
    #[error("no `{type_name}` stored under {key}")]
    Missing { type_name: &'static str, key: Key },

    /// The slot exists but holds another type, or nothing.
    #[error(transparent)]
    Mismatch(#[from] TypeMismatch),

    /// The slot's allocator could not provide memory for a value.
    #[error("allocation failed while storing a value")]
    Alloc,
}

impl From<AllocError> for StorageError {
    fn from(_: AllocError) -> Self {
        Self::Alloc
    }
}
