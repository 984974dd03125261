//! Type-erased value slots.
//!
//! # Overview
//!
//! [`Variable`] owns at most one value of any `Send + Sync + 'static` type,
//! allocated through the [`Allocator`](crate::memory::Allocator) it was
//! created with. [`Element`] shares a [`Variable`] behind a reference count
//! and a read-write lock; it is what the keyed storage engine hands out.
//!
//! Reading a slot back as the wrong type is the one failure mode and is
//! reported as a [`TypeMismatch`]. A failed read never touches the value.
//!
//! # Example
//!
//! ```rust,ignore
//! let element = Element::new();
//! element.emplace(42_i32)?;
//!
//! assert_eq!(*element.get::<i32>()?, 42);
//! assert!(element.get::<f32>().is_err());
//! ```

mod element;
mod variable;

pub use element::Element;
pub use variable::Variable;

/// A slot was read as a type other than the one it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected a value of type `{expected}`, slot holds {}", .found.unwrap_or("nothing"))]
pub struct TypeMismatch {
    /// Type the caller asked for.
    pub expected: &'static str,
    /// Type actually stored, or `None` for an empty slot.
    pub found: Option<&'static str>,
}
