use crate::{any::TypeMismatch, ecs::HandleError, memory::AllocError, storage::StorageError};

/// Any failure surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Mismatch(#[from] TypeMismatch),

    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error("allocation failed")]
    Alloc,
}

impl From<AllocError> for Error {
    fn from(_: AllocError) -> Self {
        Self::Alloc
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
