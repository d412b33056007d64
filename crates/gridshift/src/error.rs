//! Operation-level errors

use thiserror::Error;

use crate::store::StoreError;

/// Result type for facade operations
pub type OpResult<T> = std::result::Result<T, OpError>;

/// Anything an operation can fail with: bad caller input or a persistence
/// problem. The distinction matters to callers presenting errors to users:
/// input errors are correctable by the caller, environment errors are not.
#[derive(Debug, Error)]
pub enum OpError {
    #[error(transparent)]
    Input(#[from] gridshift_core::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OpError {
    /// Whether the failure is something the caller can fix by changing
    /// their request (as opposed to a damaged file or failing disk).
    pub fn is_user_error(&self) -> bool {
        match self {
            OpError::Input(_) => true,
            OpError::Store(StoreError::SheetNotFound(_)) => true,
            OpError::Store(StoreError::SheetExists(_)) => true,
            OpError::Store(StoreError::Corrupt { .. }) => false,
            OpError::Store(StoreError::Io(_)) => false,
        }
    }
}
