//! Engine error type.

use thiserror::Error;

use crate::env::CollaboratorError;
use crate::store::StoreError;
use crate::types::ValidationError;

/// Failure of a state-machine transition.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before any state was touched.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Reading or writing persisted state failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Rule installer, scheduler or tab query failed.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}
