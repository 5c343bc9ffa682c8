//! Error Types

use thiserror::Error;

use crate::status::Status;

/// Result type alias for session and status operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Client-side state errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Status machine refused a transition
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: Status, to: Status },

    /// Operation needs a current user but none is selected
    #[error("No customer selected")]
    NoUser,

    /// A snapshot for a different customer arrived where the current one was expected
    #[error("Snapshot is for customer {received}, expected {expected}")]
    CustomerMismatch { expected: String, received: String },
}
