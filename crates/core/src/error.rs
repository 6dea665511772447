// Central Error Type for the Backend

use thiserror::Error;

/// Error type shared by the queue, the dispatcher and the facade.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Missing or invalid configuration, e.g. an empty database path.
    #[error("Config error: {0}")]
    Config(String),

    /// Store I/O, transaction, or open/close failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Job or processor lookup miss.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Illegal state transition request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Attempt to hand a job to a processor that is already busy.
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Result type alias using BackendError
pub type Result<T> = std::result::Result<T, BackendError>;

// Note: sled::Error conversion is handled in the infra-sled crate
// (orphan rules; core must not depend on the storage engine).
