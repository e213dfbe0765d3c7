//! Error types for loopline-player
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Every fallible operation is handled at its own boundary and
//! converted to a user-visible error notification; none of these errors
//! leaves the controller in a partially-mutated state.

use thiserror::Error;

/// Main error type for the loopline-player module
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Engine adapter failed to load media
    #[error("Media load error: {0}")]
    MediaLoad(String),

    /// Command requiring loaded media was issued with none loaded
    #[error("No media loaded")]
    NoMediaLoaded,

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using loopline-player Error
pub type Result<T> = std::result::Result<T, Error>;
