//! Runtime error types.

use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors raised by the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A socket frame without a usable `type` or `payload`.
    #[error("Malformed socket frame: {0}")]
    MalformedFrame(String),

    /// A socket frame type the runtime does not handle.
    #[error("Unsupported socket frame type: {0}")]
    UnsupportedFrame(String),

    #[error(transparent)]
    Dispatch(#[from] zebras_core::DispatchError),

    /// Installing a signal handler failed.
    #[error("Failed to listen for shutdown signals: {0}")]
    Signal(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
