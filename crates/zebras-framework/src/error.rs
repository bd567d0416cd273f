//! Framework error types.

use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend could not be reached or rejected the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A record failed validation before it was written.
    #[error("invalid record: {0}")]
    Invalid(String),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while loading a plugin.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin's config section did not match its schema.
    #[error("invalid config for plugin '{plugin}': {source}")]
    Config {
        plugin: String,
        #[source]
        source: serde_json::Error,
    },

    /// The plugin refused to register.
    #[error("plugin '{plugin}' failed to load: {reason}")]
    Load { plugin: String, reason: String },
}

impl PluginError {
    pub fn load(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
