//! Error types shared across the core.

use thiserror::Error;

/// Type-erased error returned by handlers, rules and plugins.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors surfaced to the caller of command dispatch.
///
/// Event dispatch never fails; see [`Router::dispatch`](crate::Router::dispatch).
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// A required field was absent from the inbound payload.
    #[error("malformed request: missing field '{0}'")]
    MissingField(&'static str),

    /// The payload had the wrong shape.
    #[error("malformed request: {0}")]
    InvalidPayload(String),
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

// =============================================================================
// Client Errors
// =============================================================================

/// Errors returned by a [`ChatClient`](crate::ChatClient).
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The client has no live connection to the platform.
    #[error("chat client not connected")]
    NotConnected,

    /// The platform rejected the call.
    #[error("{method} failed: {message}")]
    Api {
        /// API method name.
        method: String,
        /// Error reported by the platform.
        message: String,
    },

    #[error("chat client error: {0}")]
    Other(String),
}

impl ClientError {
    /// Creates an API error for the given method.
    pub fn api(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            method: method.into(),
            message: message.into(),
        }
    }
}

/// Result type for chat client calls.
pub type ClientResult<T> = Result<T, ClientError>;

// =============================================================================
// Rule Errors
// =============================================================================

/// A rule failed while evaluating.
///
/// The engine does not isolate failing rules; the error carries the name of
/// the rule that failed so callers can decide how to degrade.
#[derive(Debug, Error)]
#[error("rule '{rule}' failed: {source}")]
pub struct RuleError {
    /// Name of the failing rule.
    pub rule: String,
    /// Underlying error.
    #[source]
    pub source: BoxError,
}

impl RuleError {
    pub fn new(rule: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            rule: rule.into(),
            source: source.into(),
        }
    }
}
