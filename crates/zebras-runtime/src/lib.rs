//! Zebras Runtime - Orchestration layer for the zebras chat bot.
//!
//! This crate provides:
//! - Runtime orchestration (`ZebrasRuntime`)
//! - Inbound decoding for socket frames (`Inbound`, `Delivery`)
//! - Layered configuration (`config`)
//! - Logging configuration
//! - A logging chat client for local runs (`LoggingChatClient`)
//!
//! ```ignore
//! use zebras_runtime::ZebrasRuntime;
//!
//! #[tokio::main]
//! async fn main() -> zebras_runtime::RuntimeResult<()> {
//!     let runtime = ZebrasRuntime::new();
//!     runtime.register_plugins(zebras_plugins::builtin_plugins());
//!
//!     let (tx, rx) = tokio::sync::mpsc::channel(64);
//!     spawn_socket_reader(tx);
//!
//!     // Serve until Ctrl+C
//!     runtime.run(rx).await
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod inbound;
pub mod logging;
pub mod runtime;

// Re-exports
pub use client::LoggingChatClient;
pub use config::{ConfigError, ConfigLoader, ConfigResult, ZebrasConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use inbound::{Delivery, Inbound};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{RuntimeBuilder, ZebrasRuntime};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
