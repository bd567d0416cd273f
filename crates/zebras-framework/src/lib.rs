//! # Zebras Framework
//!
//! Building blocks plugins are written against:
//!
//! - **Plugins**: [`Plugin`], [`PluginLoadContext`], [`PluginManager`]
//! - **Application context**: the chat client and stores ([`AppContext`])
//! - **Storage**: async store traits and the in-memory backend ([`store`])
//! - **Middleware**: [`TracingMiddleware`], [`TimeoutMiddleware`]
//! - **Commands** *(feature `command`)*: clap-based slash command parsing
//! - **Testing** *(feature `testing`)*: a recording chat client and fixtures

#[cfg(feature = "command")]
pub mod command;
pub mod context;
pub mod error;
pub mod middleware;
pub mod plugin;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::AppContext;
pub use error::{PluginError, PluginResult, StoreError, StoreResult};
pub use middleware::{TimeoutMiddleware, TracingMiddleware};
pub use plugin::{BoxedPlugin, Plugin, PluginLoadContext, PluginLoadState, PluginManager};
pub use store::MemoryStore;
