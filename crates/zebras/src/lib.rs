//! # Zebras
//!
//! A plugin-driven event router and policy engine for chat workspaces.
//!
//! ## Overview
//!
//! Zebras receives workspace events, slash commands and interactive callbacks,
//! routes each to the handlers registered by its plugins, and applies
//! per-channel posting policies through an ordered rule engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────┐     ┌────────────┐     ┌──────────────────────┐
//! │  Transport  │────▶│ Runtime  │────▶│   Router   │────▶│ Plugin handlers      │──▶ ChatClient
//! │  (frames)   │     │          │────▶│  Registry  │────▶│ (commands, actions)  │──▶ stores
//! └─────────────┘     └──────────┘     └────────────┘     └──────────────────────┘
//! ```
//!
//! - **Runtime**: configuration, plugin lifecycle, delivery loop
//! - **Router**: canonical event types, middleware, sequential fan-out
//! - **Registry**: slash commands, block actions, view submissions
//! - **Plugins**: audit, channel rules, autoresponder, invite helper, admin home, debug
//! - **RuleEngine**: deny-precedent policy decisions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use zebras::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> RuntimeResult<()> {
//!     let runtime = ZebrasRuntime::new();
//!     runtime.register_plugins(builtin_plugins());
//!
//!     let (tx, rx) = tokio::sync::mpsc::channel(64);
//!     spawn_transport(tx);
//!     runtime.run(rx).await
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use zebras_core as core;
pub use zebras_framework as framework;
pub use zebras_plugins as plugins;
pub use zebras_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use zebras::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use zebras_runtime::{
        Delivery, Inbound, LoggingChatClient, RuntimeError, RuntimeResult, ZebrasConfig,
        ZebrasRuntime,
    };

    // Plugin system
    pub use zebras_framework::{AppContext, MemoryStore, Plugin, PluginLoadContext, PluginResult};
    pub use zebras_plugins::builtin_plugins;

    // Handlers and dispatch
    pub use zebras_core::{
        BoxError, CommandResponse, Envelope, Registry, SlashCommand, command_fn, handler_fn,
        interaction_fn,
    };

    // Policy decisions
    pub use zebras_core::{Decision, Rule, RuleEngine, Verdict};

    // Core traits for custom implementations
    pub use zebras_core::{ChatClient, Middleware};
}
