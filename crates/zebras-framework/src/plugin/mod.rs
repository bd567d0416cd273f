//! Plugin definition and load context.
//!
//! A plugin is a named feature module that registers event handlers, slash
//! commands and interactive callbacks into the shared [`Registry`]. Plugins
//! never reference each other; everything they need arrives through the
//! [`PluginLoadContext`].
//!
//! # Example
//!
//! ```rust,ignore
//! use zebras_framework::{Plugin, PluginLoadContext, PluginResult};
//! use zebras_core::Registry;
//!
//! struct Hello;
//!
//! impl Plugin for Hello {
//!     fn name(&self) -> &'static str {
//!         "hello"
//!     }
//!
//!     fn register(&self, registry: &Registry, ctx: &PluginLoadContext) -> PluginResult<()> {
//!         let app = ctx.app();
//!         registry.on_event("team_join", handler_fn("hello.greet", move |envelope| {
//!             greet(app.clone(), envelope)
//!         }));
//!         Ok(())
//!     }
//! }
//! ```

mod manager;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use zebras_core::Registry;

use crate::context::AppContext;
use crate::error::{PluginError, PluginResult};

pub use manager::{PluginLoadState, PluginManager};

/// A feature module.
pub trait Plugin: Send + Sync {
    /// Unique name; also the key of the plugin's config section.
    fn name(&self) -> &'static str;

    /// One-line description shown in logs.
    fn description(&self) -> &'static str {
        ""
    }

    /// Registers handlers. Called once when the runtime starts.
    fn register(&self, registry: &Registry, ctx: &PluginLoadContext) -> PluginResult<()>;
}

/// Shared plugin.
pub type BoxedPlugin = Arc<dyn Plugin>;

/// What a plugin receives while registering.
#[derive(Clone, Debug)]
pub struct PluginLoadContext {
    plugin: &'static str,
    app: Arc<AppContext>,
    plugin_config: Arc<Value>,
}

impl PluginLoadContext {
    pub fn new(plugin: &'static str, app: Arc<AppContext>, plugin_config: Arc<Value>) -> Self {
        Self {
            plugin,
            app,
            plugin_config,
        }
    }

    /// The application context; clone the `Arc` into handlers.
    pub fn app(&self) -> Arc<AppContext> {
        Arc::clone(&self.app)
    }

    /// The raw config section (`null` when absent).
    pub fn raw_config(&self) -> &Value {
        &self.plugin_config
    }

    /// Deserializes the config section, falling back to `T::default()` when
    /// the section is absent.
    pub fn get_config<T>(&self) -> PluginResult<T>
    where
        T: DeserializeOwned + Default,
    {
        if self.plugin_config.is_null() {
            return Ok(T::default());
        }
        T::deserialize(self.plugin_config.as_ref()).map_err(|source| PluginError::Config {
            plugin: self.plugin.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingClient;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Settings {
        limit: usize,
        label: String,
    }

    fn ctx(config: Value) -> PluginLoadContext {
        let app = Arc::new(AppContext::in_memory(RecordingClient::new()));
        PluginLoadContext::new("demo", app, Arc::new(config))
    }

    #[test]
    fn test_missing_config_uses_default() {
        let settings: Settings = ctx(Value::Null).get_config().unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_config() {
        let settings: Settings = ctx(json!({ "limit": 5 })).get_config().unwrap();
        assert_eq!(settings.limit, 5);
        assert_eq!(settings.label, "");
    }

    #[test]
    fn test_bad_config_names_plugin() {
        let err = ctx(json!({ "limit": "many" })).get_config::<Settings>().unwrap_err();
        assert!(err.to_string().contains("'demo'"));
    }
}
