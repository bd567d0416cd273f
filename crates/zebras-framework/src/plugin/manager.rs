//! Plugin registration and load-state tracking.
//!
//! [`PluginManager`] owns every registered plugin and drives registration:
//!
//! ```text
//! register()  ──► Registered
//! load_all()  ──► Active    (register() succeeded)
//!             ──► Failed    (register() returned an error)
//!             ──► Disabled  (name listed in the disabled set)
//! ```
//!
//! Plugins load in registration order, so handlers of an earlier plugin run
//! before those of a later one for the same event type.
//!
//! Loading is not transactional. Plugins register straight into the shared
//! [`Registry`] (some, like `debug`, keep a handle to it), so a plugin whose
//! `register` fails partway keeps the handlers it added before the error and
//! is still reported as [`PluginLoadState::Failed`]. Plugins should validate
//! their config before registering anything.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{error, info, info_span, warn};
use zebras_core::Registry;

use super::{BoxedPlugin, Plugin, PluginLoadContext};
use crate::context::AppContext;

/// Load state of a registered plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginLoadState {
    /// Registered, not yet loaded.
    Registered,
    /// Handlers registered.
    Active,
    /// `register` returned an error. Handlers it added before the error are
    /// not rolled back.
    Failed,
    /// Skipped by configuration.
    Disabled,
}

struct PluginEntry {
    plugin: BoxedPlugin,
    state: PluginLoadState,
}

/// Owner of all plugins.
pub struct PluginManager {
    plugins: RwLock<Vec<PluginEntry>>,
    plugin_configs: HashMap<String, Value>,
    disabled: HashSet<String>,
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new(HashMap::new(), Vec::new())
    }
}

impl PluginManager {
    /// Creates a manager with per-plugin config sections and a disabled list.
    pub fn new(plugin_configs: HashMap<String, Value>, disabled: Vec<String>) -> Self {
        Self {
            plugins: RwLock::new(Vec::new()),
            plugin_configs,
            disabled: disabled.into_iter().collect(),
        }
    }

    /// Adds a plugin. A second plugin with the same name is ignored.
    pub fn register(&self, plugin: impl Plugin + 'static) {
        self.register_boxed(Arc::new(plugin));
    }

    pub fn register_boxed(&self, plugin: BoxedPlugin) {
        let mut plugins = self.plugins.write();
        if plugins.iter().any(|e| e.plugin.name() == plugin.name()) {
            warn!(plugin = plugin.name(), "Plugin already registered, ignoring duplicate");
            return;
        }
        info!(plugin = plugin.name(), "Registered plugin");
        plugins.push(PluginEntry {
            plugin,
            state: PluginLoadState::Registered,
        });
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.read().len()
    }

    /// Names of registered plugins in load order.
    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.read().iter().map(|e| e.plugin.name()).collect()
    }

    pub fn plugin_state(&self, name: &str) -> Option<PluginLoadState> {
        self.plugins
            .read()
            .iter()
            .find(|e| e.plugin.name() == name)
            .map(|e| e.state)
    }

    /// Loads every plugin still in [`PluginLoadState::Registered`] into
    /// `registry`. A failing plugin is logged and marked failed, keeping any
    /// partial registrations; the rest keep loading. Returns the number of
    /// plugins that became active.
    pub fn load_all(&self, registry: &Registry, app: &Arc<AppContext>) -> usize {
        let mut plugins = self.plugins.write();
        let mut activated = 0;

        for entry in plugins.iter_mut() {
            if entry.state != PluginLoadState::Registered {
                continue;
            }

            let name = entry.plugin.name();
            let _span = info_span!("plugin_load", plugin = name).entered();

            if self.disabled.contains(name) {
                info!("Plugin disabled by configuration");
                entry.state = PluginLoadState::Disabled;
                continue;
            }

            let config = self.plugin_configs.get(name).cloned().unwrap_or(Value::Null);
            let ctx = PluginLoadContext::new(name, Arc::clone(app), Arc::new(config));

            match entry.plugin.register(registry, &ctx) {
                Ok(()) => {
                    info!(desc = entry.plugin.description(), "Plugin loaded");
                    entry.state = PluginLoadState::Active;
                    activated += 1;
                }
                Err(e) => {
                    error!(error = %e, "Plugin failed to load");
                    entry.state = PluginLoadState::Failed;
                }
            }
        }

        activated
    }
}
