//! Main runtime orchestration.
//!
//! The runtime owns the configuration, the application context, the plugin
//! manager and the dispatch tables. Transports feed it [`Inbound`] units,
//! either one at a time through [`ZebrasRuntime::handle`] or as a queue of
//! [`Delivery`] values consumed by [`ZebrasRuntime::serve`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use zebras_runtime::ZebrasRuntime;
//!
//! // Auto-loads config from the current directory
//! let runtime = ZebrasRuntime::new();
//! runtime.register_plugins(zebras_plugins::builtin_plugins());
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(64);
//! spawn_transport(tx);
//! runtime.run(rx).await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Value, json};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use zebras_core::{Envelope, Middleware, Registry, Router};
use zebras_framework::{
    AppContext, BoxedPlugin, Plugin, PluginManager, TimeoutMiddleware, TracingMiddleware,
};

use crate::client::LoggingChatClient;
use crate::config::{ConfigLoader, ConfigResult, ZebrasConfig};
use crate::error::RuntimeResult;
use crate::inbound::{Delivery, Inbound};
use crate::logging;

const URL_VERIFICATION: &str = "url_verification";

/// The zebras runtime.
///
/// # Custom Configuration
///
/// ```rust,ignore
/// let runtime = ZebrasRuntime::builder()
///     .config_file("config/production.toml")
///     .profile("production")
///     .app(AppContext::new(slack_client, store))
///     .build()?;
///
/// // Or use pre-loaded config
/// let config = load_config_from_file("zebras.toml")?;
/// let runtime = ZebrasRuntime::from_config(&config, app);
/// ```
pub struct ZebrasRuntime {
    config: ZebrasConfig,
    app: Arc<AppContext>,
    plugins: PluginManager,
    dispatcher: Dispatcher,
    started: AtomicBool,
}

impl ZebrasRuntime {
    /// Creates a runtime with automatic configuration loading and a
    /// [`LoggingChatClient`] over an in-memory store.
    ///
    /// If no configuration can be loaded, default settings are used.
    pub fn new() -> Self {
        let config = ConfigLoader::new().load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config ({e}), using defaults");
            ZebrasConfig::default()
        });

        Self::from_config(&config, default_app())
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration and an application context.
    ///
    /// Initializes logging (a no-op when a subscriber is already installed)
    /// and installs the dispatch middleware the config asks for.
    pub fn from_config(config: &ZebrasConfig, app: impl Into<Arc<AppContext>>) -> Self {
        logging::init_from_config(&config.logging);

        let router = Arc::new(Router::new());
        if config.dispatch.trace_events {
            router.add_middleware(TracingMiddleware);
        }
        if let Some(limit) = config.dispatch.timeout() {
            router.add_middleware(TimeoutMiddleware::new(limit));
        }

        let plugins = PluginManager::new(
            config.plugins.settings.clone(),
            config.plugins.disabled.clone(),
        );

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            trace_events = config.dispatch.trace_events,
            timeout_ms = config.dispatch.timeout_ms,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            app: app.into(),
            plugins,
            dispatcher: Dispatcher {
                registry: Registry::new(),
                router,
            },
            started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ZebrasConfig {
        &self.config
    }

    pub fn app(&self) -> &Arc<AppContext> {
        &self.app
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    pub fn registry(&self) -> &Registry {
        &self.dispatcher.registry
    }

    pub fn router(&self) -> &Router {
        &self.dispatcher.router
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a plugin; it loads on [`start`](Self::start).
    pub fn register_plugin(&self, plugin: impl Plugin + 'static) {
        self.plugins.register(plugin);
    }

    /// Registers several plugins, keeping their order.
    ///
    /// ```rust,ignore
    /// runtime.register_plugins(zebras_plugins::builtin_plugins());
    /// ```
    pub fn register_plugins(&self, plugins: impl IntoIterator<Item = BoxedPlugin>) {
        for plugin in plugins {
            self.plugins.register_boxed(plugin);
        }
    }

    /// Adds a middleware inside the ones installed from configuration.
    pub fn add_middleware(&self, middleware: impl Middleware) {
        self.dispatcher.router.add_middleware(middleware);
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Loads every registered plugin and binds their event handlers into the
    /// router. Returns the number of plugins that became active; a second call
    /// does nothing and returns 0.
    pub fn start(&self) -> usize {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Runtime is already started");
            return 0;
        }

        let registry = &self.dispatcher.registry;
        let active = self.plugins.load_all(registry, &self.app);
        self.dispatcher.router.bind(registry);

        info!(
            plugins = active,
            commands = ?registry.command_names(),
            event_types = ?self.dispatcher.router.event_types(),
            "Runtime started"
        );
        active
    }

    /// Processes one inbound unit and returns the reply body.
    ///
    /// - events: `url_verification` answers with its challenge string, every
    ///   other envelope is dispatched and answered with `{"ok": true}`
    /// - slash commands: the command response; a payload without `command`
    ///   is an error
    /// - interactions: the acknowledgement
    pub async fn handle(&self, inbound: Inbound) -> RuntimeResult<Value> {
        self.dispatcher.handle(inbound).await
    }

    /// Consumes deliveries until `token` is cancelled or the queue closes.
    ///
    /// Each delivery runs in its own task. Event deliveries are acknowledged
    /// before their handlers run. Deliveries already spawned when the loop
    /// stops are awaited before this returns.
    pub async fn serve(&self, mut rx: mpsc::Receiver<Delivery>, token: CancellationToken) {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                () = token.cancelled() => {
                    info!("Shutdown requested, no longer accepting deliveries");
                    break;
                }
                delivery = rx.recv() => {
                    let Some(delivery) = delivery else {
                        debug!("Delivery queue closed");
                        break;
                    };
                    tasks.spawn(self.dispatcher.clone().deliver(delivery));
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_join(joined),
            }
        }

        if !tasks.is_empty() {
            info!(in_flight = tasks.len(), "Draining in-flight deliveries");
        }
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
    }

    /// Starts the runtime and serves `rx` until Ctrl+C or SIGTERM.
    pub async fn run(&self, rx: mpsc::Receiver<Delivery>) -> RuntimeResult<()> {
        info!("Zebras runtime is now running. Press Ctrl+C to stop.");
        self.serve_until(rx, wait_for_shutdown()).await
    }

    /// Starts the runtime and serves `rx` until `shutdown` completes.
    pub async fn run_until<F>(&self, rx: mpsc::Receiver<Delivery>, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.serve_until(rx, async {
            shutdown.await;
            Ok(())
        })
        .await
    }

    async fn serve_until<F>(&self, rx: mpsc::Receiver<Delivery>, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = RuntimeResult<()>>,
    {
        self.start();

        let token = CancellationToken::new();
        let serve = self.serve(rx, token.clone());
        tokio::pin!(serve);

        tokio::select! {
            () = &mut serve => {
                info!("Delivery queue closed, runtime stopped");
                return Ok(());
            }
            signal = shutdown => signal?,
        }

        token.cancel();
        serve.await;
        info!("Runtime stopped");
        Ok(())
    }
}

impl Default for ZebrasRuntime {
    fn default() -> Self {
        Self::new()
    }
}

fn default_app() -> AppContext {
    AppContext::in_memory(LoggingChatClient::default())
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Delivery task failed");
    }
}

/// Waits for Ctrl+C or, on unix, SIGTERM.
async fn wait_for_shutdown() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// Dispatcher
// =============================================================================

/// The dispatch tables, cloned into every delivery task.
#[derive(Clone)]
struct Dispatcher {
    registry: Registry,
    router: Arc<Router>,
}

impl Dispatcher {
    async fn handle(&self, inbound: Inbound) -> RuntimeResult<Value> {
        match inbound {
            Inbound::Event(envelope) => {
                let (ack, pending) = accept_event(envelope);
                if let Some(envelope) = pending {
                    self.router.dispatch(envelope).await;
                }
                Ok(ack)
            }
            Inbound::SlashCommand(payload) => {
                Ok(self.registry.dispatch_command(&payload).await?.to_json())
            }
            Inbound::Interaction(payload) => {
                Ok(self.registry.dispatch_interaction(payload).await.to_json())
            }
        }
    }

    async fn deliver(self, delivery: Delivery) {
        let Delivery { inbound, reply } = delivery;
        let kind = inbound.kind();

        let body = match inbound {
            Inbound::Event(envelope) => {
                let (ack, pending) = accept_event(envelope);
                send_reply(reply, ack);
                if let Some(envelope) = pending {
                    self.router.dispatch(envelope).await;
                }
                return;
            }
            other => match self.handle(other).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(kind, error = %e, "Rejected inbound payload");
                    json!({ "error": e.to_string() })
                }
            },
        };

        send_reply(reply, body);
    }
}

/// Splits an event into its immediate reply and the envelope left to
/// dispatch, if any.
fn accept_event(envelope: Envelope) -> (Value, Option<Envelope>) {
    if envelope.outer_type() == Some(URL_VERIFICATION) {
        let challenge = envelope
            .raw()
            .get("challenge")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        debug!("Answering url_verification");
        return (Value::String(challenge), None);
    }
    (json!({ "ok": true }), Some(envelope))
}

fn send_reply(reply: Option<tokio::sync::oneshot::Sender<Value>>, body: Value) {
    if let Some(tx) = reply
        && tx.send(body).is_err()
    {
        debug!("Reply receiver dropped");
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`ZebrasRuntime`] with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = ZebrasRuntime::builder()
///     .config_file("config/production.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    app: Option<Arc<AppContext>>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            app: None,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: ZebrasConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses `app` instead of a [`LoggingChatClient`] over an in-memory store.
    pub fn app(mut self, app: impl Into<Arc<AppContext>>) -> Self {
        self.app = Some(app.into());
        self
    }

    pub fn build(self) -> ConfigResult<ZebrasRuntime> {
        let config = self.config_loader.load()?;
        let app = self.app.unwrap_or_else(|| Arc::new(default_app()));
        Ok(ZebrasRuntime::from_config(&config, app))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
