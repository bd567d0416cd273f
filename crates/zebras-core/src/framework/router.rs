//! Event router: canonical type resolution, middleware, handler fan-out.
//!
//! # Example
//!
//! ```rust,ignore
//! let router = Router::new();
//! router.add_middleware(middleware_fn("log", |envelope, next: Next| async move {
//!     tracing::info!(event_type = next.event_type(), "event");
//!     next.run(envelope).await;
//! }));
//! router.on("message", handler_fn("echo", on_message));
//!
//! router.dispatch(Envelope::new(raw)).await;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Instrument, debug, debug_span};

use super::handler::{BoxedHandler, Handler};
use super::middleware::{BoxedMiddleware, FanOut, Middleware, Next};
use super::registry::Registry;
use crate::foundation::envelope::Envelope;

/// Routes envelopes to the handlers registered for their canonical type.
///
/// Registration takes `&self`; the tables sit behind reader-writer locks and
/// every dispatch works on a snapshot taken when it starts.
#[derive(Default)]
pub struct Router {
    handlers: RwLock<HashMap<String, Vec<BoxedHandler>>>,
    middleware: RwLock<Vec<BoxedMiddleware>>,
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router holding every event handler collected by `registry`.
    pub fn from_registry(registry: &Registry) -> Self {
        let router = Self::new();
        router.bind(registry);
        router
    }

    /// Appends every event handler collected by `registry`.
    pub fn bind(&self, registry: &Registry) {
        let mut handlers = self.handlers.write();
        for (event_type, list) in registry.event_handlers() {
            handlers.entry(event_type).or_default().extend(list);
        }
    }

    /// Registers a handler for a canonical event type.
    pub fn on(&self, event_type: impl Into<String>, handler: impl Handler) {
        self.on_boxed(event_type, Arc::new(handler));
    }

    /// Registers an already shared handler.
    pub fn on_boxed(&self, event_type: impl Into<String>, handler: BoxedHandler) {
        let event_type = event_type.into();
        debug!(event_type = %event_type, handler = handler.name(), "Registered event handler");
        self.handlers
            .write()
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    /// Appends a middleware; the first one added is the outermost layer.
    pub fn add_middleware(&self, middleware: impl Middleware) {
        self.add_middleware_boxed(Arc::new(middleware));
    }

    /// Appends an already shared middleware.
    pub fn add_middleware_boxed(&self, middleware: BoxedMiddleware) {
        debug!(middleware = middleware.name(), "Registered middleware");
        self.middleware.write().push(middleware);
    }

    /// Number of handlers registered for `event_type`.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers.read().get(event_type).map_or(0, Vec::len)
    }

    /// Number of registered middleware layers.
    pub fn middleware_count(&self) -> usize {
        self.middleware.read().len()
    }

    /// Event types with at least one handler, sorted.
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.read().keys().cloned().collect();
        types.sort();
        types
    }

    /// Dispatches an envelope.
    ///
    /// Returns immediately when no canonical type can be resolved. Otherwise
    /// the middleware chain runs around a sequential fan-out over the handlers
    /// for that type; handler errors and panics are logged and never reach the
    /// caller.
    pub async fn dispatch(&self, envelope: Envelope) {
        let Some(event_type) = envelope.event_type().map(str::to_owned) else {
            debug!("Ignoring envelope without a resolvable event type");
            return;
        };

        let handlers = self
            .handlers
            .read()
            .get(&event_type)
            .cloned()
            .unwrap_or_default();
        let layers: Arc<[BoxedMiddleware]> = self.middleware.read().iter().cloned().collect();

        let span = debug_span!("dispatch", event_type = %event_type, handlers = handlers.len());
        let terminal = Arc::new(FanOut::new(event_type, handlers));

        Next::new(layers, terminal)
            .run(Arc::new(envelope))
            .instrument(span)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::BoxError;
    use crate::framework::handler::handler_fn;
    use crate::framework::middleware::middleware_fn;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, label: &'static str) -> impl Handler {
        let log = Arc::clone(log);
        handler_fn(label, move |_envelope: Arc<Envelope>| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push(label.to_string());
                Ok::<_, BoxError>(())
            }
        })
    }

    fn counter(count: &Arc<AtomicUsize>) -> impl Handler {
        let count = Arc::clone(count);
        handler_fn("counter", move |_envelope: Arc<Envelope>| {
            let count = Arc::clone(&count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            }
        })
    }

    fn layer(log: &Log, label: &'static str, call_next: bool) -> impl Middleware {
        let log = Arc::clone(log);
        middleware_fn(label, move |envelope: Arc<Envelope>, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push(format!("{label}:before"));
                if call_next {
                    next.run(envelope).await;
                }
                log.lock().push(format!("{label}:after"));
            }
        })
    }

    #[tokio::test]
    async fn test_dispatch_wrapped_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let router = Router::new();
        router.on("message", counter(&count));

        router
            .dispatch(Envelope::new(json!({
                "type": "event_callback",
                "event": { "type": "message", "text": "hi" }
            })))
            .await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_top_level_type() {
        let count = Arc::new(AtomicUsize::new(0));
        let router = Router::new();
        router.on("team_join", counter(&count));
        router.on("message", counter(&Arc::new(AtomicUsize::new(0))));

        router.dispatch(Envelope::new(json!({ "type": "team_join" }))).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_without_type_is_noop() {
        let log: Log = Arc::default();
        let router = Router::new();
        router.add_middleware(layer(&log, "m0", true));
        router.on("message", recorder(&log, "h"));

        router.dispatch(Envelope::new(json!({ "text": "hello" }))).await;

        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_without_handlers() {
        let log: Log = Arc::default();
        let router = Router::new();
        router.add_middleware(layer(&log, "m0", true));

        router.dispatch(Envelope::new(json!({ "type": "reaction_added" }))).await;

        assert_eq!(*log.lock(), vec!["m0:before", "m0:after"]);
    }

    #[tokio::test]
    async fn test_handlers_run_in_registration_order() {
        let log: Log = Arc::default();
        let router = Router::new();
        router.on("message", recorder(&log, "first"));
        router.on("message", recorder(&log, "second"));
        router.on("message", recorder(&log, "third"));

        router.dispatch(Envelope::new(json!({ "type": "message" }))).await;

        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_handlers_receive_original_envelope() {
        let raw = json!({ "type": "event_callback", "event": { "type": "message" } });
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);

        let router = Router::new();
        router.on(
            "message",
            handler_fn("capture", move |envelope: Arc<Envelope>| {
                let seen = Arc::clone(&seen_clone);
                async move {
                    *seen.lock() = Some(envelope.raw().clone());
                    Ok::<_, BoxError>(())
                }
            }),
        );

        router.dispatch(Envelope::new(raw.clone())).await;

        assert_eq!(seen.lock().as_ref(), Some(&raw));
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_siblings() {
        let count = Arc::new(AtomicUsize::new(0));
        let router = Router::new();
        router.on(
            "message",
            handler_fn("broken", |_envelope: Arc<Envelope>| async {
                Err::<(), BoxError>("boom".into())
            }),
        );
        router.on("message", counter(&count));

        router.dispatch(Envelope::new(json!({ "type": "message" }))).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_handler_does_not_stop_siblings() {
        let count = Arc::new(AtomicUsize::new(0));
        let router = Router::new();
        router.on(
            "message",
            handler_fn("panics", |_envelope: Arc<Envelope>| async {
                if true {
                    panic!("handler bug");
                }
                Ok::<(), BoxError>(())
            }),
        );
        router.on("message", counter(&count));

        router.dispatch(Envelope::new(json!({ "type": "message" }))).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_middleware_is_outermost() {
        let log: Log = Arc::default();
        let router = Router::new();
        router.add_middleware(layer(&log, "m0", true));
        router.add_middleware(layer(&log, "m1", true));
        router.on("message", recorder(&log, "h"));

        router.dispatch(Envelope::new(json!({ "type": "message" }))).await;

        assert_eq!(
            *log.lock(),
            vec!["m0:before", "m1:before", "h", "m1:after", "m0:after"]
        );
    }

    #[tokio::test]
    async fn test_middleware_without_next_suppresses_inner_chain() {
        let log: Log = Arc::default();
        let router = Router::new();
        router.add_middleware(layer(&log, "m0", false));
        router.add_middleware(layer(&log, "m1", true));
        router.on("message", recorder(&log, "h"));

        router.dispatch(Envelope::new(json!({ "type": "message" }))).await;

        assert_eq!(*log.lock(), vec!["m0:before", "m0:after"]);
    }

    #[tokio::test]
    async fn test_next_exposes_event_type() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let router = Router::new();
        router.add_middleware(middleware_fn("peek", move |envelope, next: Next| {
            let seen = Arc::clone(&seen_clone);
            async move {
                seen.lock().push((next.event_type().to_string(), next.handler_count()));
                next.run(envelope).await;
            }
        }));
        router.on("message", counter(&Arc::new(AtomicUsize::new(0))));

        router
            .dispatch(Envelope::new(json!({ "type": "event_callback", "event": { "type": "message" } })))
            .await;

        assert_eq!(*seen.lock(), vec![("message".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_registration_changes_apply_to_next_dispatch() {
        let log: Log = Arc::default();
        let router = Router::new();
        router.on("message", recorder(&log, "h"));

        router.dispatch(Envelope::new(json!({ "type": "message" }))).await;
        router.add_middleware(layer(&log, "late", true));
        router.dispatch(Envelope::new(json!({ "type": "message" }))).await;

        assert_eq!(*log.lock(), vec!["h", "late:before", "h", "late:after"]);
        assert_eq!(router.middleware_count(), 1);
        assert_eq!(router.handler_count("message"), 1);
    }
}
