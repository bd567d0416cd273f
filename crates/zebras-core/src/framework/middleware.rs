//! Middleware wrapping the handler fan-out of a single dispatch.
//!
//! Middleware registered first is the outermost layer. Each layer receives the
//! envelope and a [`Next`] continuation; calling [`Next::run`] descends one
//! layer, and the innermost continuation runs every handler for the event.
//! A layer that drops its `Next` without running it suppresses all inner
//! layers and every handler for that dispatch.
//!
//! ```text
//! dispatch ──▶ m0 ──▶ m1 ──▶ ... ──▶ mk ──▶ handlers
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, trace};

use super::handler::{BoxFuture, BoxedHandler, panic_message};
use crate::foundation::envelope::Envelope;

/// A layer around handler invocation.
pub trait Middleware: Send + Sync + 'static {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Processes the envelope, optionally delegating to `next`.
    fn handle(&self, envelope: Arc<Envelope>, next: Next) -> BoxFuture<'static, ()>;
}

/// Shared middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of the chain below the current layer.
///
/// Built fresh for every dispatch from a snapshot of the middleware list, so
/// registration changes take effect on the next dispatch and never affect one
/// already in flight.
pub struct Next {
    layers: Arc<[BoxedMiddleware]>,
    index: usize,
    terminal: Arc<FanOut>,
}

impl Next {
    pub(crate) fn new(layers: Arc<[BoxedMiddleware]>, terminal: Arc<FanOut>) -> Self {
        Self {
            layers,
            index: 0,
            terminal,
        }
    }

    /// The canonical event type of this dispatch.
    pub fn event_type(&self) -> &str {
        &self.terminal.event_type
    }

    /// Number of handlers the terminal stage will invoke.
    pub fn handler_count(&self) -> usize {
        self.terminal.handlers.len()
    }

    /// Runs the next layer, or the handler fan-out once layers are exhausted.
    pub fn run(self, envelope: Arc<Envelope>) -> BoxFuture<'static, ()> {
        let Self {
            layers,
            index,
            terminal,
        } = self;

        let layer = layers.get(index).cloned();
        match layer {
            Some(layer) => {
                trace!(middleware = layer.name(), depth = index, "Entering middleware");
                let next = Self {
                    layers,
                    index: index + 1,
                    terminal,
                };
                layer.handle(envelope, next)
            }
            None => Box::pin(async move { terminal.run(envelope).await }),
        }
    }
}

/// Closure-backed [`Middleware`].
pub struct MiddlewareFn<F> {
    name: Cow<'static, str>,
    f: F,
}

/// Wraps an async closure taking `(envelope, next)` as a named [`Middleware`].
pub fn middleware_fn<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> MiddlewareFn<F>
where
    F: Fn(Arc<Envelope>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    MiddlewareFn {
        name: name.into(),
        f,
    }
}

impl<F, Fut> Middleware for MiddlewareFn<F>
where
    F: Fn(Arc<Envelope>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, envelope: Arc<Envelope>, next: Next) -> BoxFuture<'static, ()> {
        Box::pin((self.f)(envelope, next))
    }
}

// =============================================================================
// Terminal stage
// =============================================================================

/// Sequential, failure-isolated invocation of every handler for one type.
pub(crate) struct FanOut {
    event_type: String,
    handlers: Vec<BoxedHandler>,
}

impl FanOut {
    pub(crate) fn new(event_type: String, handlers: Vec<BoxedHandler>) -> Self {
        Self {
            event_type,
            handlers,
        }
    }

    async fn run(&self, envelope: Arc<Envelope>) {
        for handler in &self.handlers {
            let call = async { handler.call(Arc::clone(&envelope)).await };

            match AssertUnwindSafe(call).catch_unwind().await {
                Ok(Ok(())) => {
                    trace!(event_type = %self.event_type, handler = handler.name(), "Handler completed");
                }
                Ok(Err(e)) => {
                    error!(
                        event_type = %self.event_type,
                        handler = handler.name(),
                        error = %e,
                        "Handler error"
                    );
                }
                Err(panic) => {
                    error!(
                        event_type = %self.event_type,
                        handler = handler.name(),
                        panic = %panic_message(panic.as_ref()),
                        "Handler panicked"
                    );
                }
            }
        }
    }
}
