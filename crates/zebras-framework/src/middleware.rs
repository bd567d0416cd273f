//! Stock middleware installed by the runtime.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{debug, warn};
use zebras_core::{BoxFuture, Envelope, Middleware, Next};

/// Logs each dispatch with its routing fields and elapsed time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn name(&self) -> &str {
        "tracing"
    }

    fn handle(&self, envelope: Arc<Envelope>, next: Next) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let event_type = next.event_type().to_string();
            let handlers = next.handler_count();
            let started = Instant::now();

            debug!(
                event_type = %event_type,
                channel = envelope.channel_id(),
                user = envelope.user_id(),
                subtype = envelope.subtype(),
                handlers,
                "Dispatching event"
            );

            next.run(Arc::clone(&envelope)).await;

            debug!(
                event_type = %event_type,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Dispatch finished"
            );
        })
    }
}

/// Abandons the rest of the chain once a dispatch exceeds its budget.
///
/// Handlers that have not finished by then are dropped at their next await
/// point; handlers that already ran keep their side effects.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutMiddleware {
    limit: Duration,
}

impl TimeoutMiddleware {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl Middleware for TimeoutMiddleware {
    fn name(&self) -> &str {
        "timeout"
    }

    fn handle(&self, envelope: Arc<Envelope>, next: Next) -> BoxFuture<'static, ()> {
        let limit = self.limit;
        Box::pin(async move {
            let event_type = next.event_type().to_string();
            if timeout(limit, next.run(envelope)).await.is_err() {
                warn!(
                    event_type = %event_type,
                    limit_ms = limit.as_millis() as u64,
                    "Dispatch timed out"
                );
            }
        })
    }
}
