//! Handler traits for events, slash commands and interactive callbacks.
//!
//! Each trait is object safe and returns a boxed `'static` future so handlers
//! can be stored as `Arc<dyn ...>` in registration tables and snapshotted per
//! dispatch. Closures are adapted through [`handler_fn`], [`command_fn`] and
//! [`interaction_fn`].
//!
//! # Example
//!
//! ```rust,ignore
//! use zebras_core::{handler_fn, Envelope};
//!
//! let greet = handler_fn("greet", |envelope: Arc<Envelope>| async move {
//!     tracing::info!(user = ?envelope.user_id(), "hello");
//!     Ok::<_, BoxError>(())
//! });
//! router.on("team_join", greet);
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::foundation::envelope::Envelope;
use crate::foundation::error::BoxError;
use crate::foundation::response::{CommandResponse, SlashCommand};

/// A pinned, boxed, `Send` future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of an event or interaction handler.
pub type HandlerResult = Result<(), BoxError>;

/// Outcome of a slash command handler. `None` means "acknowledge with OK".
pub type CommandResult = Result<Option<CommandResponse>, BoxError>;

// =============================================================================
// Event Handlers
// =============================================================================

/// Handles one canonical event type.
pub trait Handler: Send + Sync + 'static {
    /// Identity used in logs when the handler fails.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Processes the original envelope.
    fn call(&self, envelope: Arc<Envelope>) -> BoxFuture<'static, HandlerResult>;
}

/// Shared event handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// Closure-backed [`Handler`].
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

/// Wraps an async closure as a named [`Handler`].
pub fn handler_fn<F, Fut, E>(name: impl Into<Cow<'static, str>>, f: F) -> HandlerFn<F>
where
    F: Fn(Arc<Envelope>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError>,
{
    HandlerFn {
        name: name.into(),
        f,
    }
}

impl<F, Fut, E> Handler for HandlerFn<F>
where
    F: Fn(Arc<Envelope>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, envelope: Arc<Envelope>) -> BoxFuture<'static, HandlerResult> {
        let fut = (self.f)(envelope);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}

// =============================================================================
// Command Handlers
// =============================================================================

/// Handles one slash command name.
pub trait CommandHandler: Send + Sync + 'static {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn call(&self, command: SlashCommand) -> BoxFuture<'static, CommandResult>;
}

/// Shared command handler.
pub type BoxedCommandHandler = Arc<dyn CommandHandler>;

/// Closure-backed [`CommandHandler`].
pub struct CommandFn<F> {
    name: Cow<'static, str>,
    f: F,
}

/// Wraps an async closure as a named [`CommandHandler`].
pub fn command_fn<F, Fut, E>(name: impl Into<Cow<'static, str>>, f: F) -> CommandFn<F>
where
    F: Fn(SlashCommand) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<CommandResponse>, E>> + Send + 'static,
    E: Into<BoxError>,
{
    CommandFn {
        name: name.into(),
        f,
    }
}

impl<F, Fut, E> CommandHandler for CommandFn<F>
where
    F: Fn(SlashCommand) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<CommandResponse>, E>> + Send + 'static,
    E: Into<BoxError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, command: SlashCommand) -> BoxFuture<'static, CommandResult> {
        let fut = (self.f)(command);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}

// =============================================================================
// Interaction Handlers
// =============================================================================

/// Handles one interactive callback id (button action or view submission).
pub trait InteractionHandler: Send + Sync + 'static {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn call(&self, payload: Arc<Value>) -> BoxFuture<'static, HandlerResult>;
}

/// Shared interaction handler.
pub type BoxedInteractionHandler = Arc<dyn InteractionHandler>;

/// Closure-backed [`InteractionHandler`].
pub struct InteractionFn<F> {
    name: Cow<'static, str>,
    f: F,
}

/// Wraps an async closure as a named [`InteractionHandler`].
pub fn interaction_fn<F, Fut, E>(name: impl Into<Cow<'static, str>>, f: F) -> InteractionFn<F>
where
    F: Fn(Arc<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError>,
{
    InteractionFn {
        name: name.into(),
        f,
    }
}

impl<F, Fut, E> InteractionHandler for InteractionFn<F>
where
    F: Fn(Arc<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, payload: Arc<Value>) -> BoxFuture<'static, HandlerResult> {
        let fut = (self.f)(payload);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}

/// Renders a caught panic payload for logging.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
