//! # Zebras Core
//!
//! Event routing, middleware composition and the rule-decision engine.
//!
//! ## Layers
//!
//! ### Foundation
//!
//! - **Envelopes**: raw inbound JSON with canonical type resolution ([`Envelope`])
//! - **Payloads**: slash commands and responses ([`SlashCommand`], [`CommandResponse`])
//! - **Errors**: [`DispatchError`], [`ClientError`], [`RuleError`]
//!
//! ### Framework
//!
//! - **Handlers**: [`Handler`], [`CommandHandler`], [`InteractionHandler`]
//! - **Middleware**: [`Middleware`] layers around each dispatch, driven by [`Next`]
//! - **Router**: per-type fan-out with failure isolation ([`Router`])
//! - **Registry**: registration tables shared by plugins ([`Registry`])
//! - **Rules**: ordered deny-precedent evaluation ([`RuleEngine`])
//!
//! ### Integration
//!
//! - **Chat client**: outbound platform operations ([`ChatClient`])
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐    ┌────────┐    ┌────────────┐    ┌──────────┐
//! │ adapter  │───▶│ Router │───▶│ middleware │───▶│ handlers │
//! └──────────┘    └────────┘    └────────────┘    └──────────┘
//!                                                       │
//!                                          RuleEngine ◀─┤
//!                                          ChatClient ◀─┘
//! ```

pub mod foundation;
pub mod framework;
pub mod integration;

pub use foundation::envelope::{EVENT_CALLBACK, Envelope};
pub use foundation::error::{
    BoxError, ClientError, ClientResult, DispatchError, DispatchResult, RuleError,
};
pub use foundation::response::{CommandResponse, InteractionResponse, ResponseType, SlashCommand};
pub use framework::handler::{
    BoxFuture, BoxedCommandHandler, BoxedHandler, BoxedInteractionHandler, CommandFn,
    CommandHandler, CommandResult, Handler, HandlerFn, HandlerResult, InteractionFn,
    InteractionHandler, command_fn, handler_fn, interaction_fn,
};
pub use framework::middleware::{BoxedMiddleware, Middleware, MiddlewareFn, Next, middleware_fn};
pub use framework::registry::{COMMAND_ERROR_TEXT, COMMAND_OK_TEXT, Registry, unknown_command_text};
pub use framework::router::Router;
pub use framework::rules::{Decision, Rule, RuleEngine, Verdict};
pub use integration::client::{AuthIdentity, BoxedClient, ChatClient};
