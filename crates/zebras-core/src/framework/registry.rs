//! Registration tables for events, slash commands and interactive callbacks.
//!
//! Plugins register into a [`Registry`] at load time. Event handlers are
//! later bound into a [`Router`](super::router::Router); commands and
//! interactions are dispatched straight from the registry by exact key, one
//! handler per key.

use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::handler::{
    BoxedCommandHandler, BoxedHandler, BoxedInteractionHandler, CommandHandler, Handler,
    InteractionHandler, panic_message,
};
use crate::foundation::error::DispatchResult;
use crate::foundation::response::{CommandResponse, InteractionResponse, SlashCommand};

/// Reply text for a command nobody registered.
pub fn unknown_command_text(command: &str) -> String {
    format!("Unknown command: {command}")
}

/// Reply text when a command handler fails.
pub const COMMAND_ERROR_TEXT: &str = "An error occurred.";

/// Reply text when a command handler returns nothing.
pub const COMMAND_OK_TEXT: &str = "OK";

/// Exact-match table with one handler per key; re-registering replaces.
struct Keyed<H: ?Sized> {
    entries: RwLock<BTreeMap<String, Arc<H>>>,
    kind: &'static str,
}

impl<H: ?Sized> Keyed<H> {
    fn new(kind: &'static str) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            kind,
        }
    }

    fn insert(&self, key: String, handler: Arc<H>) {
        if self.entries.write().insert(key.clone(), handler).is_some() {
            warn!(kind = self.kind, key = %key, "Replacing existing registration");
        } else {
            debug!(kind = self.kind, key = %key, "Registered");
        }
    }

    fn get(&self, key: &str) -> Option<Arc<H>> {
        self.entries.read().get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

struct Tables {
    events: RwLock<HashMap<String, Vec<BoxedHandler>>>,
    commands: Keyed<dyn CommandHandler>,
    actions: Keyed<dyn InteractionHandler>,
    views: Keyed<dyn InteractionHandler>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            events: RwLock::default(),
            commands: Keyed::new("command"),
            actions: Keyed::new("action"),
            views: Keyed::new("view"),
        }
    }
}

/// Shared handle over all registration tables.
///
/// Cloning is cheap and every clone sees the same tables.
#[derive(Clone, Default)]
pub struct Registry {
    tables: Arc<Tables>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers an event handler for a canonical event type.
    pub fn on_event(&self, event_type: impl Into<String>, handler: impl Handler) {
        let handler: BoxedHandler = Arc::new(handler);
        self.tables
            .events
            .write()
            .entry(event_type.into())
            .or_default()
            .push(handler);
    }

    /// Registers the handler for a slash command such as `/auto`.
    pub fn slash(&self, command: impl Into<String>, handler: impl CommandHandler) {
        let handler: BoxedCommandHandler = Arc::new(handler);
        self.tables.commands.insert(command.into(), handler);
    }

    /// Registers the handler for a block action id.
    pub fn action(&self, action_id: impl Into<String>, handler: impl InteractionHandler) {
        let handler: BoxedInteractionHandler = Arc::new(handler);
        self.tables.actions.insert(action_id.into(), handler);
    }

    /// Registers the handler for a view submission callback id.
    pub fn view_submission(&self, callback_id: impl Into<String>, handler: impl InteractionHandler) {
        let handler: BoxedInteractionHandler = Arc::new(handler);
        self.tables.views.insert(callback_id.into(), handler);
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Snapshot of all event handlers, grouped by type in registration order.
    pub fn event_handlers(&self) -> Vec<(String, Vec<BoxedHandler>)> {
        self.tables
            .events
            .read()
            .iter()
            .map(|(event_type, handlers)| (event_type.clone(), handlers.clone()))
            .collect()
    }

    /// Registered slash command names, sorted.
    pub fn command_names(&self) -> Vec<String> {
        self.tables.commands.keys()
    }

    /// Registered block action ids, sorted.
    pub fn action_ids(&self) -> Vec<String> {
        self.tables.actions.keys()
    }

    /// Registered view submission callback ids, sorted.
    pub fn view_ids(&self) -> Vec<String> {
        self.tables.views.keys()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Runs the handler registered for a slash command payload.
    ///
    /// A payload without `command` is malformed and returns an error. Every
    /// other outcome is a response: the unknown-command fallback, the generic
    /// error text when the handler fails, `OK` when it returns nothing.
    pub async fn dispatch_command(&self, payload: &Value) -> DispatchResult<CommandResponse> {
        let command = SlashCommand::from_payload(payload)?;
        Ok(self.run_command(command).await)
    }

    /// Runs the handler for an already parsed slash command.
    pub async fn run_command(&self, command: SlashCommand) -> CommandResponse {
        let Some(handler) = self.tables.commands.get(&command.command) else {
            debug!(command = %command.command, "No handler for command");
            return CommandResponse::ephemeral(unknown_command_text(&command.command));
        };

        let name = command.command.clone();
        let call = async { handler.call(command).await };
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(Some(response))) => response,
            Ok(Ok(None)) => CommandResponse::ephemeral(COMMAND_OK_TEXT),
            Ok(Err(e)) => {
                error!(command = %name, handler = handler.name(), error = %e, "Command handler error");
                CommandResponse::ephemeral(COMMAND_ERROR_TEXT)
            }
            Err(panic) => {
                error!(
                    command = %name,
                    handler = handler.name(),
                    panic = %panic_message(panic.as_ref()),
                    "Command handler panicked"
                );
                CommandResponse::ephemeral(COMMAND_ERROR_TEXT)
            }
        }
    }

    /// Runs the handler for an interactive payload and returns the ack.
    ///
    /// - `block_actions`: key is `actions[0].action_id`, else
    ///   `actions[0].callback_id`, else `callback_id`; replies `{"ok": true}`.
    /// - `view_submission`: key is `view.callback_id`; replies
    ///   `{"response_action": "clear"}`.
    /// - anything else is acknowledged untouched.
    pub async fn dispatch_interaction(&self, payload: Value) -> InteractionResponse {
        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        match kind.as_str() {
            "block_actions" => {
                let key = block_action_key(&payload).map(str::to_owned);
                if let Some(key) = key {
                    let handler = self.tables.actions.get(&key);
                    run_interaction(handler, "block_actions", &key, payload).await;
                }
                InteractionResponse::Ack
            }
            "view_submission" => {
                let key = payload
                    .get("view")
                    .and_then(|view| view.get("callback_id"))
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                if let Some(key) = key {
                    let handler = self.tables.views.get(&key);
                    run_interaction(handler, "view_submission", &key, payload).await;
                }
                InteractionResponse::ClearViews
            }
            other => {
                debug!(kind = other, "Acknowledging unhandled interaction");
                InteractionResponse::Ack
            }
        }
    }
}

fn block_action_key(payload: &Value) -> Option<&str> {
    let first = payload
        .get("actions")
        .and_then(Value::as_array)
        .and_then(|actions| actions.first());

    first
        .and_then(|action| action.get("action_id"))
        .and_then(Value::as_str)
        .or_else(|| {
            first
                .and_then(|action| action.get("callback_id"))
                .and_then(Value::as_str)
        })
        .or_else(|| payload.get("callback_id").and_then(Value::as_str))
}

async fn run_interaction(
    handler: Option<BoxedInteractionHandler>,
    kind: &'static str,
    key: &str,
    payload: Value,
) {
    let Some(handler) = handler else {
        debug!(kind, key, "No handler for interaction");
        return;
    };

    let call = async { handler.call(Arc::new(payload)).await };
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(kind, key, handler = handler.name(), error = %e, "Interaction handler error");
        }
        Err(panic) => {
            error!(
                kind,
                key,
                handler = handler.name(),
                panic = %panic_message(panic.as_ref()),
                "Interaction handler panicked"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::{BoxError, DispatchError};
    use crate::framework::handler::{command_fn, interaction_fn};
    use parking_lot::Mutex;
    use serde_json::json;

    fn capture(seen: &Arc<Mutex<Vec<String>>>, label: &'static str) -> impl InteractionHandler {
        let seen = Arc::clone(seen);
        interaction_fn(label, move |_payload: Arc<Value>| {
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().push(label.to_string());
                Ok::<_, BoxError>(())
            }
        })
    }

    #[tokio::test]
    async fn test_unknown_command_fallback() {
        let registry = Registry::new();
        let response = registry
            .dispatch_command(&json!({ "command": "/nope" }))
            .await
            .unwrap();
        assert_eq!(response.text, "Unknown command: /nope");
    }

    #[tokio::test]
    async fn test_missing_command_is_malformed() {
        let registry = Registry::new();
        let err = registry.dispatch_command(&json!({ "text": "x" })).await.unwrap_err();
        assert!(matches!(err, DispatchError::MissingField("command")));
    }

    #[tokio::test]
    async fn test_command_outcomes() {
        let registry = Registry::new();
        registry.slash(
            "/echo",
            command_fn("echo", |cmd: SlashCommand| async move {
                Ok::<_, BoxError>(Some(CommandResponse::in_channel(cmd.text)))
            }),
        );
        registry.slash(
            "/quiet",
            command_fn("quiet", |_cmd: SlashCommand| async { Ok::<_, BoxError>(None) }),
        );
        registry.slash(
            "/broken",
            command_fn("broken", |_cmd: SlashCommand| async {
                Err::<Option<CommandResponse>, BoxError>("db down".into())
            }),
        );

        let echo = registry
            .dispatch_command(&json!({ "command": "/echo", "text": "hi" }))
            .await
            .unwrap();
        assert_eq!(echo, CommandResponse::in_channel("hi"));

        let quiet = registry.run_command(SlashCommand::new("/quiet", "")).await;
        assert_eq!(quiet.text, "OK");

        let broken = registry.run_command(SlashCommand::new("/broken", "")).await;
        assert_eq!(broken.text, "An error occurred.");
    }

    #[tokio::test]
    async fn test_last_command_registration_wins() {
        let registry = Registry::new();
        registry.slash(
            "/x",
            command_fn("old", |_cmd: SlashCommand| async {
                Ok::<_, BoxError>(Some(CommandResponse::ephemeral("old")))
            }),
        );
        registry.slash(
            "/x",
            command_fn("new", |_cmd: SlashCommand| async {
                Ok::<_, BoxError>(Some(CommandResponse::ephemeral("new")))
            }),
        );

        assert_eq!(registry.command_names(), vec!["/x"]);
        assert_eq!(registry.run_command(SlashCommand::new("/x", "")).await.text, "new");
    }

    #[tokio::test]
    async fn test_block_action_key_resolution() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = Registry::new();
        registry.action("by_action_id", capture(&seen, "action_id"));
        registry.action("by_callback_id", capture(&seen, "callback_id"));
        registry.action("by_payload", capture(&seen, "payload"));

        let responses = [
            registry
                .dispatch_interaction(json!({
                    "type": "block_actions",
                    "actions": [{ "action_id": "by_action_id", "callback_id": "by_callback_id" }]
                }))
                .await,
            registry
                .dispatch_interaction(json!({
                    "type": "block_actions",
                    "actions": [{ "callback_id": "by_callback_id" }]
                }))
                .await,
            registry
                .dispatch_interaction(json!({
                    "type": "block_actions",
                    "actions": [],
                    "callback_id": "by_payload"
                }))
                .await,
        ];

        assert!(responses.iter().all(|r| *r == InteractionResponse::Ack));
        assert_eq!(*seen.lock(), vec!["action_id", "callback_id", "payload"]);
    }

    #[tokio::test]
    async fn test_view_submission_clears() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = Registry::new();
        registry.view_submission("settings", capture(&seen, "settings"));

        let response = registry
            .dispatch_interaction(json!({
                "type": "view_submission",
                "view": { "callback_id": "settings" }
            }))
            .await;

        assert_eq!(response, InteractionResponse::ClearViews);
        assert_eq!(*seen.lock(), vec!["settings"]);
    }

    #[tokio::test]
    async fn test_unknown_interactions_are_acknowledged() {
        let registry = Registry::new();
        registry.action(
            "fails",
            interaction_fn("fails", |_payload: Arc<Value>| async {
                Err::<(), BoxError>("nope".into())
            }),
        );

        let unknown_kind = registry.dispatch_interaction(json!({ "type": "shortcut" })).await;
        let unknown_key = registry
            .dispatch_interaction(json!({ "type": "block_actions", "actions": [{ "action_id": "missing" }] }))
            .await;
        let failing = registry
            .dispatch_interaction(json!({ "type": "block_actions", "actions": [{ "action_id": "fails" }] }))
            .await;

        assert_eq!(unknown_kind, InteractionResponse::Ack);
        assert_eq!(unknown_key, InteractionResponse::Ack);
        assert_eq!(failing, InteractionResponse::Ack);
    }

    #[test]
    fn test_event_handlers_keep_order() {
        use crate::framework::handler::handler_fn;
        use crate::foundation::envelope::Envelope;

        let registry = Registry::new();
        for name in ["a", "b"] {
            registry.on_event(
                "message",
                handler_fn(name, |_envelope: Arc<Envelope>| async { Ok::<_, BoxError>(()) }),
            );
        }

        let handlers = registry.event_handlers();
        assert_eq!(handlers.len(), 1);
        let names: Vec<&str> = handlers[0].1.iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
