//! Raw event envelopes and canonical event-type resolution.
//!
//! Inbound events arrive in one of two shapes:
//!
//! ```text
//! { "type": "team_join", "user": {...} }                         top-level typed
//! { "type": "event_callback", "event": { "type": "message" } }  wrapped callback
//! ```
//!
//! [`Envelope::event_type`] resolves both to the string handlers register
//! against. Resolution only reads the envelope; the value handed to handlers is
//! always the original, untouched JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outer `type` of a wrapped callback envelope.
pub const EVENT_CALLBACK: &str = "event_callback";

/// An opaque inbound event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope(Value);

impl Envelope {
    /// Wraps a raw JSON value.
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Returns the raw JSON value.
    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Consumes the envelope, returning the raw JSON value.
    pub fn into_raw(self) -> Value {
        self.0
    }

    /// The root-level `type` field, if it is a string.
    pub fn outer_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Resolves the canonical event type.
    ///
    /// - wrapped callback with a map `event` → `event.type`
    /// - otherwise a non-empty outer `type`
    /// - otherwise `event.type`
    ///
    /// Returns `None` when nothing resolves, in which case dispatch is a no-op.
    pub fn event_type(&self) -> Option<&str> {
        let inner_type = || {
            self.0
                .get("event")
                .and_then(|event| event.get("type"))
                .and_then(Value::as_str)
        };

        let resolved = match self.outer_type() {
            Some(EVENT_CALLBACK) if self.0.get("event").is_some_and(Value::is_object) => {
                inner_type()
            }
            Some(outer) if !outer.is_empty() => Some(outer),
            _ => inner_type(),
        };

        resolved.filter(|t| !t.is_empty())
    }

    /// The payload carrying event fields: the inner `event` map when present,
    /// otherwise the envelope itself.
    pub fn event(&self) -> &Value {
        match self.0.get("event") {
            Some(inner) if inner.is_object() => inner,
            _ => &self.0,
        }
    }

    /// A string field of [`event`](Self::event).
    pub fn field(&self, key: &str) -> Option<&str> {
        self.event().get(key).and_then(Value::as_str)
    }

    /// Channel id, given either as a plain string or as a `{ "id": ... }` map.
    pub fn channel_id(&self) -> Option<&str> {
        id_of(self.event().get("channel")?)
    }

    /// User id, given either as a plain string or as a `{ "id": ... }` map.
    pub fn user_id(&self) -> Option<&str> {
        id_of(self.event().get("user")?)
    }

    pub fn text(&self) -> Option<&str> {
        self.field("text")
    }

    pub fn subtype(&self) -> Option<&str> {
        self.field("subtype")
    }

    pub fn ts(&self) -> Option<&str> {
        self.field("ts")
    }

    pub fn thread_ts(&self) -> Option<&str> {
        self.field("thread_ts")
    }

    pub fn bot_id(&self) -> Option<&str> {
        self.field("bot_id")
    }

    /// Workspace id from the envelope root, falling back to the inner `team`.
    pub fn team_id(&self) -> Option<&str> {
        self.0
            .get("team_id")
            .and_then(Value::as_str)
            .or_else(|| self.field("team"))
    }

    /// Whether the event was authored by a bot integration.
    pub fn is_bot_message(&self) -> bool {
        self.bot_id().is_some() || self.subtype() == Some("bot_message")
    }

    /// Whether the event is a reply inside an existing thread.
    pub fn is_thread_reply(&self) -> bool {
        match (self.thread_ts(), self.ts()) {
            (Some(thread_ts), Some(ts)) => thread_ts != ts,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

impl From<Value> for Envelope {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}

fn id_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(id) => Some(id),
        Value::Object(map) => map.get("id").and_then(Value::as_str),
        _ => None,
    }
}
