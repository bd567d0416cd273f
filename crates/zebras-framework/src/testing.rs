//! Test doubles for plugin and runtime tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use zebras_core::{AuthIdentity, ChatClient, ClientError, ClientResult, Envelope};

use crate::context::AppContext;
use crate::store::MemoryStore;

/// One call made through a [`RecordingClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    PostMessage {
        channel: String,
        text: String,
        thread_ts: Option<String>,
    },
    DeleteMessage {
        channel: String,
        ts: String,
    },
    PostEphemeral {
        channel: String,
        user: String,
        text: String,
    },
    OpenConversation {
        users: Vec<String>,
    },
    PublishView {
        user_id: String,
        view: Value,
    },
    OpenView {
        trigger_id: String,
        view: Value,
    },
}

/// A [`ChatClient`] that records every call and succeeds unless told to fail.
#[derive(Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<ClientCall>>,
    failing: Mutex<bool>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with an API error.
    pub fn fail_all(&self) {
        *self.failing.lock() = true;
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().clone()
    }

    /// Messages posted so far as `(channel, text, thread_ts)`.
    pub fn posted(&self) -> Vec<(String, String, Option<String>)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ClientCall::PostMessage {
                    channel,
                    text,
                    thread_ts,
                } => Some((channel.clone(), text.clone(), thread_ts.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, method: &str, call: ClientCall) -> ClientResult<()> {
        if *self.failing.lock() {
            return Err(ClientError::api(method, "simulated failure"));
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

#[async_trait]
impl ChatClient for RecordingClient {
    async fn auth_test(&self) -> ClientResult<AuthIdentity> {
        if *self.failing.lock() {
            return Err(ClientError::api("auth.test", "invalid_auth"));
        }
        Ok(AuthIdentity {
            team: Some("Test Team".into()),
            user_id: Some("UBOT".into()),
        })
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> ClientResult<String> {
        self.record(
            "chat.postMessage",
            ClientCall::PostMessage {
                channel: channel.into(),
                text: text.into(),
                thread_ts: thread_ts.map(Into::into),
            },
        )?;
        Ok(format!("{}.000100", self.calls.lock().len()))
    }

    async fn delete_message(&self, channel: &str, ts: &str) -> ClientResult<()> {
        self.record(
            "chat.delete",
            ClientCall::DeleteMessage {
                channel: channel.into(),
                ts: ts.into(),
            },
        )
    }

    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str) -> ClientResult<()> {
        self.record(
            "chat.postEphemeral",
            ClientCall::PostEphemeral {
                channel: channel.into(),
                user: user.into(),
                text: text.into(),
            },
        )
    }

    async fn open_conversation(&self, users: &[&str]) -> ClientResult<String> {
        self.record(
            "conversations.open",
            ClientCall::OpenConversation {
                users: users.iter().map(|u| u.to_string()).collect(),
            },
        )?;
        Ok(format!("D{}", users.join("")))
    }

    async fn publish_view(&self, user_id: &str, view: Value) -> ClientResult<()> {
        self.record(
            "views.publish",
            ClientCall::PublishView {
                user_id: user_id.into(),
                view,
            },
        )
    }

    async fn open_view(&self, trigger_id: &str, view: Value) -> ClientResult<()> {
        self.record(
            "views.open",
            ClientCall::OpenView {
                trigger_id: trigger_id.into(),
                view,
            },
        )
    }
}

/// An app context over a fresh memory store, with handles to both doubles.
pub struct TestApp {
    pub app: Arc<AppContext>,
    pub client: Arc<RecordingClient>,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let client = Arc::new(RecordingClient::new());
        let store = Arc::new(MemoryStore::new());
        let app = Arc::new(AppContext::new(client.clone(), store.clone()));
        Self { app, client, store }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A wrapped `message` callback envelope.
pub fn message_event(channel: &str, user: &str, text: &str, ts: &str) -> Envelope {
    Envelope::new(json!({
        "type": "event_callback",
        "team_id": "T1",
        "event": {
            "type": "message",
            "channel": channel,
            "user": user,
            "text": text,
            "ts": ts,
        }
    }))
}

/// A wrapped callback envelope of any type carrying `fields` as the inner event.
pub fn callback_event(event_type: &str, fields: Value) -> Envelope {
    let mut event = match fields {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    event.insert("type".into(), Value::String(event_type.into()));
    Envelope::new(json!({
        "type": "event_callback",
        "team_id": "T1",
        "event": Value::Object(event),
    }))
}
