//! Chat client for local runs without platform credentials.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;
use zebras_core::{AuthIdentity, ChatClient, ClientResult};

/// Logs every outbound call instead of sending it and returns synthetic ids.
#[derive(Debug)]
pub struct LoggingChatClient {
    team: String,
    bot_user: String,
    sequence: AtomicU64,
}

impl Default for LoggingChatClient {
    fn default() -> Self {
        Self::new("local", "UZEBRAS")
    }
}

impl LoggingChatClient {
    pub fn new(team: impl Into<String>, bot_user: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            bot_user: bot_user.into(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Slack-style `seconds.sequence` timestamp.
    fn next_ts(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        format!("{secs}.{seq:06}")
    }
}

#[async_trait]
impl ChatClient for LoggingChatClient {
    async fn auth_test(&self) -> ClientResult<AuthIdentity> {
        Ok(AuthIdentity {
            team: Some(self.team.clone()),
            user_id: Some(self.bot_user.clone()),
        })
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> ClientResult<String> {
        let ts = self.next_ts();
        info!(channel, thread_ts, ts = %ts, text, "chat.postMessage");
        Ok(ts)
    }

    async fn delete_message(&self, channel: &str, ts: &str) -> ClientResult<()> {
        info!(channel, ts, "chat.delete");
        Ok(())
    }

    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str) -> ClientResult<()> {
        info!(channel, user, text, "chat.postEphemeral");
        Ok(())
    }

    async fn open_conversation(&self, users: &[&str]) -> ClientResult<String> {
        let channel = format!("D{}", users.join(""));
        info!(users = ?users, channel = %channel, "conversations.open");
        Ok(channel)
    }

    async fn publish_view(&self, user_id: &str, view: Value) -> ClientResult<()> {
        info!(user = user_id, view = %view, "views.publish");
        Ok(())
    }

    async fn open_view(&self, trigger_id: &str, view: Value) -> ClientResult<()> {
        info!(trigger_id, view = %view, "views.open");
        Ok(())
    }
}
