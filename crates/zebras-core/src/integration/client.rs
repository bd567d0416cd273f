//! Outbound chat-platform client.
//!
//! Handlers reach the platform only through [`ChatClient`]; the router and rule
//! engine never call it. Concrete clients live outside the core.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::foundation::error::ClientResult;

/// Identity reported by [`ChatClient::auth_test`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub team: Option<String>,
    pub user_id: Option<String>,
}

/// The platform operations handlers depend on.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Reports which workspace and bot user the credentials belong to.
    async fn auth_test(&self) -> ClientResult<AuthIdentity>;

    /// Posts a message, threaded under `thread_ts` when given. Returns its ts.
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> ClientResult<String>;

    async fn delete_message(&self, channel: &str, ts: &str) -> ClientResult<()>;

    /// Posts a message only `user` can see.
    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str) -> ClientResult<()>;

    /// Opens (or reuses) a direct conversation and returns its channel id.
    async fn open_conversation(&self, users: &[&str]) -> ClientResult<String>;

    /// Publishes a home tab view for `user_id`.
    async fn publish_view(&self, user_id: &str, view: Value) -> ClientResult<()>;

    /// Opens a modal view for an interaction trigger.
    async fn open_view(&self, trigger_id: &str, view: Value) -> ClientResult<()>;
}

/// Shared chat client.
pub type BoxedClient = Arc<dyn ChatClient>;
