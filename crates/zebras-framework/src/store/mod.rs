//! Persisted entities and the async store traits plugins read them through.
//!
//! Handlers treat returned values as snapshots valid for one invocation.
//! Durability and concurrent-writer correctness are the backend's concern;
//! [`MemoryStore`] is the bundled backend.

mod memory;

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreResult;

pub use memory::MemoryStore;

/// Welcome DM stored when invite settings are first created.
pub const DEFAULT_DM_MESSAGE: &str = "Welcome to the community! Please read the rules in #rules.";

// =============================================================================
// Channel policy
// =============================================================================

/// Per-channel posting policy. Every permission defaults to allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPolicy {
    pub channel_id: String,
    pub allow_top_level_posts: bool,
    pub allow_thread_replies: bool,
    pub allow_bots: bool,
}

impl ChannelPolicy {
    /// The policy of a channel with no stored row.
    pub fn permissive(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            allow_top_level_posts: true,
            allow_thread_replies: true,
            allow_bots: true,
        }
    }

    /// Whether nothing is restricted.
    pub fn is_permissive(&self) -> bool {
        self.allow_top_level_posts && self.allow_thread_replies && self.allow_bots
    }

    /// Applies the fields present in `update`.
    pub fn apply(&mut self, update: &ChannelPolicyUpdate) {
        if let Some(v) = update.allow_top_level_posts {
            self.allow_top_level_posts = v;
        }
        if let Some(v) = update.allow_thread_replies {
            self.allow_thread_replies = v;
        }
        if let Some(v) = update.allow_bots {
            self.allow_bots = v;
        }
    }
}

/// Partial update of a [`ChannelPolicy`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelPolicyUpdate {
    pub allow_top_level_posts: Option<bool>,
    pub allow_thread_replies: Option<bool>,
    pub allow_bots: Option<bool>,
}

#[async_trait]
pub trait ChannelPolicyStore: Send + Sync {
    async fn get_policy(&self, channel_id: &str) -> StoreResult<Option<ChannelPolicy>>;

    /// Inserts with allow-all defaults or updates the present fields.
    async fn upsert_policy(
        &self,
        channel_id: &str,
        update: ChannelPolicyUpdate,
    ) -> StoreResult<ChannelPolicy>;
}

// =============================================================================
// Auto-responder rules
// =============================================================================

/// How an auto-responder phrase is compared with message text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    #[default]
    Contains,
    Exact,
    Regex,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Exact => "exact",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contains" => Ok(Self::Contains),
            "exact" => Ok(Self::Exact),
            "regex" => Ok(Self::Regex),
            other => Err(format!("unknown match type: {other}")),
        }
    }
}

/// A stored auto-responder rule. `channel_id == None` means global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoResponderRule {
    pub id: u64,
    pub phrase: String,
    pub response_text: String,
    pub match_type: MatchType,
    pub case_sensitive: bool,
    pub channel_id: Option<String>,
    pub enabled: bool,
}

impl AutoResponderRule {
    pub fn is_global(&self) -> bool {
        self.channel_id.is_none()
    }
}

/// Fields of a rule about to be created; new rules start enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAutoResponderRule {
    pub phrase: String,
    pub response_text: String,
    pub match_type: MatchType,
    pub case_sensitive: bool,
    pub channel_id: Option<String>,
}

#[async_trait]
pub trait AutoResponderStore: Send + Sync {
    /// Stores an enabled rule and returns its id.
    async fn add_rule(&self, rule: NewAutoResponderRule) -> StoreResult<u64>;

    /// Rules newest first. `None` lists global rules only; a channel lists that
    /// channel's rules together with the global ones.
    async fn list_rules(
        &self,
        channel_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<AutoResponderRule>>;

    /// Enabled rules that apply to `channel_id` (its own and global), oldest
    /// first.
    async fn enabled_rules_for(&self, channel_id: &str) -> StoreResult<Vec<AutoResponderRule>>;

    /// Returns `false` when no rule has that id.
    async fn set_rule_enabled(&self, id: u64, enabled: bool) -> StoreResult<bool>;

    /// Returns `false` when no rule has that id.
    async fn remove_rule(&self, id: u64) -> StoreResult<bool>;
}

// =============================================================================
// Invite settings
// =============================================================================

/// Workspace-wide onboarding settings (a single row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteSettings {
    pub admin_channel_id: Option<String>,
    pub audit_channel_id: Option<String>,
    pub notify_on_join: bool,
    pub dm_message: Option<String>,
}

impl Default for InviteSettings {
    fn default() -> Self {
        Self {
            admin_channel_id: None,
            audit_channel_id: None,
            notify_on_join: true,
            dm_message: Some(DEFAULT_DM_MESSAGE.to_string()),
        }
    }
}

impl InviteSettings {
    /// Applies the fields present in `update`.
    pub fn apply(&mut self, update: InviteSettingsUpdate) {
        if let Some(v) = update.admin_channel_id {
            self.admin_channel_id = Some(v);
        }
        if let Some(v) = update.audit_channel_id {
            self.audit_channel_id = Some(v);
        }
        if let Some(v) = update.notify_on_join {
            self.notify_on_join = v;
        }
        if let Some(v) = update.dm_message {
            self.dm_message = Some(v);
        }
    }
}

/// Partial update of [`InviteSettings`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InviteSettingsUpdate {
    pub admin_channel_id: Option<String>,
    pub audit_channel_id: Option<String>,
    pub notify_on_join: Option<bool>,
    pub dm_message: Option<String>,
}

#[async_trait]
pub trait InviteSettingsStore: Send + Sync {
    async fn get_invite_settings(&self) -> StoreResult<Option<InviteSettings>>;

    /// Inserts defaults overlaid with `update`, or updates the present fields.
    async fn upsert_invite_settings(
        &self,
        update: InviteSettingsUpdate,
    ) -> StoreResult<InviteSettings>;
}

// =============================================================================
// Event log
// =============================================================================

/// One audited event or moderation action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub event_type: String,
    pub subtype: Option<String>,
    pub team_id: Option<String>,
    pub channel_id: Option<String>,
    pub user_id: Option<String>,
    pub message_ts: Option<String>,
    pub thread_ts: Option<String>,
    /// Moderation action taken, e.g. `message_removed`.
    pub action: Option<String>,
    pub raw: Value,
    pub created_at: SystemTime,
}

#[async_trait]
pub trait EventLogStore: Send + Sync {
    async fn record_event(&self, entry: EventLogEntry) -> StoreResult<()>;

    /// Most recent entries, newest first.
    async fn recent_events(&self, limit: usize) -> StoreResult<Vec<EventLogEntry>>;
}

// =============================================================================
// Health
// =============================================================================

/// Backend identity and health.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Short backend name shown in diagnostics.
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissive_policy() {
        let mut policy = ChannelPolicy::permissive("C1");
        assert!(policy.is_permissive());

        policy.apply(&ChannelPolicyUpdate {
            allow_bots: Some(false),
            ..Default::default()
        });
        assert!(!policy.allow_bots);
        assert!(policy.allow_thread_replies);
        assert!(!policy.is_permissive());
    }

    #[test]
    fn test_match_type_parse() {
        assert_eq!("EXACT".parse::<MatchType>(), Ok(MatchType::Exact));
        assert_eq!("regex".parse::<MatchType>(), Ok(MatchType::Regex));
        assert!("fuzzy".parse::<MatchType>().is_err());
        assert_eq!(MatchType::default().to_string(), "contains");
    }

    #[test]
    fn test_invite_settings_defaults() {
        let mut settings = InviteSettings::default();
        assert!(settings.notify_on_join);
        assert_eq!(settings.dm_message.as_deref(), Some(DEFAULT_DM_MESSAGE));

        settings.apply(InviteSettingsUpdate {
            notify_on_join: Some(false),
            admin_channel_id: Some("C1".into()),
            ..Default::default()
        });
        assert!(!settings.notify_on_join);
        assert_eq!(settings.admin_channel_id.as_deref(), Some("C1"));
        assert_eq!(settings.dm_message.as_deref(), Some(DEFAULT_DM_MESSAGE));
    }
}
