//! In-process store backend.

use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use super::{
    AutoResponderRule, AutoResponderStore, ChannelPolicy, ChannelPolicyStore,
    ChannelPolicyUpdate, Datastore, EventLogEntry, EventLogStore, InviteSettings,
    InviteSettingsStore, InviteSettingsUpdate, NewAutoResponderRule,
};
use crate::error::StoreResult;

const DEFAULT_EVENT_LOG_CAPACITY: usize = 1_000;

#[derive(Default)]
struct State {
    policies: HashMap<String, ChannelPolicy>,
    rules: BTreeMap<u64, AutoResponderRule>,
    next_rule_id: u64,
    invite: Option<InviteSettings>,
    events: VecDeque<EventLogEntry>,
}

/// Store backend holding everything in memory.
///
/// Implements every store trait; the event log keeps only the most recent
/// entries up to its capacity.
pub struct MemoryStore {
    state: RwLock<State>,
    event_log_capacity: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        }
    }

    /// Sets how many event log entries are retained.
    pub fn with_event_log_capacity(mut self, capacity: usize) -> Self {
        self.event_log_capacity = capacity.max(1);
        self
    }
}

#[async_trait]
impl ChannelPolicyStore for MemoryStore {
    async fn get_policy(&self, channel_id: &str) -> StoreResult<Option<ChannelPolicy>> {
        Ok(self.state.read().policies.get(channel_id).cloned())
    }

    async fn upsert_policy(
        &self,
        channel_id: &str,
        update: ChannelPolicyUpdate,
    ) -> StoreResult<ChannelPolicy> {
        let mut state = self.state.write();
        let policy = state
            .policies
            .entry(channel_id.to_string())
            .or_insert_with(|| ChannelPolicy::permissive(channel_id));
        policy.apply(&update);
        trace!(channel = channel_id, ?update, "Upserted channel policy");
        Ok(policy.clone())
    }
}

#[async_trait]
impl AutoResponderStore for MemoryStore {
    async fn add_rule(&self, rule: NewAutoResponderRule) -> StoreResult<u64> {
        let mut state = self.state.write();
        state.next_rule_id += 1;
        let id = state.next_rule_id;
        state.rules.insert(
            id,
            AutoResponderRule {
                id,
                phrase: rule.phrase,
                response_text: rule.response_text,
                match_type: rule.match_type,
                case_sensitive: rule.case_sensitive,
                channel_id: rule.channel_id,
                enabled: true,
            },
        );
        Ok(id)
    }

    async fn list_rules(
        &self,
        channel_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<AutoResponderRule>> {
        let state = self.state.read();
        Ok(state
            .rules
            .values()
            .rev()
            .filter(|rule| match channel_id {
                None => rule.is_global(),
                Some(channel) => rule.is_global() || rule.channel_id.as_deref() == Some(channel),
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn enabled_rules_for(&self, channel_id: &str) -> StoreResult<Vec<AutoResponderRule>> {
        let state = self.state.read();
        Ok(state
            .rules
            .values()
            .filter(|rule| {
                rule.enabled
                    && (rule.is_global() || rule.channel_id.as_deref() == Some(channel_id))
            })
            .cloned()
            .collect())
    }

    async fn set_rule_enabled(&self, id: u64, enabled: bool) -> StoreResult<bool> {
        let mut state = self.state.write();
        Ok(match state.rules.get_mut(&id) {
            Some(rule) => {
                rule.enabled = enabled;
                true
            }
            None => false,
        })
    }

    async fn remove_rule(&self, id: u64) -> StoreResult<bool> {
        Ok(self.state.write().rules.remove(&id).is_some())
    }
}

#[async_trait]
impl InviteSettingsStore for MemoryStore {
    async fn get_invite_settings(&self) -> StoreResult<Option<InviteSettings>> {
        Ok(self.state.read().invite.clone())
    }

    async fn upsert_invite_settings(
        &self,
        update: InviteSettingsUpdate,
    ) -> StoreResult<InviteSettings> {
        let mut state = self.state.write();
        let settings = state.invite.get_or_insert_with(InviteSettings::default);
        settings.apply(update);
        Ok(settings.clone())
    }
}

#[async_trait]
impl EventLogStore for MemoryStore {
    async fn record_event(&self, entry: EventLogEntry) -> StoreResult<()> {
        let mut state = self.state.write();
        while state.events.len() >= self.event_log_capacity {
            state.events.pop_front();
        }
        state.events.push_back(entry);
        Ok(())
    }

    async fn recent_events(&self, limit: usize) -> StoreResult<Vec<EventLogEntry>> {
        let state = self.state.read();
        Ok(state.events.iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MatchType;
    use serde_json::json;
    use std::time::SystemTime;

    fn new_rule(phrase: &str, channel: Option<&str>) -> NewAutoResponderRule {
        NewAutoResponderRule {
            phrase: phrase.to_string(),
            response_text: format!("re: {phrase}"),
            match_type: MatchType::Contains,
            case_sensitive: false,
            channel_id: channel.map(str::to_string),
        }
    }

    fn entry(event_type: &str) -> EventLogEntry {
        EventLogEntry {
            event_type: event_type.to_string(),
            subtype: None,
            team_id: None,
            channel_id: None,
            user_id: None,
            message_ts: None,
            thread_ts: None,
            action: None,
            raw: json!({ "type": event_type }),
            created_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn test_policy_upsert_defaults_to_allow() {
        let store = MemoryStore::new();
        assert_eq!(store.get_policy("C1").await.unwrap(), None);

        let policy = store
            .upsert_policy(
                "C1",
                ChannelPolicyUpdate {
                    allow_top_level_posts: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!policy.allow_top_level_posts);
        assert!(policy.allow_thread_replies);
        assert!(policy.allow_bots);

        let policy = store
            .upsert_policy(
                "C1",
                ChannelPolicyUpdate {
                    allow_bots: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!policy.allow_top_level_posts);
        assert!(!policy.allow_bots);
    }

    #[tokio::test]
    async fn test_rule_scopes_and_ordering() {
        let store = MemoryStore::new();
        let global = store.add_rule(new_rule("hi", None)).await.unwrap();
        let here = store.add_rule(new_rule("yo", Some("C1"))).await.unwrap();
        let elsewhere = store.add_rule(new_rule("hey", Some("C2"))).await.unwrap();

        let ids = |rules: Vec<AutoResponderRule>| rules.into_iter().map(|r| r.id).collect::<Vec<_>>();

        assert_eq!(ids(store.list_rules(None, 50).await.unwrap()), vec![global]);
        assert_eq!(ids(store.list_rules(Some("C1"), 50).await.unwrap()), vec![here, global]);
        assert_eq!(ids(store.list_rules(Some("C2"), 1).await.unwrap()), vec![elsewhere]);
        assert_eq!(ids(store.enabled_rules_for("C1").await.unwrap()), vec![global, here]);

        assert!(store.set_rule_enabled(global, false).await.unwrap());
        assert_eq!(ids(store.enabled_rules_for("C1").await.unwrap()), vec![here]);

        assert!(store.remove_rule(here).await.unwrap());
        assert!(!store.remove_rule(here).await.unwrap());
        assert!(!store.set_rule_enabled(999, true).await.unwrap());
        assert!(store.enabled_rules_for("C1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invite_settings_upsert() {
        let store = MemoryStore::new();
        assert!(store.get_invite_settings().await.unwrap().is_none());

        let settings = store
            .upsert_invite_settings(InviteSettingsUpdate {
                admin_channel_id: Some("C1".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(settings.notify_on_join);
        assert_eq!(settings.admin_channel_id.as_deref(), Some("C1"));
        assert!(settings.dm_message.is_some());
    }

    #[tokio::test]
    async fn test_event_log_is_bounded() {
        let store = MemoryStore::new().with_event_log_capacity(2);
        for event_type in ["a", "b", "c"] {
            store.record_event(entry(event_type)).await.unwrap();
        }

        let recent: Vec<String> = store
            .recent_events(10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(recent, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_datastore_health() {
        let store = MemoryStore::new();
        assert_eq!(store.backend(), "memory");
        assert!(store.ping().await.is_ok());
    }
}
