//! Audit trail of workspace activity.

use std::sync::Arc;
use std::time::SystemTime;

use tracing::info;
use zebras_core::{Envelope, HandlerResult, Registry, handler_fn};
use zebras_framework::store::EventLogEntry;
use zebras_framework::{AppContext, Plugin, PluginLoadContext, PluginResult};

/// Event types written to the event log.
pub const AUDITED_EVENTS: &[&str] = &[
    "message",
    "channel_created",
    "channel_rename",
    "channel_deleted",
    "channel_archive",
    "channel_unarchive",
    "team_join",
    "user_change",
];

/// Logs and records every audited event.
pub struct AuditPlugin;

impl Plugin for AuditPlugin {
    fn name(&self) -> &'static str {
        "audit"
    }

    fn description(&self) -> &'static str {
        "Records channel, member and message activity"
    }

    fn register(&self, registry: &Registry, ctx: &PluginLoadContext) -> PluginResult<()> {
        for &event_type in AUDITED_EVENTS {
            let app = ctx.app();
            registry.on_event(
                event_type,
                handler_fn(format!("audit.{event_type}"), move |envelope| {
                    record(Arc::clone(&app), event_type, envelope)
                }),
            );
        }
        Ok(())
    }
}

async fn record(app: Arc<AppContext>, event_type: &'static str, envelope: Arc<Envelope>) -> HandlerResult {
    info!(
        event_type,
        user = envelope.user_id(),
        channel = envelope.channel_id(),
        subtype = envelope.subtype(),
        "Audited event"
    );
    app.event_log()
        .record_event(log_entry(event_type, &envelope, None))
        .await?;
    Ok(())
}

/// Builds an event log row from an envelope.
pub(crate) fn log_entry(event_type: &str, envelope: &Envelope, action: Option<&str>) -> EventLogEntry {
    EventLogEntry {
        event_type: event_type.to_string(),
        subtype: envelope.subtype().map(str::to_string),
        team_id: envelope.team_id().map(str::to_string),
        channel_id: envelope.channel_id().map(str::to_string),
        user_id: envelope.user_id().map(str::to_string),
        message_ts: envelope.ts().map(str::to_string),
        thread_ts: envelope.thread_ts().map(str::to_string),
        action: action.map(str::to_string),
        raw: envelope.raw().clone(),
        created_at: SystemTime::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::load;
    use serde_json::{Value, json};
    use zebras_framework::store::EventLogStore;
    use zebras_framework::testing::{callback_event, message_event};

    #[tokio::test]
    async fn test_records_audited_events() {
        let loaded = load(AuditPlugin, Value::Null);
        for event_type in AUDITED_EVENTS {
            assert_eq!(loaded.router.handler_count(event_type), 1);
        }

        loaded
            .router
            .dispatch(message_event("C1", "U1", "hello", "1.0"))
            .await;
        loaded
            .router
            .dispatch(callback_event(
                "channel_created",
                json!({ "channel": { "id": "C9", "name": "new" } }),
            ))
            .await;

        let events = loaded.test.store.recent_events(10).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "channel_created");
        assert_eq!(events[0].channel_id.as_deref(), Some("C9"));
        assert_eq!(events[1].event_type, "message");
        assert_eq!(events[1].team_id.as_deref(), Some("T1"));
        assert_eq!(events[1].user_id.as_deref(), Some("U1"));
        assert_eq!(events[1].message_ts.as_deref(), Some("1.0"));
        assert_eq!(events[1].action, None);
    }

    #[tokio::test]
    async fn test_team_falls_back_to_inner_event() {
        let loaded = load(AuditPlugin, Value::Null);
        loaded
            .router
            .dispatch(Envelope::new(json!({
                "type": "event_callback",
                "event": { "type": "team_join", "user": { "id": "U7" }, "team": "T2" }
            })))
            .await;

        let events = loaded.test.store.recent_events(1).await.unwrap();
        assert_eq!(events[0].team_id.as_deref(), Some("T2"));
        assert_eq!(events[0].user_id.as_deref(), Some("U7"));
    }

    #[tokio::test]
    async fn test_unaudited_events_ignored() {
        let loaded = load(AuditPlugin, Value::Null);
        loaded
            .router
            .dispatch(callback_event("reaction_added", json!({ "user": "U1" })))
            .await;
        assert!(loaded.test.store.recent_events(10).await.unwrap().is_empty());
    }
}
