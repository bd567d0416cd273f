//! Admin home tab and settings modal.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info};
use zebras_core::{Envelope, HandlerResult, Registry, handler_fn, interaction_fn};
use zebras_framework::store::{InviteSettings, InviteSettingsUpdate};
use zebras_framework::{AppContext, Plugin, PluginLoadContext, PluginResult};

use crate::on_off;

/// Action id of the home tab button.
pub const OPEN_SETTINGS_ACTION: &str = "open_settings";
/// Callback id of the settings modal.
pub const SETTINGS_VIEW: &str = "admin_settings";

/// Publishes the admin home tab and handles the settings modal.
pub struct AdminPlugin;

impl Plugin for AdminPlugin {
    fn name(&self) -> &'static str {
        "admin"
    }

    fn description(&self) -> &'static str {
        "Admin home tab and settings modal"
    }

    fn register(&self, registry: &Registry, ctx: &PluginLoadContext) -> PluginResult<()> {
        let app = ctx.app();
        registry.on_event(
            "app_home_opened",
            handler_fn("admin.home", move |envelope| {
                publish_home(Arc::clone(&app), envelope)
            }),
        );

        let app = ctx.app();
        registry.action(
            OPEN_SETTINGS_ACTION,
            interaction_fn("admin.open_settings", move |payload| {
                open_settings(Arc::clone(&app), payload)
            }),
        );

        let app = ctx.app();
        registry.view_submission(
            SETTINGS_VIEW,
            interaction_fn("admin.save_settings", move |payload| {
                save_settings(Arc::clone(&app), payload)
            }),
        );
        Ok(())
    }
}

async fn publish_home(app: Arc<AppContext>, envelope: Arc<Envelope>) -> HandlerResult {
    let Some(user) = envelope.user_id() else {
        return Ok(());
    };
    let settings = app.invite_settings().get_invite_settings().await?;
    app.client()
        .publish_view(user, home_view(settings.as_ref()))
        .await?;
    debug!(user, "Published admin home");
    Ok(())
}

async fn open_settings(app: Arc<AppContext>, payload: Arc<Value>) -> HandlerResult {
    let Some(trigger_id) = payload.get("trigger_id").and_then(Value::as_str) else {
        return Ok(());
    };
    let settings = app.invite_settings().get_invite_settings().await?;
    app.client()
        .open_view(trigger_id, settings_modal(settings.as_ref()))
        .await?;
    Ok(())
}

async fn save_settings(app: Arc<AppContext>, payload: Arc<Value>) -> HandlerResult {
    let update = parse_submission(&payload);
    let settings = app.invite_settings().upsert_invite_settings(update).await?;
    info!(
        admin_channel = settings.admin_channel_id.as_deref(),
        audit_channel = settings.audit_channel_id.as_deref(),
        notify = settings.notify_on_join,
        "Saved admin settings"
    );
    Ok(())
}

// =============================================================================
// Views
// =============================================================================

fn channel_label(channel: Option<&str>) -> String {
    channel.map_or_else(|| "unset".to_string(), |ch| format!("<#{ch}>"))
}

/// The home tab summarising the current settings.
pub fn home_view(settings: Option<&InviteSettings>) -> Value {
    let admin = channel_label(settings.and_then(|s| s.admin_channel_id.as_deref()));
    let audit = channel_label(settings.and_then(|s| s.audit_channel_id.as_deref()));
    let notify = settings.is_some_and(|s| s.notify_on_join);

    json!({
        "type": "home",
        "blocks": [
            { "type": "header", "text": { "type": "plain_text", "text": "ZEBRAS Admin" } },
            { "type": "section", "text": { "type": "mrkdwn", "text": "Quick settings and status" } },
            { "type": "section", "fields": [
                { "type": "mrkdwn", "text": format!("*Admin channel:* {admin}") },
                { "type": "mrkdwn", "text": format!("*Audit channel:* {audit}") },
                { "type": "mrkdwn", "text": format!("*Notify on join:* {}", on_off(notify)) },
            ]},
            { "type": "actions", "elements": [
                {
                    "type": "button",
                    "action_id": OPEN_SETTINGS_ACTION,
                    "text": { "type": "plain_text", "text": "Open Settings" },
                },
            ]},
        ],
    })
}

fn conversation_select(initial: Option<&str>) -> Value {
    let mut element = json!({
        "type": "conversations_select",
        "action_id": "val",
        "default_to_current_conversation": false,
    });
    if let Some(channel) = initial {
        element["initial_conversation"] = json!(channel);
    }
    element
}

fn input_block(block_id: &str, label: &str, element: Value) -> Value {
    json!({
        "type": "input",
        "block_id": block_id,
        "element": element,
        "label": { "type": "plain_text", "text": label },
    })
}

fn option(text: &str, value: &str) -> Value {
    json!({ "text": { "type": "plain_text", "text": text }, "value": value })
}

/// The settings modal, prefilled from the current settings.
pub fn settings_modal(settings: Option<&InviteSettings>) -> Value {
    let notify = settings.is_some_and(|s| s.notify_on_join);
    let initial_notify = if notify { option("ON", "on") } else { option("OFF", "off") };
    let dm_message = settings
        .and_then(|s| s.dm_message.as_deref())
        .unwrap_or_default();

    json!({
        "type": "modal",
        "callback_id": SETTINGS_VIEW,
        "title": { "type": "plain_text", "text": "ZEBRAS Settings" },
        "submit": { "type": "plain_text", "text": "Save" },
        "close": { "type": "plain_text", "text": "Cancel" },
        "blocks": [
            input_block(
                "admin_channel",
                "Admin channel",
                conversation_select(settings.and_then(|s| s.admin_channel_id.as_deref())),
            ),
            input_block(
                "audit_channel",
                "Audit channel",
                conversation_select(settings.and_then(|s| s.audit_channel_id.as_deref())),
            ),
            input_block(
                "notify",
                "Notify on join",
                json!({
                    "type": "static_select",
                    "action_id": "val",
                    "options": [option("ON", "on"), option("OFF", "off")],
                    "initial_option": initial_notify,
                }),
            ),
            input_block(
                "dm_message",
                "DM message",
                json!({ "type": "plain_text_input", "action_id": "val", "initial_value": dm_message }),
            ),
        ],
    })
}

fn state_value<'a>(values: Option<&'a Value>, block: &str, path: &str) -> Option<&'a Value> {
    values?.get(block)?.get("val")?.pointer(path)
}

/// Reads the submitted modal state; fields left empty stay untouched.
pub fn parse_submission(payload: &Value) -> InviteSettingsUpdate {
    let values = payload.pointer("/view/state/values");
    let string = |block: &str, path: &str| {
        state_value(values, block, path)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    InviteSettingsUpdate {
        admin_channel_id: string("admin_channel", "/selected_conversation"),
        audit_channel_id: string("audit_channel", "/selected_conversation"),
        notify_on_join: state_value(values, "notify", "/selected_option/value")
            .and_then(Value::as_str)
            .map(|v| v == "on"),
        dm_message: string("dm_message", "/value"),
    }
}
