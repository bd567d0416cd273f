//! Onboarding for new workspace members.

use std::sync::Arc;

use tracing::{debug, info, warn};
use zebras_core::{CommandResult, Envelope, HandlerResult, Registry, SlashCommand, command_fn, handler_fn};
use zebras_framework::store::InviteSettingsUpdate;
use zebras_framework::{AppContext, Plugin, PluginLoadContext, PluginResult};

use crate::{ephemeral, on_off};

/// Announces new members to admins and sends them a welcome DM.
pub struct InvitePlugin;

impl Plugin for InvitePlugin {
    fn name(&self) -> &'static str {
        "invite"
    }

    fn description(&self) -> &'static str {
        "Welcomes new members and notifies admins"
    }

    fn register(&self, registry: &Registry, ctx: &PluginLoadContext) -> PluginResult<()> {
        let app = ctx.app();
        registry.slash(
            "/invite-helper",
            command_fn("invite.command", move |command| {
                invite_command(Arc::clone(&app), command)
            }),
        );

        let app = ctx.app();
        registry.on_event(
            "team_join",
            handler_fn("invite.welcome", move |envelope| {
                welcome(Arc::clone(&app), envelope)
            }),
        );
        Ok(())
    }
}

/// Extracts a channel id from `<#C123|name>`, `#C123|name` or a bare id.
pub fn parse_channel_ref(arg: &str) -> &str {
    let trimmed = arg.trim().trim_matches(&['<', '>'][..]);
    match trimmed.strip_prefix('#').and_then(|rest| rest.split_once('|')) {
        Some((id, _)) => id,
        None => trimmed,
    }
}

async fn invite_command(app: Arc<AppContext>, command: SlashCommand) -> CommandResult {
    let text = command.trimmed_text();
    let store = app.invite_settings();

    if let Some(arg) = text.strip_prefix("set-channel ") {
        let channel = parse_channel_ref(arg);
        store
            .upsert_invite_settings(InviteSettingsUpdate {
                admin_channel_id: Some(channel.to_string()),
                ..Default::default()
            })
            .await?;
        info!(channel, "Admin channel updated");
        return ephemeral(format!("Admin channel set to <#{channel}>"));
    }

    if let Some(arg) = text.strip_prefix("notify ") {
        let notify = matches!(arg.trim().to_lowercase().as_str(), "on" | "true" | "yes");
        store
            .upsert_invite_settings(InviteSettingsUpdate {
                notify_on_join: Some(notify),
                ..Default::default()
            })
            .await?;
        return ephemeral(format!("Notify on join {}", on_off(notify)));
    }

    if let Some(message) = text.strip_prefix("message ") {
        store
            .upsert_invite_settings(InviteSettingsUpdate {
                dm_message: Some(message.to_string()),
                ..Default::default()
            })
            .await?;
        return ephemeral("Updated DM message template.");
    }

    let settings = store.get_invite_settings().await?;
    let admin_channel = settings
        .as_ref()
        .and_then(|s| s.admin_channel_id.as_deref())
        .map_or_else(|| "unset".to_string(), |ch| format!("<#{ch}>"));
    let notify = settings.as_ref().is_some_and(|s| s.notify_on_join);
    ephemeral(format!(
        "Invite Helper settings:\n\
         - Admin channel: {admin_channel}\n\
         - Notify on join: {}\n\
         \n\
         Commands:\n\
         - /invite-helper set-channel #channel\n\
         - /invite-helper notify on|off\n\
         - /invite-helper message <text>",
        on_off(notify)
    ))
}

async fn welcome(app: Arc<AppContext>, envelope: Arc<Envelope>) -> HandlerResult {
    let Some(settings) = app.invite_settings().get_invite_settings().await? else {
        debug!("Invite settings not configured, skipping welcome");
        return Ok(());
    };
    let user = envelope.user_id();
    let client = app.client();

    if settings.notify_on_join {
        if let Some(admin_channel) = settings.admin_channel_id.as_deref() {
            let member = user.map_or_else(|| "unknown user".to_string(), |u| format!("<@{u}>"));
            let text = format!("New member joined: {member}");
            if let Err(e) = client.post_message(admin_channel, &text, None).await {
                warn!(channel = admin_channel, error = %e, "Failed to notify admins");
            }
        }
    }

    // No user id, no DM
    if let (Some(message), Some(user)) = (settings.dm_message.as_deref(), user) {
        let dm = match client.open_conversation(&[user]).await {
            Ok(dm) => dm,
            Err(e) => {
                warn!(user, error = %e, "Failed to open DM");
                return Ok(());
            }
        };
        if let Err(e) = client.post_message(&dm, message, None).await {
            warn!(user, error = %e, "Failed to send welcome DM");
        }
    }
    Ok(())
}
