//! Per-channel posting restrictions.
//!
//! Every `message` is checked against the channel's [`ChannelPolicy`] with a
//! [`RuleEngine`] of [`policy::post_rules`]. A denied message is deleted, its
//! author gets an ephemeral explanation, the removal is written to the event
//! log and, when an audit channel is configured, announced there.
//!
//! The policy itself is managed with `/rules`.

pub mod policy;

use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use zebras_core::{
    CommandResult, Envelope, HandlerResult, Registry, RuleEngine, SlashCommand, command_fn,
    handler_fn,
};
use zebras_framework::command::{is_help_request, parse_command, usage_text};
use zebras_framework::store::{ChannelPolicy, ChannelPolicyUpdate};
use zebras_framework::{AppContext, Plugin, PluginLoadContext, PluginResult};

use self::policy::{PostContext, post_rules};
use crate::audit::log_entry;
use crate::{ephemeral, on_off};

const HELP_TEXT: &str = "Rules: list | set <top-level|threads|bots> <on|off>";
const REMOVED_ACTION: &str = "message_removed";

/// Enforces channel posting policies.
pub struct ChannelRulesPlugin;

impl Plugin for ChannelRulesPlugin {
    fn name(&self) -> &'static str {
        "channel_rules"
    }

    fn description(&self) -> &'static str {
        "Removes posts that break a channel's posting policy"
    }

    fn register(&self, registry: &Registry, ctx: &PluginLoadContext) -> PluginResult<()> {
        let engine = Arc::new(post_rules());

        let app = ctx.app();
        registry.on_event(
            "message",
            handler_fn("channel_rules.enforce", move |envelope| {
                enforce(Arc::clone(&app), Arc::clone(&engine), envelope)
            }),
        );

        let app = ctx.app();
        registry.slash(
            "/rules",
            command_fn("channel_rules.command", move |command| {
                rules_command(Arc::clone(&app), command)
            }),
        );
        Ok(())
    }
}

// =============================================================================
// Enforcement
// =============================================================================

async fn enforce(
    app: Arc<AppContext>,
    engine: Arc<RuleEngine<PostContext>>,
    envelope: Arc<Envelope>,
) -> HandlerResult {
    if envelope.subtype().is_some_and(|subtype| subtype != "bot_message") {
        return Ok(());
    }
    let (Some(channel), Some(ts)) = (envelope.channel_id(), envelope.ts()) else {
        return Ok(());
    };

    let policy = app
        .channel_policies()
        .get_policy(channel)
        .await?
        .unwrap_or_else(|| ChannelPolicy::permissive(channel));
    if policy.is_permissive() {
        return Ok(());
    }

    let verdict = engine.evaluate(&PostContext { policy }, &envelope).await?;
    if !verdict.is_denied() {
        return Ok(());
    }
    let reason = verdict
        .reason
        .as_deref()
        .unwrap_or("This post is not allowed in this channel.");

    info!(channel, ts, reason, "Removing message");
    app.client().delete_message(channel, ts).await?;

    let user = envelope.user_id();
    if let Some(user) = user {
        if let Err(e) = app.client().post_ephemeral(channel, user, reason).await {
            warn!(channel, user, error = %e, "Failed to notify author");
        }
    }

    app.event_log()
        .record_event(log_entry("message", &envelope, Some(REMOVED_ACTION)))
        .await?;

    let audit_channel = app
        .invite_settings()
        .get_invite_settings()
        .await?
        .and_then(|settings| settings.audit_channel_id);
    if let Some(audit_channel) = audit_channel {
        let author = user.map_or_else(|| "unknown".to_string(), |u| format!("<@{u}>"));
        let note = format!("Removed a message from {author} in <#{channel}>: {reason}");
        if let Err(e) = app.client().post_message(&audit_channel, &note, None).await {
            warn!(channel = %audit_channel, error = %e, "Failed to post audit note");
        }
    }
    Ok(())
}

// =============================================================================
// /rules
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "/rules", disable_help_subcommand = true)]
struct RulesCommand {
    #[command(subcommand)]
    action: Option<RulesAction>,
}

#[derive(Subcommand, Debug)]
enum RulesAction {
    /// Show this help
    Help,
    /// Show the policy of this channel
    List,
    /// Turn one permission on or off
    Set { setting: Setting, state: Toggle },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Setting {
    TopLevel,
    Threads,
    Bots,
}

impl Setting {
    fn label(self) -> &'static str {
        match self {
            Self::TopLevel => "Top-level posts",
            Self::Threads => "Thread replies",
            Self::Bots => "Bot posts",
        }
    }

    fn update(self, allow: bool) -> ChannelPolicyUpdate {
        let mut update = ChannelPolicyUpdate::default();
        match self {
            Self::TopLevel => update.allow_top_level_posts = Some(allow),
            Self::Threads => update.allow_thread_replies = Some(allow),
            Self::Bots => update.allow_bots = Some(allow),
        }
        update
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Toggle {
    On,
    Off,
}

async fn rules_command(app: Arc<AppContext>, command: SlashCommand) -> CommandResult {
    let parsed = match parse_command::<RulesCommand>(&command) {
        Ok(parsed) => parsed,
        Err(err) if is_help_request(&err) => return ephemeral(HELP_TEXT),
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::InvalidSubcommand | ErrorKind::UnknownArgument
            ) =>
        {
            return ephemeral(format!("Unrecognized: {}", command.trimmed_text()));
        }
        Err(err) => return ephemeral(usage_text(&err)),
    };

    let action = match parsed.action {
        None | Some(RulesAction::Help) => return ephemeral(HELP_TEXT),
        Some(action) => action,
    };
    let Some(channel) = command.channel_id.as_deref() else {
        return ephemeral("Run this command from a channel.");
    };

    match action {
        RulesAction::Set { setting, state } => {
            let allow = matches!(state, Toggle::On);
            app.channel_policies()
                .upsert_policy(channel, setting.update(allow))
                .await?;
            info!(channel, setting = setting.label(), allow, "Updated channel policy");
            ephemeral(format!("{} {} in <#{channel}>", setting.label(), on_off(allow)))
        }
        _ => {
            let policy = app
                .channel_policies()
                .get_policy(channel)
                .await?
                .unwrap_or_else(|| ChannelPolicy::permissive(channel));
            ephemeral(format!(
                "Channel rules for <#{channel}>:\n- Top-level posts: {}\n- Thread replies: {}\n- Bot posts: {}",
                on_off(policy.allow_top_level_posts),
                on_off(policy.allow_thread_replies),
                on_off(policy.allow_bots),
            ))
        }
    }
}
