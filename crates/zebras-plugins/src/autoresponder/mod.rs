//! Canned replies to matching phrases.
//!
//! Rules are stored per channel or globally and managed with `/auto`:
//!
//! ```text
//! /auto add phrase:"hello" reply:"Hi there" match:contains scope:here case:off
//! /auto list [here|global]
//! /auto enable <id> | disable <id> | delete <id>
//! ```

pub mod matching;

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::{debug, info};
use zebras_core::{
    CommandResult, Envelope, HandlerResult, Registry, SlashCommand, command_fn, handler_fn,
};
use zebras_framework::command::parse_command;
use zebras_framework::store::{AutoResponderRule, MatchType, NewAutoResponderRule};
use zebras_framework::{AppContext, Plugin, PluginLoadContext, PluginResult};

use self::matching::first_match;
use crate::ephemeral;

const USAGE: &str = "Usage:\n\
/auto add phrase:\"hello\" reply:\"Hi\" match:contains scope:here case:off\n\
/auto list [here|global]\n\
/auto enable <id> | disable <id> | delete <id>";

const MISSING_FIELDS: &str = "Provide phrase:\"..\" and reply:\"..\"";
const BAD_MATCH: &str = "match must be one of: contains|exact|regex";

/// `autoresponder` config section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutoResponderConfig {
    /// Maximum rules shown by `/auto list`.
    pub list_limit: usize,
}

impl Default for AutoResponderConfig {
    fn default() -> Self {
        Self { list_limit: 50 }
    }
}

/// Replies in thread to messages matching a stored rule.
pub struct AutoResponderPlugin;

impl Plugin for AutoResponderPlugin {
    fn name(&self) -> &'static str {
        "autoresponder"
    }

    fn description(&self) -> &'static str {
        "Replies to messages matching configured phrases"
    }

    fn register(&self, registry: &Registry, ctx: &PluginLoadContext) -> PluginResult<()> {
        let config: AutoResponderConfig = ctx.get_config()?;

        let app = ctx.app();
        registry.on_event(
            "message",
            handler_fn("autoresponder.respond", move |envelope| {
                respond(Arc::clone(&app), envelope)
            }),
        );

        let app = ctx.app();
        let limit = config.list_limit;
        registry.slash(
            "/auto",
            command_fn("autoresponder.command", move |command| {
                auto_command(Arc::clone(&app), limit, command)
            }),
        );
        Ok(())
    }
}

async fn respond(app: Arc<AppContext>, envelope: Arc<Envelope>) -> HandlerResult {
    if envelope.subtype().is_some() || envelope.bot_id().is_some() {
        return Ok(());
    }
    let text = envelope.text().unwrap_or_default();
    let Some(channel) = envelope.channel_id() else {
        return Ok(());
    };
    if text.is_empty() {
        return Ok(());
    }

    let rules = app.auto_responders().enabled_rules_for(channel).await?;
    if let Some(rule) = first_match(&rules, text) {
        debug!(rule = rule.id, channel, "Auto-responding");
        app.client()
            .post_message(channel, &rule.response_text, envelope.ts())
            .await?;
    }
    Ok(())
}

// =============================================================================
// /auto
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "/auto", disable_help_subcommand = true)]
struct AutoCommand {
    #[command(subcommand)]
    action: Option<AutoAction>,
}

#[derive(Subcommand, Debug)]
enum AutoAction {
    /// Add a rule from `key:value` options
    Add {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        options: Vec<String>,
    },
    /// List rules for this channel or the global ones
    List { scope: Option<Scope> },
    Enable { id: u64 },
    Disable { id: u64 },
    Delete { id: u64 },
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Scope {
    #[default]
    Here,
    Global,
}

/// Options of `/auto add`.
#[derive(Debug, Default, PartialEq, Eq)]
struct AddOptions {
    phrase: Option<String>,
    reply: Option<String>,
    match_type: Option<String>,
    case: Option<String>,
    scope: Option<String>,
}

impl AddOptions {
    /// Collects `key:value` tokens; the first occurrence of a key wins and
    /// unknown keys are ignored.
    fn parse(tokens: &[String]) -> Self {
        let mut options = Self::default();
        for token in tokens {
            let Some((key, value)) = token.split_once(':') else {
                continue;
            };
            let slot = match key {
                "phrase" | "p" => &mut options.phrase,
                "reply" | "r" => &mut options.reply,
                "match" => &mut options.match_type,
                "case" => &mut options.case,
                "scope" => &mut options.scope,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }
        options
    }
}

async fn auto_command(app: Arc<AppContext>, list_limit: usize, command: SlashCommand) -> CommandResult {
    let Ok(AutoCommand {
        action: Some(action),
    }) = parse_command::<AutoCommand>(&command)
    else {
        return ephemeral(USAGE);
    };
    let channel = command.channel_id.as_deref();
    let store = app.auto_responders();

    match action {
        AutoAction::Add { options } => add_rule(&app, channel, AddOptions::parse(&options)).await,
        AutoAction::List { scope } => {
            let target = match scope.unwrap_or_default() {
                Scope::Global => None,
                Scope::Here => channel,
            };
            let rules = store.list_rules(target, list_limit).await?;
            if rules.is_empty() {
                return ephemeral("No rules found.");
            }
            let lines: Vec<String> = rules.iter().map(describe).collect();
            ephemeral(lines.join("\n"))
        }
        AutoAction::Enable { id } => toggle(&app, id, true).await,
        AutoAction::Disable { id } => toggle(&app, id, false).await,
        AutoAction::Delete { id } => {
            if !store.remove_rule(id).await? {
                return ephemeral(format!("No rule #{id}"));
            }
            info!(rule = id, "Deleted auto-responder rule");
            ephemeral(format!("Deleted rule #{id}"))
        }
    }
}

async fn add_rule(app: &AppContext, channel: Option<&str>, options: AddOptions) -> CommandResult {
    let match_type = match options.match_type.as_deref() {
        None => MatchType::Contains,
        Some(raw) => match raw.parse::<MatchType>() {
            Ok(match_type) => match_type,
            Err(_) => return ephemeral(BAD_MATCH),
        },
    };
    let (Some(phrase), Some(reply)) = (options.phrase, options.reply) else {
        return ephemeral(MISSING_FIELDS);
    };
    if phrase.is_empty() || reply.is_empty() {
        return ephemeral(MISSING_FIELDS);
    }
    let case_sensitive = options
        .case
        .is_some_and(|case| matches!(case.to_lowercase().as_str(), "on" | "true" | "1"));
    let target = match options.scope.as_deref().map(str::to_lowercase).as_deref() {
        Some("global") => None,
        _ => channel.map(str::to_string),
    };

    let scope_label = target
        .as_deref()
        .map_or_else(|| "global".to_string(), |ch| format!("<#{ch}>"));
    let id = app
        .auto_responders()
        .add_rule(NewAutoResponderRule {
            phrase,
            response_text: reply,
            match_type,
            case_sensitive,
            channel_id: target,
        })
        .await?;

    info!(rule = id, %match_type, scope = %scope_label, "Added auto-responder rule");
    ephemeral(format!(
        "Added rule #{id} ({match_type}, case={}) in {scope_label}",
        if case_sensitive { "on" } else { "off" }
    ))
}

async fn toggle(app: &AppContext, id: u64, enabled: bool) -> CommandResult {
    if !app.auto_responders().set_rule_enabled(id, enabled).await? {
        return ephemeral(format!("No rule #{id}"));
    }
    let verb = if enabled { "Enabled" } else { "Disabled" };
    ephemeral(format!("{verb} rule #{id}"))
}

fn describe(rule: &AutoResponderRule) -> String {
    let scope = rule
        .channel_id
        .as_deref()
        .map_or_else(|| "GLOBAL".to_string(), |ch| format!("<#{ch}>"));
    format!(
        "#{} [{}] ({}) {} - {:?} -> {:?}",
        rule.id,
        if rule.enabled { "on" } else { "off" },
        rule.match_type,
        scope,
        rule.phrase,
        rule.response_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Loaded, load};
    use serde_json::{Value, json};
    use zebras_framework::store::AutoResponderStore;
    use zebras_framework::testing::{ClientCall, message_event};

    async fn run_in(loaded: &Loaded, channel: &str, text: &str) -> String {
        loaded
            .registry
            .run_command(SlashCommand::new("/auto", text).in_channel(channel).by_user("U1"))
            .await
            .text
    }

    async fn run(loaded: &Loaded, text: &str) -> String {
        run_in(loaded, "C1", text).await
    }

    #[test]
    fn test_add_options_parse() {
        let tokens: Vec<String> = ["p:good morning", "r:hi: there", "match:exact", "junk", "p:ignored"]
            .into_iter()
            .map(String::from)
            .collect();
        let options = AddOptions::parse(&tokens);
        assert_eq!(options.phrase.as_deref(), Some("good morning"));
        assert_eq!(options.reply.as_deref(), Some("hi: there"));
        assert_eq!(options.match_type.as_deref(), Some("exact"));
        assert_eq!(options.scope, None);
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let loaded = load(AutoResponderPlugin, Value::Null);

        assert_eq!(
            run(&loaded, r#"add phrase:"good morning" reply:"Morning!""#).await,
            "Added rule #1 (contains, case=off) in <#C1>"
        );
        assert_eq!(
            run(&loaded, r#"add p:ping r:pong match:EXACT case:on scope:global"#).await,
            "Added rule #2 (exact, case=on) in global"
        );

        let here = run(&loaded, "list").await;
        let lines: Vec<&str> = here.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("#2 [on] (exact) GLOBAL"));
        assert!(lines[1].starts_with("#1 [on] (contains) <#C1>"));

        let global = run(&loaded, "list global").await;
        assert_eq!(global.lines().count(), 1);
        assert_eq!(run_in(&loaded, "C2", "list").await.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_add_validation() {
        let loaded = load(AutoResponderPlugin, Value::Null);
        assert_eq!(run(&loaded, "add phrase:x reply:y match:fuzzy").await, BAD_MATCH);
        assert_eq!(run(&loaded, "add phrase:x").await, MISSING_FIELDS);
        assert_eq!(run(&loaded, "").await, USAGE);
        assert_eq!(run(&loaded, "frobnicate").await, USAGE);
        assert_eq!(run(&loaded, "list").await, "No rules found.");
    }

    #[tokio::test]
    async fn test_toggle_and_delete() {
        let loaded = load(AutoResponderPlugin, Value::Null);
        run(&loaded, "add p:hi r:hello").await;

        assert_eq!(run(&loaded, "disable 1").await, "Disabled rule #1");
        assert!(run(&loaded, "list").await.starts_with("#1 [off]"));
        assert_eq!(run(&loaded, "enable 1").await, "Enabled rule #1");
        assert_eq!(run(&loaded, "delete 1").await, "Deleted rule #1");
        assert_eq!(run(&loaded, "delete 1").await, "No rule #1");
        assert_eq!(run(&loaded, "enable 42").await, "No rule #42");
    }

    #[tokio::test]
    async fn test_add_keeps_regex_phrase_verbatim() {
        let loaded = load(AutoResponderPlugin, Value::Null);
        assert_eq!(
            run(&loaded, r#"add phrase:"\d+" reply:"num" match:regex"#).await,
            "Added rule #1 (regex, case=off) in <#C1>"
        );

        let rules = loaded.test.store.enabled_rules_for("C1").await.unwrap();
        assert_eq!(rules[0].phrase, r"\d+");

        loaded
            .router
            .dispatch(message_event("C1", "U2", "dddd", "1.0"))
            .await;
        assert!(loaded.test.client.calls().is_empty());

        loaded
            .router
            .dispatch(message_event("C1", "U2", "order 42", "2.0"))
            .await;
        assert_eq!(loaded.test.client.posted().len(), 1);
    }

    #[tokio::test]
    async fn test_add_unquoted_apostrophe() {
        let loaded = load(AutoResponderPlugin, Value::Null);
        assert_eq!(
            run(&loaded, r#"add phrase:what's reply:"ok""#).await,
            "Added rule #1 (contains, case=off) in <#C1>"
        );

        let rules = loaded.test.store.enabled_rules_for("C1").await.unwrap();
        assert_eq!(rules[0].phrase, "what's");
        assert_eq!(rules[0].response_text, "ok");
    }

    #[tokio::test]
    async fn test_list_limit_from_config() {
        let loaded = load(AutoResponderPlugin, json!({ "list_limit": 1 }));
        run(&loaded, "add p:a r:1").await;
        run(&loaded, "add p:b r:2").await;
        assert_eq!(run(&loaded, "list").await.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_replies_in_thread_once() {
        let loaded = load(AutoResponderPlugin, Value::Null);
        run(&loaded, "add p:hello r:first").await;
        run(&loaded, "add p:hello r:second scope:global").await;

        loaded
            .router
            .dispatch(message_event("C1", "U2", "Hello everyone", "5.0"))
            .await;

        assert_eq!(
            loaded.test.client.calls(),
            vec![ClientCall::PostMessage {
                channel: "C1".into(),
                text: "first".into(),
                thread_ts: Some("5.0".into()),
            }]
        );
    }

    #[tokio::test]
    async fn test_ignores_subtypes_bots_and_disabled_rules() {
        let loaded = load(AutoResponderPlugin, Value::Null);
        let id = loaded
            .test
            .store
            .add_rule(NewAutoResponderRule {
                phrase: "hello".into(),
                response_text: "hi".into(),
                match_type: MatchType::Contains,
                case_sensitive: false,
                channel_id: None,
            })
            .await
            .unwrap();

        let mut edited = message_event("C1", "U2", "hello", "1.0").into_raw();
        edited["event"]["subtype"] = json!("message_changed");
        loaded.router.dispatch(edited.into()).await;

        let mut from_bot = message_event("C1", "U2", "hello", "2.0").into_raw();
        from_bot["event"]["bot_id"] = json!("B1");
        loaded.router.dispatch(from_bot.into()).await;

        loaded.test.store.set_rule_enabled(id, false).await.unwrap();
        loaded
            .router
            .dispatch(message_event("C1", "U2", "hello", "3.0"))
            .await;

        assert!(loaded.test.client.calls().is_empty());
    }
}
