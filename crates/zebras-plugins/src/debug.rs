//! `/debug` health report.

use std::sync::Arc;

use zebras_core::{CommandResult, Registry, command_fn};
use zebras_framework::{AppContext, Plugin, PluginLoadContext, PluginResult};

use crate::ephemeral;

/// Reports chat client identity, datastore health and registered commands.
pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn name(&self) -> &'static str {
        "debug"
    }

    fn description(&self) -> &'static str {
        "Connectivity and registration diagnostics"
    }

    fn register(&self, registry: &Registry, ctx: &PluginLoadContext) -> PluginResult<()> {
        let app = ctx.app();
        let commands = registry.clone();
        registry.slash(
            "/debug",
            command_fn("debug.report", move |_command| {
                report(Arc::clone(&app), commands.clone())
            }),
        );
        Ok(())
    }
}

async fn report(app: Arc<AppContext>, registry: Registry) -> CommandResult {
    let mut lines = Vec::new();

    match app.client().auth_test().await {
        Ok(identity) => lines.push(format!(
            "slack: ok (team={}, bot_user={})",
            identity.team.as_deref().unwrap_or("unknown"),
            identity.user_id.as_deref().unwrap_or("unknown"),
        )),
        Err(e) => lines.push(format!("slack: ERROR ({e})")),
    }

    let store = app.datastore();
    match store.ping().await {
        Ok(()) => lines.push(format!("store: ok ({})", store.backend())),
        Err(e) => lines.push(format!("store: ERROR ({e})")),
    }

    lines.push(format!("commands: {}", registry.command_names().join(", ")));

    let body: Vec<String> = lines.iter().map(|line| format!("• {line}")).collect();
    ephemeral(format!("*ZEBRAS Debug*\n{}", body.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::load;
    use serde_json::Value;
    use zebras_core::{BoxError, CommandResponse, SlashCommand};

    #[tokio::test]
    async fn test_report_lists_health_and_commands() {
        let loaded = load(DebugPlugin, Value::Null);
        loaded.registry.slash(
            "/auto",
            command_fn("noop", |_cmd: SlashCommand| async {
                Ok::<Option<CommandResponse>, BoxError>(None)
            }),
        );

        let text = loaded
            .registry
            .run_command(SlashCommand::new("/debug", ""))
            .await
            .text;
        assert_eq!(
            text,
            "*ZEBRAS Debug*\n\
             • slack: ok (team=Test Team, bot_user=UBOT)\n\
             • store: ok (memory)\n\
             • commands: /auto, /debug"
        );
    }

    #[tokio::test]
    async fn test_report_shows_client_errors() {
        let loaded = load(DebugPlugin, Value::Null);
        loaded.test.client.fail_all();

        let text = loaded
            .registry
            .run_command(SlashCommand::new("/debug", ""))
            .await
            .text;
        assert!(text.contains("• slack: ERROR ("));
        assert!(text.contains("• store: ok (memory)"));
    }
}
