//! # Zebras Plugins
//!
//! Built-in feature modules. Each registers its handlers into the shared
//! [`Registry`](zebras_core::Registry) and never talks to another plugin.
//!
//! | plugin          | events                      | commands         | callbacks                       |
//! |-----------------|-----------------------------|------------------|---------------------------------|
//! | `audit`         | channel, member and message | -                | -                               |
//! | `channel_rules` | `message`                   | `/rules`         | -                               |
//! | `autoresponder` | `message`                   | `/auto`          | -                               |
//! | `invite`        | `team_join`                 | `/invite-helper` | -                               |
//! | `admin`         | `app_home_opened`           | -                | `open_settings`, `admin_settings` |
//! | `debug`         | -                           | `/debug`         | -                               |

pub mod admin;
pub mod audit;
pub mod autoresponder;
pub mod channel_rules;
pub mod debug;
pub mod invite;

use std::sync::Arc;

use zebras_core::{CommandResponse, CommandResult};
use zebras_framework::BoxedPlugin;

pub use admin::AdminPlugin;
pub use audit::AuditPlugin;
pub use autoresponder::AutoResponderPlugin;
pub use channel_rules::ChannelRulesPlugin;
pub use debug::DebugPlugin;
pub use invite::InvitePlugin;

/// Every built-in plugin in load order.
pub fn builtin_plugins() -> Vec<BoxedPlugin> {
    vec![
        Arc::new(AuditPlugin),
        Arc::new(ChannelRulesPlugin),
        Arc::new(AutoResponderPlugin),
        Arc::new(InvitePlugin),
        Arc::new(AdminPlugin),
        Arc::new(DebugPlugin),
    ]
}

/// `ON` / `OFF` as shown in replies.
pub(crate) fn on_off(value: bool) -> &'static str {
    if value { "ON" } else { "OFF" }
}

pub(crate) fn ephemeral(text: impl Into<String>) -> CommandResult {
    Ok(Some(CommandResponse::ephemeral(text)))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_plugins_have_unique_names() {
        let names: Vec<_> = builtin_plugins().iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec!["audit", "channel_rules", "autoresponder", "invite", "admin", "debug"]
        );
    }
}
