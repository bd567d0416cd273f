//! Structured slash command parsing with clap.
//!
//! Command text is split shell-style and handed to a clap [`Parser`] whose
//! binary name is the slash command itself, so usage and errors read
//! naturally (`Usage: /rules set <SETTING> <STATE>`).
//!
//! # Example
//!
//! ```rust,ignore
//! use clap::{Parser, Subcommand};
//!
//! #[derive(Parser)]
//! #[command(name = "/rules")]
//! struct RulesCommand {
//!     #[command(subcommand)]
//!     action: Option<RulesAction>,
//! }
//!
//! match parse_command::<RulesCommand>(&cmd) {
//!     Ok(parsed) => run(parsed).await,
//!     Err(err) => Ok(Some(CommandResponse::ephemeral(usage_text(&err)))),
//! }
//! ```

mod split;

use clap::Parser;
use clap::error::ErrorKind;
use zebras_core::SlashCommand;

pub use split::shell_split;

/// Parses the text of `command` as `T`, using the command name as argv[0].
pub fn parse_command<T: Parser>(command: &SlashCommand) -> Result<T, clap::Error> {
    parse_text(&command.command, &command.text)
}

/// Parses `text` as `T`, using `name` as argv[0].
pub fn parse_text<T: Parser>(name: &str, text: &str) -> Result<T, clap::Error> {
    let args = std::iter::once(name.to_string()).chain(shell_split(text));
    T::try_parse_from(args)
}

/// Whether the parse "error" is a request for help rather than a mistake.
pub fn is_help_request(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

/// Renders a parse error as plain text suitable for an ephemeral reply.
pub fn usage_text(err: &clap::Error) -> String {
    err.render().to_string().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Subcommand;

    #[derive(Parser, Debug)]
    #[command(name = "/demo", disable_help_subcommand = true)]
    struct Demo {
        #[command(subcommand)]
        action: Option<Action>,
    }

    #[derive(Subcommand, Debug, PartialEq)]
    enum Action {
        Enable { id: u64 },
        Say { words: Vec<String> },
    }

    #[test]
    fn test_parse_subcommand() {
        let parsed: Demo = parse_text("/demo", "enable 7").unwrap();
        assert_eq!(parsed.action, Some(Action::Enable { id: 7 }));
    }

    #[test]
    fn test_parse_empty_text() {
        let parsed: Demo = parse_command(&SlashCommand::new("/demo", "  ")).unwrap();
        assert_eq!(parsed.action, None);
    }

    #[test]
    fn test_parse_quoted_args() {
        let parsed: Demo = parse_text("/demo", r#"say "hello there" friend"#).unwrap();
        assert_eq!(
            parsed.action,
            Some(Action::Say {
                words: vec!["hello there".into(), "friend".into()]
            })
        );
    }

    #[test]
    fn test_parse_error_renders_usage() {
        let err = parse_text::<Demo>("/demo", "enable seven").unwrap_err();
        assert!(!is_help_request(&err));
        assert!(usage_text(&err).contains("seven"));

        let help = parse_text::<Demo>("/demo", "--help").unwrap_err();
        assert!(is_help_request(&help));
    }
}
