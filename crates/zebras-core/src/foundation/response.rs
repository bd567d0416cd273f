//! Inbound command payloads and the responses returned to the platform.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::error::{DispatchError, DispatchResult};

/// A slash command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommand {
    /// Command name including the leading slash, e.g. `/auto`.
    pub command: String,
    /// Free text after the command name.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub trigger_id: Option<String>,
    #[serde(default)]
    pub response_url: Option<String>,
}

impl SlashCommand {
    /// Creates a command with the given name and text.
    pub fn new(command: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            text: text.into(),
            channel_id: None,
            user_id: None,
            trigger_id: None,
            response_url: None,
        }
    }

    /// Sets the invoking channel.
    pub fn in_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Sets the invoking user.
    pub fn by_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Extracts a command from a raw form-decoded payload.
    ///
    /// A payload without a string `command` is malformed.
    pub fn from_payload(payload: &Value) -> DispatchResult<Self> {
        let field = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_owned);

        if !payload.is_object() {
            return Err(DispatchError::InvalidPayload(
                "slash command payload must be a map".into(),
            ));
        }
        let command = field("command").ok_or(DispatchError::MissingField("command"))?;

        Ok(Self {
            command,
            text: field("text").unwrap_or_default(),
            channel_id: field("channel_id"),
            user_id: field("user_id"),
            trigger_id: field("trigger_id"),
            response_url: field("response_url"),
        })
    }

    /// The command text with surrounding whitespace removed.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }
}

/// Visibility of a command response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Visible only to the invoking user.
    #[default]
    Ephemeral,
    /// Visible to everyone in the channel.
    InChannel,
}

/// Reply to a slash command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub response_type: ResponseType,
    pub text: String,
}

impl CommandResponse {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
        }
    }

    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            text: text.into(),
        }
    }

    /// Serializes to the JSON body expected by the platform.
    pub fn to_json(&self) -> Value {
        json!({
            "response_type": self.response_type,
            "text": self.text,
        })
    }
}

/// Acknowledgement for an interactive callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionResponse {
    /// `{"ok": true}`
    Ack,
    /// `{"response_action": "clear"}`, closing every open view.
    ClearViews,
}

impl InteractionResponse {
    pub fn to_json(self) -> Value {
        match self {
            Self::Ack => json!({ "ok": true }),
            Self::ClearViews => json!({ "response_action": "clear" }),
        }
    }
}
