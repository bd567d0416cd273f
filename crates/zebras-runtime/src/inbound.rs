//! Inbound units of work and socket frame decoding.
//!
//! A transport (socket stream, webhook server, stdin demo) turns whatever it
//! receives into an [`Inbound`] and hands it to the runtime, either directly
//! through [`ZebrasRuntime::handle`](crate::ZebrasRuntime::handle) or queued as
//! a [`Delivery`] for [`ZebrasRuntime::serve`](crate::ZebrasRuntime::serve).

use serde_json::Value;
use tokio::sync::oneshot;
use zebras_core::Envelope;

use crate::error::{RuntimeError, RuntimeResult};

/// One unit of inbound work.
#[derive(Debug, Clone)]
pub enum Inbound {
    /// An Events API envelope, including `url_verification` handshakes.
    Event(Envelope),
    /// A slash command payload.
    SlashCommand(Value),
    /// An interactive payload (`block_actions`, `view_submission`, ...).
    Interaction(Value),
}

impl Inbound {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Event(_) => "event",
            Self::SlashCommand(_) => "slash_command",
            Self::Interaction(_) => "interaction",
        }
    }

    /// Decodes a socket-mode frame of the form `{"type": ..., "payload": ...}`.
    ///
    /// Control frames (`hello`, `disconnect`) carry no work and decode to
    /// `None`.
    pub fn from_socket_frame(mut frame: Value) -> RuntimeResult<Option<Self>> {
        let frame_type = frame
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| RuntimeError::MalformedFrame("missing 'type'".into()))?
            .to_owned();

        if matches!(frame_type.as_str(), "hello" | "disconnect") {
            return Ok(None);
        }

        let payload = match frame.get_mut("payload").map(Value::take) {
            Some(payload @ Value::Object(_)) => payload,
            _ => {
                return Err(RuntimeError::MalformedFrame(format!(
                    "'{frame_type}' frame without an object payload"
                )));
            }
        };

        match frame_type.as_str() {
            "events_api" => Ok(Some(Self::Event(Envelope::new(payload)))),
            "slash_commands" => Ok(Some(Self::SlashCommand(payload))),
            "interactive" => Ok(Some(Self::Interaction(payload))),
            _ => Err(RuntimeError::UnsupportedFrame(frame_type)),
        }
    }
}

impl From<Envelope> for Inbound {
    fn from(envelope: Envelope) -> Self {
        Self::Event(envelope)
    }
}

/// An inbound unit queued for [`serve`](crate::ZebrasRuntime::serve), with an
/// optional channel for the reply body.
#[derive(Debug)]
pub struct Delivery {
    pub inbound: Inbound,
    pub reply: Option<oneshot::Sender<Value>>,
}

impl Delivery {
    /// A delivery whose reply is discarded.
    pub fn new(inbound: Inbound) -> Self {
        Self {
            inbound,
            reply: None,
        }
    }

    /// A delivery plus the receiver its reply will arrive on.
    pub fn with_reply(inbound: Inbound) -> (Self, oneshot::Receiver<Value>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                inbound,
                reply: Some(tx),
            },
            rx,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_frames() {
        let event = Inbound::from_socket_frame(json!({
            "envelope_id": "e1",
            "type": "events_api",
            "payload": { "type": "event_callback", "event": { "type": "message" } }
        }))
        .unwrap();
        match event {
            Some(Inbound::Event(envelope)) => assert_eq!(envelope.event_type(), Some("message")),
            other => panic!("unexpected: {other:?}"),
        }

        let command = Inbound::from_socket_frame(json!({
            "type": "slash_commands",
            "payload": { "command": "/debug" }
        }))
        .unwrap();
        assert_eq!(command.map(|i| i.kind()), Some("slash_command"));

        let interaction = Inbound::from_socket_frame(json!({
            "type": "interactive",
            "payload": { "type": "block_actions" }
        }))
        .unwrap();
        assert_eq!(interaction.map(|i| i.kind()), Some("interaction"));
    }

    #[test]
    fn test_control_frames_carry_no_work() {
        assert!(Inbound::from_socket_frame(json!({ "type": "hello" })).unwrap().is_none());
        assert!(
            Inbound::from_socket_frame(json!({ "type": "disconnect", "reason": "refresh" }))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_bad_frames() {
        assert!(matches!(
            Inbound::from_socket_frame(json!({ "payload": {} })),
            Err(RuntimeError::MalformedFrame(_))
        ));
        assert!(matches!(
            Inbound::from_socket_frame(json!({ "type": "events_api", "payload": "nope" })),
            Err(RuntimeError::MalformedFrame(_))
        ));
        assert!(matches!(
            Inbound::from_socket_frame(json!({ "type": "presence", "payload": {} })),
            Err(RuntimeError::UnsupportedFrame(kind)) if kind == "presence"
        ));
    }

    #[tokio::test]
    async fn test_delivery_reply_channel() {
        let (delivery, rx) = Delivery::with_reply(Inbound::Interaction(json!({})));
        let tx = delivery.reply.unwrap();
        tx.send(json!({ "ok": true })).unwrap();
        assert_eq!(rx.await.unwrap(), json!({ "ok": true }));
    }
}
