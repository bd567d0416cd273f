//! Stdin Bot Demo
//!
//! Runs the zebras runtime with every built-in plugin against socket-mode
//! frames read from stdin, one JSON object per line. Outbound chat calls are
//! logged by `LoggingChatClient`; each frame's reply is printed to stdout.
//! Logs go to stderr unless the configuration says otherwise.
//!
//! # Usage
//!
//! ```bash
//! cat <<'EOF' | cargo run --package stdin-bot -- --profile development
//! {"envelope_id":"1","type":"slash_commands","payload":{"command":"/rules","text":"set top-level off","channel_id":"C1","user_id":"U1"}}
//! {"envelope_id":"2","type":"events_api","payload":{"type":"event_callback","event":{"type":"message","channel":"C1","user":"U2","text":"hi","ts":"1.000001"}}}
//! {"envelope_id":"3","type":"slash_commands","payload":{"command":"/debug","text":"","channel_id":"C1","user_id":"U1"}}
//! EOF
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use zebras::prelude::*;
use zebras::runtime::config::{LogOutput, LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "stdin-bot", about = "Feed socket-mode frames from stdin into zebras")]
struct Args {
    /// Configuration file (defaults to zebras.toml / config.toml lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. development or production
    #[arg(short, long)]
    profile: Option<String>,
}

/// Reads frames until EOF, forwarding each and printing its reply in order.
async fn read_frames(tx: mpsc::Sender<Delivery>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let frame: Value = match serde_json::from_str(line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Skipping line that is not JSON");
                continue;
            }
        };
        let envelope_id = frame.get("envelope_id").cloned().unwrap_or(Value::Null);

        let inbound = match Inbound::from_socket_frame(frame) {
            Ok(Some(inbound)) => inbound,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "Skipping frame");
                continue;
            }
        };

        let (delivery, reply) = Delivery::with_reply(inbound);
        if tx.send(delivery).await.is_err() {
            break;
        }
        if let Ok(payload) = reply.await {
            println!("{}", json!({ "envelope_id": envelope_id, "payload": payload }));
        }
    }

    info!("Reached end of input");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Base layer only: files and env still override it
    let base = ZebrasConfig {
        logging: LoggingConfig {
            output: LogOutput::Stderr,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut builder = ZebrasRuntime::builder().merge(base);
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder.build()?;

    runtime.register_plugins(builtin_plugins());

    let (tx, rx) = mpsc::channel(64);
    let reader = tokio::spawn(read_frames(tx));

    runtime.run(rx).await?;

    if reader.is_finished() {
        reader.await??;
    } else {
        reader.abort();
    }

    Ok(())
}
