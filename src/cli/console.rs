//! Console stand-in for a messaging platform
//!
//! Outbound payloads go to stdout, stdin lines become inbound messages.

use async_trait::async_trait;
use chat_wait::{
    ContentKind, Context, Handler, Message, Payload, Platform, PlatformError, SenderId,
    SentMessage, SessionId,
};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};

/// How outbound payloads are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Console,
    Json,
}

#[derive(Serialize)]
struct OutboundEvent<'a> {
    id: i64,
    session: SessionId,
    #[serde(flatten)]
    payload: &'a Payload,
}

pub struct ConsolePlatform {
    mode: OutputMode,
    next_id: AtomicI64,
}

impl ConsolePlatform {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            next_id: AtomicI64::new(1),
        }
    }

    fn render(&self, id: i64, session: SessionId, payload: &Payload) -> Result<String, PlatformError> {
        match self.mode {
            OutputMode::Console => {
                let mut line = format!("[bot -> {}] {}", session, payload.text);
                if let Some(markup) = &payload.reply_markup {
                    line.push_str(&format!("\n  keyboard: {}", markup));
                }
                Ok(line)
            }
            OutputMode::Json => serde_json::to_string(&OutboundEvent {
                id,
                session,
                payload,
            })
            .map_err(|e| PlatformError::rejected(e.to_string())),
        }
    }
}

#[async_trait]
impl Platform for ConsolePlatform {
    async fn send_message(
        &self,
        session: SessionId,
        payload: &Payload,
    ) -> Result<SentMessage, PlatformError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = self.render(id, session, payload)?;
        write_line(&line).map_err(|_| PlatformError::Closed)?;

        Ok(SentMessage { id, session })
    }

    fn name(&self) -> &str {
        "console"
    }
}

fn write_line(line: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()
}

/// Turn a typed line into an inbound message
///
/// `/photo sunset` yields a photo captioned "sunset"; any other line is text.
pub fn parse_line(session: SessionId, sender: SenderId, id: i64, line: &str) -> Message {
    let trimmed = line.trim();

    if let Some(rest) = trimmed.strip_prefix('/') {
        let (head, caption) = rest.split_once(' ').unwrap_or((rest, ""));
        if let Ok(kind) = head.parse::<ContentKind>() {
            if !matches!(kind, ContentKind::Text | ContentKind::Any) {
                return Message::of_kind(session, kind)
                    .with_text(caption.trim())
                    .with_sender(sender)
                    .with_id(id);
            }
        }
    }

    Message::text(session, trimmed)
        .with_sender(sender)
        .with_id(id)
}

/// Feed stdin into `pipeline`, one task per line, until EOF
pub async fn pump_stdin(
    platform: Arc<dyn Platform>,
    pipeline: Handler,
    session: SessionId,
    sender: SenderId,
) -> io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut id = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        id += 1;

        let message = parse_line(session, sender, id, &line);
        tracing::debug!(%session, kind = %message.kind, "Inbound message");

        let ctx = Context::from_message(platform.clone(), message);
        tokio::spawn(pipeline(ctx));
    }

    tracing::debug!("stdin closed");
    Ok(())
}
