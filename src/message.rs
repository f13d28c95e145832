//! Inbound message and outbound payload types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifies a conversation (chat or thread). Sole key of the waiter registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identifies the author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(pub i64);

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shape of a message payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    #[default]
    Text,
    Photo,
    Audio,
    Video,
    Document,
    Sticker,
    Voice,
    VideoNote,
    Animation,
    Contact,
    Location,
    Venue,
    Poll,
    Game,
    Dice,
    /// Filter-only kind matching every payload
    Any,
}

impl ContentKind {
    /// All concrete kinds, `Any` excluded
    pub const CONCRETE: [ContentKind; 15] = [
        ContentKind::Text,
        ContentKind::Photo,
        ContentKind::Audio,
        ContentKind::Video,
        ContentKind::Document,
        ContentKind::Sticker,
        ContentKind::Voice,
        ContentKind::VideoNote,
        ContentKind::Animation,
        ContentKind::Contact,
        ContentKind::Location,
        ContentKind::Venue,
        ContentKind::Poll,
        ContentKind::Game,
        ContentKind::Dice,
    ];

    /// Whether a message of `kind` satisfies this filter
    pub fn accepts(self, kind: ContentKind) -> bool {
        self == ContentKind::Any || self == kind
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Photo => "photo",
            ContentKind::Audio => "audio",
            ContentKind::Video => "video",
            ContentKind::Document => "document",
            ContentKind::Sticker => "sticker",
            ContentKind::Voice => "voice",
            ContentKind::VideoNote => "video_note",
            ContentKind::Animation => "animation",
            ContentKind::Contact => "contact",
            ContentKind::Location => "location",
            ContentKind::Venue => "venue",
            ContentKind::Poll => "poll",
            ContentKind::Game => "game",
            ContentKind::Dice => "dice",
            ContentKind::Any => "any",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown content kind '{0}'")]
pub struct ParseContentKindError(pub String);

impl FromStr for ContentKind {
    type Err = ParseContentKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if normalized == "any" {
            return Ok(ContentKind::Any);
        }
        ContentKind::CONCRETE
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseContentKindError(s.to_string()))
    }
}

/// An inbound message, read-only for the core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Platform message id
    pub id: Option<i64>,

    /// Conversation the message belongs to
    pub session: Option<SessionId>,

    /// Author
    pub sender: Option<SenderId>,

    /// Payload shape
    #[serde(default)]
    pub kind: ContentKind,

    /// Text or caption
    #[serde(default)]
    pub text: String,

    /// When the platform received it
    pub date: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a text message in a session
    pub fn text(session: SessionId, text: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            kind: ContentKind::Text,
            text: text.into(),
            date: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Create a non-text message in a session
    pub fn of_kind(session: SessionId, kind: ContentKind) -> Self {
        Self {
            session: Some(session),
            kind,
            date: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn with_sender(mut self, sender: SenderId) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// True for the zero message returned on timeouts and unknown answers
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.session.is_none() && self.text.is_empty()
    }
}

/// Outbound content handed to the platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub text: String,

    /// Opaque markup built by a keyboard/layout builder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<serde_json::Value>,
}

impl Payload {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_markup: None,
        }
    }

    pub fn with_markup(mut self, markup: serde_json::Value) -> Self {
        self.reply_markup = Some(markup);
        self
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_accepts_everything() {
        for kind in ContentKind::CONCRETE {
            assert!(ContentKind::Any.accepts(kind));
        }
    }

    #[test]
    fn test_concrete_filter_accepts_only_itself() {
        assert!(ContentKind::Text.accepts(ContentKind::Text));
        assert!(!ContentKind::Text.accepts(ContentKind::Photo));
        assert!(!ContentKind::Photo.accepts(ContentKind::Any));
    }

    #[test]
    fn test_parse_content_kind() {
        assert_eq!("photo".parse::<ContentKind>(), Ok(ContentKind::Photo));
        assert_eq!("video-note".parse::<ContentKind>(), Ok(ContentKind::VideoNote));
        assert_eq!(" ANY ".parse::<ContentKind>(), Ok(ContentKind::Any));
        assert!("hologram".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_content_kind_serde_names() {
        let json = serde_json::to_string(&ContentKind::VideoNote).unwrap();
        assert_eq!(json, "\"video_note\"");
    }

    #[test]
    fn test_empty_message() {
        assert!(Message::default().is_empty());
        assert!(!Message::text(SessionId(1), "hi").is_empty());
    }

    #[test]
    fn test_payload_from_str() {
        let payload: Payload = "hello".into();
        assert_eq!(payload.text, "hello");
        assert!(payload.reply_markup.is_none());
    }
}
