//! Boundary with the messaging platform client

use crate::message::{Message, Payload, SenderId, SessionId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by the platform when sending
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("message rejected: {message}")]
    Rejected { message: String },

    #[error("no recipient: context has no session")]
    NoRecipient,

    #[error("platform connection closed")]
    Closed,
}

impl PlatformError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Handle to a message the platform accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub id: i64,
    pub session: SessionId,
}

/// Outbound side of a messaging platform
#[async_trait]
pub trait Platform: Send + Sync {
    /// Send a payload to a conversation
    async fn send_message(
        &self,
        session: SessionId,
        payload: &Payload,
    ) -> Result<SentMessage, PlatformError>;

    /// Platform name, used in logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<P: Platform + ?Sized> Platform for Arc<P> {
    async fn send_message(
        &self,
        session: SessionId,
        payload: &Payload,
    ) -> Result<SentMessage, PlatformError> {
        (**self).send_message(session, payload).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Per-update context handed to handlers and form callbacks
#[derive(Clone)]
pub struct Context {
    platform: Arc<dyn Platform>,
    session: Option<SessionId>,
    sender: Option<SenderId>,
    message: Option<Message>,
}

impl Context {
    /// Context for an inbound message; session and sender come from the message
    pub fn from_message(platform: Arc<dyn Platform>, message: Message) -> Self {
        Self {
            platform,
            session: message.session,
            sender: message.sender,
            message: Some(message),
        }
    }

    /// Context bound to a session without an inbound message
    pub fn for_session(platform: Arc<dyn Platform>, session: SessionId) -> Self {
        Self {
            platform,
            session: Some(session),
            sender: None,
            message: None,
        }
    }

    /// Context with no session at all (service updates, inline queries...)
    pub fn detached(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            session: None,
            sender: None,
            message: None,
        }
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn sender(&self) -> Option<SenderId> {
        self.sender
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    /// Send to this context's session. Errors are returned as-is, never retried.
    pub async fn send(&self, payload: impl Into<Payload>) -> Result<SentMessage, PlatformError> {
        let session = self.session.ok_or(PlatformError::NoRecipient)?;
        let payload = payload.into();
        self.platform.send_message(session, &payload).await
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("platform", &self.platform.name())
            .field("session", &self.session)
            .field("sender", &self.sender)
            .field("message", &self.message)
            .finish()
    }
}
