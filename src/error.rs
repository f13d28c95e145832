//! Error types for listening and forms

use crate::message::{Message, SessionId};
use crate::platform::PlatformError;
use std::time::Duration;
use thiserror::Error;

/// Outcome of a `listen` call other than a plain delivery
#[derive(Debug, Clone, Error)]
pub enum ListenError {
    /// The context has no session to wait on; nothing was registered
    #[error("session can't be empty")]
    InvalidSession,

    /// No qualifying message arrived in time
    #[error("didn't receive a message within {timeout:?}")]
    TimedOut { timeout: Duration },

    /// The received text matched the cancel command
    #[error("listen cancelled by '{}'", message.text)]
    Cancelled { message: Box<Message> },

    /// Another waiter holds the session and the registry rejects replacements
    #[error("session {session} already has a pending listener")]
    SessionBusy { session: SessionId },

    /// The prompt could not be sent
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl ListenError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ListenError::TimedOut { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ListenError::Cancelled { .. })
    }

    /// Message accompanying this outcome: the cancel message, or the empty message
    pub fn into_message(self) -> Message {
        match self {
            ListenError::Cancelled { message } => *message,
            _ => Message::default(),
        }
    }
}

/// Errors ending a form run early
#[derive(Debug, Clone, Error)]
pub enum FormError {
    #[error("form has already been run")]
    AlreadyRun,

    #[error("step {step} failed to listen: {source}")]
    Listen {
        step: usize,
        #[source]
        source: ListenError,
    },

    #[error("step {step} failed to send: {source}")]
    Send {
        step: usize,
        #[source]
        source: PlatformError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_carries_empty_message() {
        let err = ListenError::TimedOut {
            timeout: Duration::from_secs(5),
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("5s"));
        assert!(err.into_message().is_empty());
    }

    #[test]
    fn test_cancel_carries_message() {
        let message = Message::text(SessionId(1), "/cancel");
        let err = ListenError::Cancelled {
            message: Box::new(message.clone()),
        };
        assert!(err.is_cancelled());
        assert!(err.to_string().contains("/cancel"));
        assert_eq!(err.into_message(), message);
    }

    #[test]
    fn test_form_error_display() {
        let err = FormError::Send {
            step: 2,
            source: PlatformError::Closed,
        };
        let display = err.to_string();
        assert!(display.contains("step 2"));
        assert!(display.contains("closed"));
    }
}
