//! Form answer table and terminal states

use crate::message::Message;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// How a form run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// The cursor went past the last step
    Completed,

    /// A callback raised `Stop` while on `step`
    Stopped { step: usize },

    /// No signal arrived for `step` within the form timeout
    TimedOut { step: usize },
}

impl FormState {
    pub fn is_completed(self) -> bool {
        self == FormState::Completed
    }
}

/// Shared answer table, keyed by input step id
///
/// Append-only during a run; the last write for an id wins.
#[derive(Debug, Clone, Default)]
pub struct Answers {
    inner: Arc<Mutex<HashMap<String, Message>>>,
}

impl Answers {
    pub fn record(&self, unique_id: &str, message: Message) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(unique_id.to_string(), message);
    }

    /// Recorded message for `unique_id`, or the empty message
    pub fn get(&self, unique_id: &str) -> Message {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(unique_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains(&self, unique_id: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(unique_id)
    }

    pub fn snapshot(&self) -> HashMap<String, Message> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
