//! Control signals raised by step callbacks

use super::state::Answers;
use crate::message::Message;
use tokio::sync::mpsc;

/// Directs the run loop's next move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Advance,
    Repeat,
    SkipTo(usize),
    Stop,
}

/// Handle given to validation and function callbacks
///
/// Signals are fire-and-forget into a single-slot inbox read only by the run
/// loop. A callback raises at most one signal per invocation; a signal that
/// finds the inbox occupied is dropped.
#[derive(Clone)]
pub struct FormHandle {
    signals: mpsc::Sender<Signal>,
    answers: Answers,
}

impl FormHandle {
    pub(crate) fn new(signals: mpsc::Sender<Signal>, answers: Answers) -> Self {
        Self { signals, answers }
    }

    /// Move on to the next step
    pub fn next(&self) {
        self.raise(Signal::Advance);
    }

    /// Run the current step again
    pub fn repeat(&self) {
        self.raise(Signal::Repeat);
    }

    /// End the form
    pub fn stop(&self) {
        self.raise(Signal::Stop);
    }

    /// Jump to step `index`; past the end completes the form
    pub fn skip(&self, index: usize) {
        self.raise(Signal::SkipTo(index));
    }

    /// Answer recorded so far for `unique_id`, empty if none
    pub fn answer(&self, unique_id: &str) -> Message {
        self.answers.get(unique_id)
    }

    pub(crate) fn raise(&self, signal: Signal) -> bool {
        match self.signals.try_send(signal) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(?signal, "Dropped control signal, inbox occupied");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_slot_inbox_drops_second_signal() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = FormHandle::new(tx, Answers::default());

        handle.skip(0);
        handle.next();

        assert_eq!(rx.try_recv().unwrap(), Signal::SkipTo(0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_handle_reads_answers() {
        let (tx, _rx) = mpsc::channel(1);
        let answers = Answers::default();
        answers.record("age", Message::default().with_text("42"));
        let handle = FormHandle::new(tx, answers);

        assert_eq!(handle.answer("age").text, "42");
        assert!(handle.answer("missing").is_empty());
    }
}
