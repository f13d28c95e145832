//! Form builder and run loop

use super::control::{FormHandle, Signal};
use super::executor::{Step, StepEnv, StepFunction, Validator, execute_step};
use super::state::{Answers, FormState};
use crate::error::FormError;
use crate::handler::Handler;
use crate::listener::Listener;
use crate::message::{ContentKind, Message, Payload};
use crate::platform::Context;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

/// An ordered, single-use conversational workflow
pub struct Form {
    listener: Listener,
    steps: Vec<Step>,
    cursor: usize,

    /// Applied to every step individually
    timeout: Duration,
    timeout_handler: Option<Handler>,

    /// Pause after each message step
    message_delay: Duration,

    answers: Answers,
    ran: bool,
}

impl Form {
    /// A zero `timeout` falls back to the listener's default timeout
    pub fn new(listener: Listener, timeout: Duration, message_delay: Duration) -> Self {
        let timeout = if timeout.is_zero() {
            listener.defaults().timeout
        } else {
            timeout
        };
        Self {
            listener,
            steps: Vec::new(),
            cursor: 0,
            timeout,
            timeout_handler: None,
            message_delay,
            answers: Answers::default(),
            ran: false,
        }
    }

    /// Wait for a message of `kind` and hand it to `validate`
    pub fn add_input(
        mut self,
        kind: ContentKind,
        unique_id: impl Into<String>,
        validate: Validator,
    ) -> Self {
        self.steps.push(Step::Input {
            kind,
            unique_id: unique_id.into(),
            validate,
        });
        self
    }

    pub fn add_message(mut self, payload: impl Into<Payload>) -> Self {
        self.steps.push(Step::Message(payload.into()));
        self
    }

    pub fn add_wait(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Wait(duration));
        self
    }

    pub fn add_function(mut self, function: StepFunction) -> Self {
        self.steps.push(Step::Function(function));
        self
    }

    /// Called when an input step receives nothing in time
    pub fn with_timeout_handler(mut self, handler: Handler) -> Self {
        self.timeout_handler = Some(handler);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Answer recorded for `unique_id`, or the empty message
    pub fn answer(&self, unique_id: &str) -> Message {
        self.answers.get(unique_id)
    }

    pub fn answers(&self) -> HashMap<String, Message> {
        self.answers.snapshot()
    }

    /// Drive the form until it completes, stops or times out
    ///
    /// A form runs once; running it again fails with `FormError::AlreadyRun`.
    pub async fn run(&mut self, ctx: &Context) -> Result<FormState, FormError> {
        if self.ran {
            return Err(FormError::AlreadyRun);
        }
        self.ran = true;

        let (signal_tx, mut signals) = mpsc::channel(1);
        let handle = FormHandle::new(signal_tx, self.answers.clone());

        tracing::debug!(
            steps = self.steps.len(),
            session = ?ctx.session(),
            "Running form"
        );

        let state = loop {
            if self.cursor >= self.steps.len() {
                break FormState::Completed;
            }

            // Leftovers from a previous step lost their race
            while signals.try_recv().is_ok() {}

            let step = &self.steps[self.cursor];
            tracing::debug!(step = self.cursor, kind = step.name(), "Executing step");

            let env = StepEnv {
                listener: &self.listener,
                handle: &handle,
                answers: &self.answers,
                timeout: self.timeout,
                message_delay: self.message_delay,
                timeout_handler: self.timeout_handler.as_ref(),
            };
            execute_step(step, self.cursor, &env, ctx).await?;

            match tokio::time::timeout(self.timeout, signals.recv()).await {
                Ok(Some(signal)) => {
                    tracing::debug!(step = self.cursor, ?signal, "Observed signal");
                    match signal {
                        Signal::Advance => self.cursor += 1,
                        Signal::Repeat => {}
                        Signal::SkipTo(index) => self.cursor = index,
                        Signal::Stop => break FormState::Stopped { step: self.cursor },
                    }
                }
                // The form keeps a sender through `handle`, so the inbox never closes
                Ok(None) | Err(_) => break FormState::TimedOut { step: self.cursor },
            }
        };

        tracing::info!(?state, answers = self.answers.len(), "Form finished");
        Ok(state)
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("steps", &self.steps)
            .field("cursor", &self.cursor)
            .field("timeout", &self.timeout)
            .field("message_delay", &self.message_delay)
            .field("ran", &self.ran)
            .finish()
    }
}
