//! Step definitions and single-step execution

use super::control::FormHandle;
use super::state::Answers;
use crate::error::{FormError, ListenError};
use crate::handler::{BoxFuture, Handler};
use crate::listener::{ListenOptions, Listener};
use crate::message::{ContentKind, Message, Payload};
use crate::platform::Context;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Decides the next signal from an input step's answer
pub type Validator = Arc<dyn Fn(FormHandle, Context, Message) -> BoxFuture<()> + Send + Sync>;

/// Side-effecting callback of a function step
pub type StepFunction = Arc<dyn Fn(FormHandle, Context) -> BoxFuture<()> + Send + Sync>;

/// Wrap an async closure as a [`Validator`]
pub fn validator<F, Fut>(f: F) -> Validator
where
    F: Fn(FormHandle, Context, Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |form: FormHandle, ctx: Context, answer: Message| -> BoxFuture<()> {
        Box::pin(f(form, ctx, answer))
    })
}

/// Wrap an async closure as a [`StepFunction`]
pub fn step_fn<F, Fut>(f: F) -> StepFunction
where
    F: Fn(FormHandle, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |form: FormHandle, ctx: Context| -> BoxFuture<()> { Box::pin(f(form, ctx)) })
}

/// Validator accepting any answer, including the empty one after a timeout
pub fn accept_any() -> Validator {
    validator(|form, _ctx, _answer| async move { form.next() })
}

/// One entry of a form
#[derive(Clone)]
pub enum Step {
    /// Wait for a message of `kind`, record it under `unique_id`, then validate
    Input {
        kind: ContentKind,
        unique_id: String,
        validate: Validator,
    },

    /// Send a payload
    Message(Payload),

    /// Pause
    Wait(Duration),

    /// Run a callback
    Function(StepFunction),
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Input { .. } => "input",
            Step::Message(_) => "message",
            Step::Wait(_) => "wait",
            Step::Function(_) => "function",
        }
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Input {
                kind, unique_id, ..
            } => f
                .debug_struct("Input")
                .field("kind", kind)
                .field("unique_id", unique_id)
                .finish(),
            Step::Message(payload) => f.debug_tuple("Message").field(payload).finish(),
            Step::Wait(duration) => f.debug_tuple("Wait").field(duration).finish(),
            Step::Function(_) => f.write_str("Function"),
        }
    }
}

/// Everything a step needs from its form
pub(crate) struct StepEnv<'a> {
    pub listener: &'a Listener,
    pub handle: &'a FormHandle,
    pub answers: &'a Answers,
    pub timeout: Duration,
    pub message_delay: Duration,
    pub timeout_handler: Option<&'a Handler>,
}

/// Execute `step` at `index`
///
/// Message, wait and function steps raise `Advance` themselves; input steps
/// leave the signal to their validator.
pub(crate) async fn execute_step(
    step: &Step,
    index: usize,
    env: &StepEnv<'_>,
    ctx: &Context,
) -> Result<(), FormError> {
    match step {
        Step::Input {
            kind,
            unique_id,
            validate,
        } => {
            let opts = ListenOptions::new().timeout(env.timeout).filter(*kind);
            let answer = match env.listener.listen_exact(ctx, opts).await {
                Ok(message) => message,
                Err(ListenError::TimedOut { .. }) => {
                    if let Some(on_timeout) = env.timeout_handler {
                        on_timeout(ctx.clone()).await;
                    }
                    Message::default()
                }
                Err(source) => return Err(FormError::Listen { step: index, source }),
            };

            validate(env.handle.clone(), ctx.clone(), answer.clone()).await;
            env.answers.record(unique_id, answer);
        }
        Step::Message(payload) => {
            ctx.send(payload.clone())
                .await
                .map_err(|source| FormError::Send { step: index, source })?;
            tokio::time::sleep(env.message_delay).await;
            env.handle.next();
        }
        Step::Wait(duration) => {
            tokio::time::sleep(*duration).await;
            env.handle.next();
        }
        Step::Function(function) => {
            function(env.handle.clone(), ctx.clone()).await;
            env.handle.next();
        }
    }

    Ok(())
}
