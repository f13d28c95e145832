//! Demo conversations run against the console platform

use anyhow::Result;
use chat_wait::form::{FormHandle, step_fn, validator};
use chat_wait::{Bridge, ContentKind, Context, FormState, ListenError, ListenOptions, Message, Payload};
use serde_json::json;
use std::time::Duration;

/// Id of the number answer in the demo form
pub const NUMBER_ID: &str = "number";

/// Listen once and echo the answer back inside a keyboard
pub async fn echo(
    bridge: &Bridge,
    ctx: &Context,
    kind: ContentKind,
    timeout: Option<Duration>,
) -> Result<()> {
    let mut opts = ListenOptions::new()
        .filter(kind)
        .prompt(format!("Send a {} that will be put into a button...", kind));
    if let Some(timeout) = timeout {
        opts = opts.timeout(timeout);
    }

    let answer = match bridge.listen(ctx, opts).await {
        Ok(answer) => answer,
        // The bridge handlers already told the user
        Err(e @ (ListenError::TimedOut { .. } | ListenError::Cancelled { .. })) => {
            tracing::info!("Echo ended: {}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    ctx.send(echo_payload(&answer)).await?;
    Ok(())
}

fn echo_payload(answer: &Message) -> Payload {
    let label = if answer.text.is_empty() {
        answer.kind.to_string()
    } else {
        answer.text.clone()
    };

    Payload::new("Here is the requested message with a custom keyboard").with_markup(json!({
        "inline_keyboard": [
            [{ "text": "Retry", "callback_data": "echo" }],
            [{ "text": label, "callback_data": "noop" }],
        ]
    }))
}

/// Ask for a number; answering 5 restarts the whole form once it ends
pub async fn form(
    bridge: &Bridge,
    ctx: &Context,
    timeout: Option<Duration>,
    message_delay: Option<Duration>,
) -> Result<FormState> {
    let form = bridge.form_with(
        timeout.unwrap_or(bridge.form_timeout()),
        message_delay.unwrap_or(bridge.message_delay()),
    );

    let mut form = form
        .add_message("Please enter a number, type 5 if you wish to restart the form when it reaches its end.")
        .add_input(ContentKind::Text, NUMBER_ID, validator(verify_is_number))
        .add_message("Thanks!")
        .add_function(step_fn(log_answer))
        .add_message("I just called a function which logged something, look at your terminal.");

    let state = form.run(ctx).await?;

    match state {
        FormState::Completed => {
            ctx.send(format!("Your entry is {}", form.answer(NUMBER_ID).text))
                .await?;
        }
        FormState::Stopped { .. } => {
            ctx.send("Form stopped.").await?;
        }
        FormState::TimedOut { step } => {
            tracing::info!(step, "Form timed out");
        }
    }

    Ok(state)
}

async fn verify_is_number(form: FormHandle, ctx: Context, answer: Message) {
    if answer.is_empty() {
        form.stop();
        return;
    }

    match answer.text.trim().parse::<i64>() {
        Ok(number) => {
            let _ = ctx.send(number.to_string()).await;
            form.next();
        }
        Err(_) => {
            let _ = ctx.send("You didn't send a number, please retry.").await;
            form.repeat();
        }
    }
}

async fn log_answer(form: FormHandle, _ctx: Context) {
    tracing::info!("You could do anything here instead of just a log call, for example restart the whole form...");

    if form.answer(NUMBER_ID).text.trim() == "5" {
        tracing::info!("...and it looks like the form will be restarted");
        form.skip(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_wait::SessionId;

    #[test]
    fn test_echo_payload_uses_text() {
        let payload = echo_payload(&Message::text(SessionId(1), "hello"));
        let markup = payload.reply_markup.unwrap();
        assert_eq!(markup["inline_keyboard"][1][0]["text"], "hello");
    }

    #[test]
    fn test_echo_payload_falls_back_to_kind() {
        let payload = echo_payload(&Message::of_kind(SessionId(1), ContentKind::Photo));
        let markup = payload.reply_markup.unwrap();
        assert_eq!(markup["inline_keyboard"][1][0]["text"], "photo");
    }
}
