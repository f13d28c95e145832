//! Blocking "wait for the next message" on top of the registry

use crate::error::ListenError;
use crate::handler::Handler;
use crate::message::{ContentKind, Message, Payload};
use crate::platform::Context;
use crate::registry::WaiterRegistry;
use std::sync::Arc;
use std::time::Duration;

/// Timeout used when neither the call nor the defaults set one
pub const DEFAULT_LISTEN_TIMEOUT: Duration = Duration::from_secs(60);

/// Options for a single `listen` call
#[derive(Clone)]
pub struct ListenOptions {
    /// How long to wait per attempt. Zero or unset falls back to the defaults.
    pub timeout: Option<Duration>,

    /// Only messages of this kind satisfy the call
    pub filter: ContentKind,

    /// Text that cancels the wait
    pub cancel_command: Option<String>,

    /// Sent once the waiter is registered
    pub prompt: Option<Payload>,

    pub on_timeout: Option<Handler>,
    pub on_cancel: Option<Handler>,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            filter: ContentKind::Any,
            cancel_command: None,
            prompt: None,
            on_timeout: None,
            on_cancel: None,
        }
    }
}

impl ListenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn filter(mut self, kind: ContentKind) -> Self {
        self.filter = kind;
        self
    }

    pub fn cancel_command(mut self, command: impl Into<String>) -> Self {
        self.cancel_command = Some(command.into());
        self
    }

    pub fn prompt(mut self, prompt: impl Into<Payload>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn on_timeout(mut self, handler: Handler) -> Self {
        self.on_timeout = Some(handler);
        self
    }

    pub fn on_cancel(mut self, handler: Handler) -> Self {
        self.on_cancel = Some(handler);
        self
    }

    /// Fill every unset option from `defaults`
    fn or_defaults(mut self, defaults: &ListenDefaults) -> Self {
        if self.timeout.is_none_or(|t| t.is_zero()) {
            self.timeout = Some(defaults.timeout);
        }
        if self.cancel_command.is_none() {
            self.cancel_command = defaults.cancel_command.clone();
        }
        if self.on_timeout.is_none() {
            self.on_timeout = defaults.on_timeout.clone();
        }
        if self.on_cancel.is_none() {
            self.on_cancel = defaults.on_cancel.clone();
        }
        self
    }
}

impl std::fmt::Debug for ListenOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenOptions")
            .field("timeout", &self.timeout)
            .field("filter", &self.filter)
            .field("cancel_command", &self.cancel_command)
            .field("prompt", &self.prompt)
            .field("on_timeout", &self.on_timeout.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

/// Instance-wide fallbacks for [`ListenOptions`]
#[derive(Clone)]
pub struct ListenDefaults {
    pub timeout: Duration,
    pub cancel_command: Option<String>,
    pub on_timeout: Option<Handler>,
    pub on_cancel: Option<Handler>,
}

impl Default for ListenDefaults {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LISTEN_TIMEOUT,
            cancel_command: None,
            on_timeout: None,
            on_cancel: None,
        }
    }
}

/// Turns a registry rendezvous into a blocking call
#[derive(Clone)]
pub struct Listener {
    registry: Arc<WaiterRegistry>,
    defaults: Arc<ListenDefaults>,
}

impl Listener {
    /// A zero default timeout is replaced by [`DEFAULT_LISTEN_TIMEOUT`]
    pub fn new(registry: Arc<WaiterRegistry>, mut defaults: ListenDefaults) -> Self {
        if defaults.timeout.is_zero() {
            defaults.timeout = DEFAULT_LISTEN_TIMEOUT;
        }
        Self {
            registry,
            defaults: Arc::new(defaults),
        }
    }

    pub fn registry(&self) -> &Arc<WaiterRegistry> {
        &self.registry
    }

    pub fn defaults(&self) -> &ListenDefaults {
        &self.defaults
    }

    /// Wait for the next message of the context's session, applying defaults
    pub async fn listen(&self, ctx: &Context, opts: ListenOptions) -> Result<Message, ListenError> {
        let opts = opts.or_defaults(&self.defaults);
        self.listen_exact(ctx, opts).await
    }

    /// Wait using `opts` as given; only the timeout falls back to the default
    ///
    /// With a content filter, every mismatching message restarts the timeout
    /// window, so the total wait is unbounded while mismatching messages keep
    /// arriving. The waiter stays registered in between, so nothing sent right
    /// after a mismatch is lost.
    ///
    /// Dropping the returned future releases the waiter.
    pub async fn listen_exact(
        &self,
        ctx: &Context,
        opts: ListenOptions,
    ) -> Result<Message, ListenError> {
        let session = ctx.session().ok_or(ListenError::InvalidSession)?;
        let timeout = opts
            .timeout
            .filter(|t| !t.is_zero())
            .unwrap_or(self.defaults.timeout);

        let mut registration = self.registry.register(session)?;

        if let Some(prompt) = &opts.prompt {
            if let Err(e) = ctx.send(prompt.clone()).await {
                self.registry.release(&registration);
                return Err(e.into());
            }
        }

        let message = loop {
            match tokio::time::timeout(timeout, registration.recv()).await {
                Ok(Some(message)) => {
                    if opts.filter.accepts(message.kind) {
                        self.registry.release(&registration);
                        break message;
                    }

                    tracing::debug!(
                        %session,
                        expected = %opts.filter,
                        received = %message.kind,
                        "Content kind mismatch, re-arming"
                    );
                }
                // Unreachable while the registration holds its own sender
                Ok(None) => {
                    self.registry.release(&registration);
                    return Err(ListenError::TimedOut { timeout });
                }
                Err(_) => {
                    self.registry.release(&registration);
                    tracing::debug!(%session, ?timeout, "Listen timed out");
                    if let Some(on_timeout) = &opts.on_timeout {
                        on_timeout(ctx.clone()).await;
                    }
                    return Err(ListenError::TimedOut { timeout });
                }
            }
        };

        if opts
            .cancel_command
            .as_deref()
            .is_some_and(|command| message.text == command)
        {
            tracing::debug!(%session, "Listen cancelled");
            if let Some(on_cancel) = &opts.on_cancel {
                on_cancel(ctx.clone()).await;
            }
            return Err(ListenError::Cancelled {
                message: Box::new(message),
            });
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler;
    use crate::message::SessionId;
    use crate::platform::testing::RecordingPlatform;
    use crate::registry::BusySessionPolicy;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    fn counting_handler() -> (Handler, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let h = handler(move |_ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (h, calls)
    }

    async fn wait_for_waiter(registry: &WaiterRegistry, session: SessionId) {
        while !registry.is_waiting(session) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn setup() -> (Listener, Context, Arc<RecordingPlatform>) {
        let registry = Arc::new(WaiterRegistry::default());
        let listener = Listener::new(registry, ListenDefaults::default());
        let platform = RecordingPlatform::new();
        let ctx = Context::for_session(platform.clone(), SessionId(1));
        (listener, ctx, platform)
    }

    #[tokio::test]
    async fn test_invalid_session() {
        let (listener, _, platform) = setup();
        let ctx = Context::detached(platform);

        let err = listener.listen(&ctx, ListenOptions::new()).await.unwrap_err();
        assert!(matches!(err, ListenError::InvalidSession));
        assert!(listener.registry().is_empty());
    }

    #[tokio::test]
    async fn test_receives_delivered_message() {
        let (listener, ctx, _) = setup();
        let registry = listener.registry().clone();

        let delivery = tokio::spawn(async move {
            wait_for_waiter(&registry, SessionId(1)).await;
            registry
                .deliver(SessionId(1), Message::text(SessionId(1), "hello"))
                .await
        });

        let message = listener
            .listen(&ctx, ListenOptions::new().timeout(Duration::from_secs(2)))
            .await
            .unwrap();

        assert_eq!(message.text, "hello");
        assert!(delivery.await.unwrap());
        assert!(!listener.registry().is_waiting(SessionId(1)));
    }

    #[tokio::test]
    async fn test_timeout_invokes_handler_once() {
        let (listener, ctx, _) = setup();
        let (on_timeout, calls) = counting_handler();
        let timeout = Duration::from_millis(50);

        let started = Instant::now();
        let err = listener
            .listen(
                &ctx,
                ListenOptions::new().timeout(timeout).on_timeout(on_timeout),
            )
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(started.elapsed() >= timeout);
        assert!(started.elapsed() < timeout + Duration::from_millis(500));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(err.into_message().is_empty());
        assert!(!listener.registry().is_waiting(SessionId(1)));
    }

    #[tokio::test]
    async fn test_cancel_command() {
        let (listener, ctx, _) = setup();
        let (on_cancel, calls) = counting_handler();
        let registry = listener.registry().clone();

        tokio::spawn(async move {
            wait_for_waiter(&registry, SessionId(1)).await;
            registry
                .deliver(SessionId(1), Message::text(SessionId(1), "/cancel"))
                .await
        });

        let err = listener
            .listen(
                &ctx,
                ListenOptions::new()
                    .timeout(Duration::from_secs(2))
                    .cancel_command("/cancel")
                    .on_cancel(on_cancel),
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.into_message().text, "/cancel");
    }

    #[tokio::test]
    async fn test_defaults_fill_unset_options() {
        let registry = Arc::new(WaiterRegistry::default());
        let (on_timeout, calls) = counting_handler();
        let listener = Listener::new(
            registry,
            ListenDefaults {
                timeout: Duration::from_millis(20),
                on_timeout: Some(on_timeout),
                ..Default::default()
            },
        );
        let ctx = Context::for_session(RecordingPlatform::new(), SessionId(1));

        let err = listener
            .listen(&ctx, ListenOptions::new().timeout(Duration::ZERO))
            .await
            .unwrap_err();

        assert!(matches!(err, ListenError::TimedOut { timeout } if timeout == Duration::from_millis(20)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_listen_exact_skips_default_handlers() {
        let registry = Arc::new(WaiterRegistry::default());
        let (on_timeout, calls) = counting_handler();
        let listener = Listener::new(
            registry,
            ListenDefaults {
                on_timeout: Some(on_timeout),
                ..Default::default()
            },
        );
        let ctx = Context::for_session(RecordingPlatform::new(), SessionId(1));

        let err = listener
            .listen_exact(&ctx, ListenOptions::new().timeout(Duration::from_millis(10)))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prompt_is_sent() {
        let (listener, ctx, platform) = setup();

        let _ = listener
            .listen(
                &ctx,
                ListenOptions::new()
                    .timeout(Duration::from_millis(10))
                    .prompt("Send a number"),
            )
            .await;

        assert_eq!(platform.sent_texts(), vec!["Send a number".to_string()]);
    }

    #[tokio::test]
    async fn test_prompt_failure_releases_waiter() {
        let (listener, ctx, platform) = setup();
        platform.fail_sends(true);

        let err = listener
            .listen(&ctx, ListenOptions::new().prompt("Send a number"))
            .await
            .unwrap_err();

        assert!(matches!(err, ListenError::Platform(_)));
        assert!(listener.registry().is_empty());
    }

    #[tokio::test]
    async fn test_filter_keeps_waiter_across_mismatch() {
        let (listener, ctx, _) = setup();
        let registry = listener.registry().clone();

        let delivery = tokio::spawn(async move {
            wait_for_waiter(&registry, SessionId(1)).await;
            let sticker = registry
                .deliver(SessionId(1), Message::of_kind(SessionId(1), ContentKind::Sticker))
                .await;
            // Sent right behind the sticker, while the mismatch is handled
            let photo = registry
                .deliver(
                    SessionId(1),
                    Message::of_kind(SessionId(1), ContentKind::Photo).with_text("caption"),
                )
                .await;
            (sticker, photo)
        });

        let message = listener
            .listen(
                &ctx,
                ListenOptions::new()
                    .timeout(Duration::from_secs(2))
                    .filter(ContentKind::Photo),
            )
            .await
            .unwrap();

        assert_eq!(message.kind, ContentKind::Photo);
        assert_eq!(message.text, "caption");

        let (sticker, photo) = delivery.await.unwrap();
        assert!(sticker);
        assert!(photo);
        assert!(listener.registry().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_listen_releases_waiter() {
        let (listener, ctx, _) = setup();

        for id in 0..5 {
            let ctx = Context::for_session(ctx.platform().clone(), SessionId(id));
            let result = tokio::time::timeout(
                Duration::from_millis(5),
                listener.listen(&ctx, ListenOptions::new().timeout(Duration::from_secs(5))),
            )
            .await;
            assert!(result.is_err());
        }

        assert!(listener.registry().is_empty());
        assert!(!listener.registry().is_waiting(SessionId(0)));
    }

    #[tokio::test]
    async fn test_zero_default_timeout_falls_back() {
        let defaults = ListenDefaults {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        let listener = Listener::new(Arc::new(WaiterRegistry::default()), defaults);
        assert_eq!(listener.defaults().timeout, DEFAULT_LISTEN_TIMEOUT);

        let ctx = Context::for_session(RecordingPlatform::new(), SessionId(1));
        let result = tokio::time::timeout(
            Duration::from_millis(50),
            listener.listen(&ctx, ListenOptions::new()),
        )
        .await;
        assert!(result.is_err(), "listen must still be pending");
    }

    #[tokio::test]
    async fn test_filter_mismatch_restarts_timeout_window() {
        let (listener, ctx, _) = setup();
        let registry = listener.registry().clone();
        let timeout = Duration::from_millis(80);

        tokio::spawn(async move {
            wait_for_waiter(&registry, SessionId(1)).await;
            tokio::time::sleep(Duration::from_millis(60)).await;
            registry
                .deliver(SessionId(1), Message::of_kind(SessionId(1), ContentKind::Sticker))
                .await
        });

        let started = Instant::now();
        let err = listener
            .listen(
                &ctx,
                ListenOptions::new().timeout(timeout).filter(ContentKind::Text),
            )
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        // The mismatch at ~60ms opened a fresh 80ms window
        assert!(started.elapsed() >= Duration::from_millis(140));
    }

    #[tokio::test]
    async fn test_second_listener_orphans_first() {
        let registry = Arc::new(WaiterRegistry::new(BusySessionPolicy::Replace));
        let listener = Listener::new(registry.clone(), ListenDefaults::default());
        let ctx = Context::for_session(RecordingPlatform::new(), SessionId(1));

        let first = {
            let listener = listener.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                listener
                    .listen(&ctx, ListenOptions::new().timeout(Duration::from_millis(150)))
                    .await
            })
        };
        wait_for_waiter(&registry, SessionId(1)).await;
        let first_ticket = registry.current_ticket(SessionId(1));

        let second = {
            let listener = listener.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                listener
                    .listen(&ctx, ListenOptions::new().timeout(Duration::from_secs(2)))
                    .await
            })
        };
        while registry.current_ticket(SessionId(1)) == first_ticket {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(registry.len(), 1);

        assert!(
            registry
                .deliver(SessionId(1), Message::text(SessionId(1), "only once"))
                .await
        );

        let second = second.await.unwrap().unwrap();
        assert_eq!(second.text, "only once");

        let first = first.await.unwrap().unwrap_err();
        assert!(first.is_timeout());
    }

    #[tokio::test]
    async fn test_second_listener_rejected_under_reject_policy() {
        let registry = Arc::new(WaiterRegistry::new(BusySessionPolicy::Reject));
        let listener = Listener::new(registry.clone(), ListenDefaults::default());
        let ctx = Context::for_session(RecordingPlatform::new(), SessionId(1));

        let first = {
            let listener = listener.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                listener
                    .listen(&ctx, ListenOptions::new().timeout(Duration::from_secs(2)))
                    .await
            })
        };
        wait_for_waiter(&registry, SessionId(1)).await;

        let err = listener
            .listen(&ctx, ListenOptions::new().timeout(Duration::from_secs(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, ListenError::SessionBusy { .. }));

        registry
            .deliver(SessionId(1), Message::text(SessionId(1), "first"))
            .await;
        assert_eq!(first.await.unwrap().unwrap().text, "first");
    }
}
