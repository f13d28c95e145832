//! Entry point owning the registry shared by listeners, forms and the dispatcher

use crate::config::ChatWaitConfig;
use crate::dispatcher::Dispatcher;
use crate::error::ListenError;
use crate::form::Form;
use crate::handler::Handler;
use crate::listener::{ListenDefaults, ListenOptions, Listener};
use crate::message::Message;
use crate::platform::Context;
use crate::registry::{BusySessionPolicy, WaiterRegistry};
use std::sync::Arc;
use std::time::Duration;

/// Settings for a [`Bridge`]
#[derive(Clone)]
pub struct BridgeConfig {
    pub listen: ListenDefaults,
    pub form_timeout: Option<Duration>,
    pub message_delay: Option<Duration>,
    pub forward_delivered: bool,
    pub busy_session: BusySessionPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen: ListenDefaults::default(),
            form_timeout: None,
            message_delay: None,
            forward_delivered: true,
            busy_session: BusySessionPolicy::default(),
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ChatWaitConfig) -> Self {
        Self {
            listen: ListenDefaults {
                timeout: config.listen.timeout(),
                cancel_command: config.listen.cancel_command.clone(),
                ..Default::default()
            },
            form_timeout: Some(config.form.timeout()),
            message_delay: Some(config.form.message_delay()),
            forward_delivered: config.dispatch.forwards_delivered(),
            busy_session: config.dispatch.busy_session,
        }
    }

    pub fn with_timeout_handler(mut self, handler: Handler) -> Self {
        self.listen.on_timeout = Some(handler);
        self
    }

    pub fn with_cancel_handler(mut self, handler: Handler) -> Self {
        self.listen.on_cancel = Some(handler);
        self
    }

    pub fn with_cancel_command(mut self, command: impl Into<String>) -> Self {
        self.listen.cancel_command = Some(command.into());
        self
    }
}

/// Waits for conversation messages on behalf of request-driven handlers
///
/// Cheap to clone; every clone shares the same registry.
#[derive(Clone)]
pub struct Bridge {
    listener: Listener,
    dispatcher: Dispatcher,
    form_timeout: Duration,
    message_delay: Duration,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        let registry = Arc::new(WaiterRegistry::new(config.busy_session));
        let listener = Listener::new(registry.clone(), config.listen);
        // Zero means unset, as for listen timeouts
        let form_timeout = config
            .form_timeout
            .filter(|t| !t.is_zero())
            .unwrap_or(listener.defaults().timeout);
        let message_delay = config.message_delay.unwrap_or_default();

        Self {
            dispatcher: Dispatcher::new(registry, config.forward_delivered),
            listener,
            form_timeout,
            message_delay,
        }
    }

    pub fn from_config(config: &ChatWaitConfig) -> Self {
        Self::new(BridgeConfig::from_config(config))
    }

    pub fn registry(&self) -> &Arc<WaiterRegistry> {
        self.listener.registry()
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn form_timeout(&self) -> Duration {
        self.form_timeout
    }

    pub fn message_delay(&self) -> Duration {
        self.message_delay
    }

    /// Wait for the next message of the context's session
    pub async fn listen(&self, ctx: &Context, opts: ListenOptions) -> Result<Message, ListenError> {
        self.listener.listen(ctx, opts).await
    }

    /// New empty form using the configured timeout and delay
    pub fn form(&self) -> Form {
        self.form_with(self.form_timeout, self.message_delay)
    }

    pub fn form_with(&self, timeout: Duration, message_delay: Duration) -> Form {
        Form::new(self.listener.clone(), timeout, message_delay)
    }

    /// Dispatching wrapper around the platform's downstream handler
    pub fn middleware(&self, next: Handler) -> Handler {
        self.dispatcher.middleware(next)
    }
}
