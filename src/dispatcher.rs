//! Hook between the inbound message pipeline and pending listeners

use crate::handler::{Handler, handler};
use crate::message::Message;
use crate::platform::Context;
use crate::registry::WaiterRegistry;
use std::sync::Arc;

/// What the pipeline should do with a message after dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// A waiter took the message; `forwarded` tells whether routing continues
    Delivered { forwarded: bool },

    /// Nobody was waiting
    Forward,
}

impl Routing {
    pub fn should_forward(self) -> bool {
        match self {
            Routing::Delivered { forwarded } => forwarded,
            Routing::Forward => true,
        }
    }

    pub fn was_delivered(self) -> bool {
        matches!(self, Routing::Delivered { .. })
    }
}

/// Hands inbound messages to the waiter registered for their session
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<WaiterRegistry>,
    forward_delivered: bool,
}

impl Dispatcher {
    /// `forward_delivered` keeps normal routing going after a hand-off
    pub fn new(registry: Arc<WaiterRegistry>, forward_delivered: bool) -> Self {
        Self {
            registry,
            forward_delivered,
        }
    }

    pub fn forwards_delivered(&self) -> bool {
        self.forward_delivered
    }

    /// Offer `message` to the waiter of its session
    pub async fn dispatch(&self, message: &Message) -> Routing {
        let Some(session) = message.session else {
            return Routing::Forward;
        };

        if self.registry.deliver(session, message.clone()).await {
            Routing::Delivered {
                forwarded: self.forward_delivered,
            }
        } else {
            Routing::Forward
        }
    }

    /// Wrap `next` so every message is dispatched before it runs
    ///
    /// Install once in front of the platform's handler chain.
    pub fn middleware(&self, next: Handler) -> Handler {
        let dispatcher = self.clone();
        handler(move |ctx: Context| {
            let dispatcher = dispatcher.clone();
            let next = next.clone();
            async move {
                let routing = match ctx.message() {
                    Some(message) => dispatcher.dispatch(message).await,
                    None => Routing::Forward,
                };
                if routing.should_forward() {
                    next(ctx).await;
                }
            }
        })
    }
}
