//! Synchronous waits for chat conversations
//!
//! This crate lets a request-driven message handler block until the next
//! message of the same conversation arrives, and builds multi-step forms on
//! top of that:
//! - a per-session waiter registry fed by a dispatcher hook
//! - `listen`, with timeout, content filter and cancel command
//! - forms driven by explicit control signals
//!
//! # Example
//!
//! ```ignore
//! use chat_wait::{Bridge, BridgeConfig, ListenOptions};
//!
//! let bridge = Bridge::new(BridgeConfig::new().with_cancel_command("/cancel"));
//! platform.install(bridge.middleware(router));
//!
//! // inside a handler
//! ctx.send("Send me a text").await?;
//! let answer = bridge.listen(&ctx, ListenOptions::new()).await?;
//! ```

pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod form;
pub mod handler;
pub mod listener;
pub mod message;
pub mod platform;
pub mod registry;

pub use bridge::{Bridge, BridgeConfig};
pub use config::ChatWaitConfig;
pub use dispatcher::{Dispatcher, Routing};
pub use error::{FormError, ListenError};
pub use form::{Form, FormHandle, FormState};
pub use handler::{BoxFuture, Handler, handler};
pub use listener::{ListenDefaults, ListenOptions, Listener};
pub use message::{ContentKind, Message, Payload, SenderId, SessionId};
pub use platform::{Context, Platform, PlatformError, SentMessage};
pub use registry::{BusySessionPolicy, Registration, WaiterRegistry};
