//! Boxed async callbacks

use crate::platform::Context;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Owned, sendable future
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Callback run on a context, e.g. a timeout or cancel reaction
pub type Handler = Arc<dyn Fn(Context) -> BoxFuture<()> + Send + Sync>;

/// Wrap an async closure as a [`Handler`]
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |ctx: Context| -> BoxFuture<()> { Box::pin(f(ctx)) })
}

/// Handler that does nothing
pub fn noop() -> Handler {
    handler(|_| async {})
}
