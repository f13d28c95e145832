//! Configuration types and loading for chatwait

mod loader;
mod sections;

pub use loader::ChatWaitConfig;
pub use sections::{DispatchConfig, FormConfig, ListenConfig, LoggingConfig};
