//! CLI module for chatwait
//!
//! This module provides:
//! - A console platform that reads stdin and prints outbound payloads
//! - The demo conversations (echo, form)
//! - Signal handling for graceful shutdown

pub mod console;
pub mod demo;
pub mod signals;

pub use console::{ConsolePlatform, OutputMode, pump_stdin};
pub use signals::shutdown_signal;
