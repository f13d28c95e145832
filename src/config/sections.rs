//! Configuration sections

use crate::registry::BusySessionPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Defaults for `listen`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ListenConfig {
    /// Timeout in seconds
    #[serde(default = "default_listen_timeout")]
    pub timeout: u64,

    /// Text that cancels a pending listen
    pub cancel_command: Option<String>,
}

pub(crate) fn default_listen_timeout() -> u64 {
    60
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            timeout: default_listen_timeout(),
            cancel_command: None,
        }
    }
}

impl ListenConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Defaults for forms
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FormConfig {
    /// Per-step timeout in seconds
    #[serde(default = "default_form_timeout")]
    pub timeout: u64,

    /// Pause after each message step, in milliseconds
    #[serde(default = "default_message_delay")]
    pub message_delay_ms: u64,
}

pub(crate) fn default_form_timeout() -> u64 {
    60
}

pub(crate) fn default_message_delay() -> u64 {
    500
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            timeout: default_form_timeout(),
            message_delay_ms: default_message_delay(),
        }
    }
}

impl FormConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn message_delay(&self) -> Duration {
        Duration::from_millis(self.message_delay_ms)
    }
}

/// Dispatcher and registry behaviour
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Keep routing a message after handing it to a waiter; unset means yes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_delivered: Option<bool>,

    /// What a second listener on a busy session does
    #[serde(default)]
    pub busy_session: BusySessionPolicy,
}

impl DispatchConfig {
    pub fn forwards_delivered(&self) -> bool {
        self.forward_delivered.unwrap_or(true)
    }
}

/// Log output
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log file path; `~` and environment variables are expanded
    pub file: Option<String>,
}

impl LoggingConfig {
    /// Expanded log file path
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.as_deref().map(|raw| {
            shellexpand::full(raw)
                .map(|expanded| PathBuf::from(expanded.as_ref()))
                .unwrap_or_else(|_| PathBuf::from(raw))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_listen() {
        let config: ListenConfig = toml::from_str("").unwrap();
        assert_eq!(config.timeout, 60);
        assert!(config.cancel_command.is_none());
    }

    #[test]
    fn test_deserialize_form() {
        let toml = r#"
            timeout = 10
            message_delay_ms = 250
        "#;
        let config: FormConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.message_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_deserialize_dispatch() {
        let toml = r#"
            forward_delivered = false
            busy_session = "reject"
        "#;
        let config: DispatchConfig = toml::from_str(toml).unwrap();
        assert!(!config.forwards_delivered());
        assert_eq!(config.busy_session, BusySessionPolicy::Reject);
    }

    #[test]
    fn test_forward_delivered_defaults_on() {
        let config: DispatchConfig = toml::from_str("").unwrap();
        assert_eq!(config.forward_delivered, None);
        assert!(config.forwards_delivered());
    }

    #[test]
    fn test_reject_unknown_fields() {
        let result: Result<ListenConfig, _> = toml::from_str("timeout = 5\nretries = 3");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_path_expansion() {
        let config = LoggingConfig {
            file: Some("/var/log/chatwait.log".into()),
        };
        assert_eq!(config.file_path(), Some(PathBuf::from("/var/log/chatwait.log")));
        assert!(LoggingConfig::default().file_path().is_none());
    }
}
