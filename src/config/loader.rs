//! Configuration loading with multi-layer merge

use super::sections::{
    DispatchConfig, FormConfig, ListenConfig, LoggingConfig, default_form_timeout,
    default_listen_timeout, default_message_delay,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level chatwait configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatWaitConfig {
    #[serde(default)]
    pub listen: ListenConfig,

    #[serde(default)]
    pub form: FormConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ChatWaitConfig {
    /// Load configuration from the standard hierarchy
    ///
    /// Load order (later overrides earlier):
    /// 1. Built-in defaults
    /// 2. ~/.config/chatwait/config.toml
    /// 3. .chatwait/config.toml (project)
    pub fn load(project_dir: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                let user_config = Self::load_file(&user_config_path)
                    .with_context(|| format!("loading {}", user_config_path.display()))?;
                config.merge(user_config);
            }
        }

        let project_config_path = project_dir
            .map(|p| p.join(".chatwait/config.toml"))
            .unwrap_or_else(|| PathBuf::from(".chatwait/config.toml"));

        if project_config_path.exists() {
            let project_config = Self::load_file(&project_config_path)
                .with_context(|| format!("loading {}", project_config_path.display()))?;
            config.merge(project_config);
        }

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Get the user config path (~/.config/chatwait/config.toml)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chatwait/config.toml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        if other.listen.timeout != default_listen_timeout() {
            self.listen.timeout = other.listen.timeout;
        }
        if other.listen.cancel_command.is_some() {
            self.listen.cancel_command = other.listen.cancel_command;
        }

        if other.form.timeout != default_form_timeout() {
            self.form.timeout = other.form.timeout;
        }
        if other.form.message_delay_ms != default_message_delay() {
            self.form.message_delay_ms = other.form.message_delay_ms;
        }

        if other.dispatch.forward_delivered.is_some() {
            self.dispatch.forward_delivered = other.dispatch.forward_delivered;
        }
        if other.dispatch.busy_session != Default::default() {
            self.dispatch.busy_session = other.dispatch.busy_session;
        }

        if other.logging.file.is_some() {
            self.logging.file = other.logging.file;
        }
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serializing configuration")
    }
}
