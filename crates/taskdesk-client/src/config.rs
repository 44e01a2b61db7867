/*
[INPUT]:  Optional YAML configuration file, TASKDESK_* environment variables
[OUTPUT]: Parsed client settings and the HTTP client built from them
[POS]:    Configuration layer - startup wiring for the CLI
[UPDATE]: When adding new configuration options
*/

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use taskdesk_adapter::{ClientConfig, Credentials, TaskdeskClient, DEFAULT_BASE_URL};

use crate::service::DEFAULT_DISMISS_LABEL;
use crate::waiter::DEFAULT_WAIT_TIMEOUT;

pub const ENV_PREFIX: &str = "TASKDESK";
pub const DEFAULT_NOTIFICATION_URL: &str = "ws://localhost:5001/hubs/tasks";

/// Top-level configuration for the task client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientSettings {
    /// Base URL of the task REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// WebSocket URL of the notification hub
    #[serde(default = "default_notification_url")]
    pub notification_url: String,
    /// Bearer token sent with every request
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub notices: NoticeSettings,
    #[serde(default)]
    pub waiter: WaiterSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NoticeSettings {
    /// Label of the action that dismisses a notice
    #[serde(default = "default_dismiss_label")]
    pub dismiss_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WaiterSettings {
    /// Seconds to wait for a hub notification; 0 waits forever
    #[serde(default = "default_wait_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            notification_url: default_notification_url(),
            bearer_token: None,
            http: HttpSettings::default(),
            notices: NoticeSettings::default(),
            waiter: WaiterSettings::default(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for NoticeSettings {
    fn default() -> Self {
        Self {
            dismiss_label: default_dismiss_label(),
        }
    }
}

impl Default for WaiterSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_wait_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_notification_url() -> String {
    DEFAULT_NOTIFICATION_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_dismiss_label() -> String {
    DEFAULT_DISMISS_LABEL.to_string()
}

fn default_wait_timeout_secs() -> u64 {
    DEFAULT_WAIT_TIMEOUT.as_secs()
}

impl ClientSettings {
    /// Layer the optional file under `TASKDESK_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `TASKDESK_HTTP__TIMEOUT_SECS`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("read configuration sources")?
            .try_deserialize()
            .context("parse configuration")
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.http.timeout_secs),
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
        }
    }

    pub fn waiter_timeout(&self) -> Option<Duration> {
        match self.waiter.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn build_client(&self) -> Result<TaskdeskClient> {
        let mut client =
            TaskdeskClient::with_config_and_base_url(self.client_config(), &self.api_base_url)
                .context("build task API client")?;
        if let Some(token) = self.bearer_token.as_deref().filter(|token| !token.is_empty()) {
            client.set_credentials(Credentials {
                bearer_token: token.to_string(),
            });
        }
        Ok(client)
    }

    /// Effective settings as YAML with the token masked.
    pub fn to_redacted_yaml(&self) -> Result<String> {
        let mut redacted = self.clone();
        if redacted.bearer_token.is_some() {
            redacted.bearer_token = Some("***".to_string());
        }
        serde_yaml::to_string(&redacted).context("render configuration")
    }
}
