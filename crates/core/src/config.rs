//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.toml` under the user's
//! config directory, then `WANICH__*` environment variables (with `__`
//! separating nested keys, e.g. `WANICH__GATEWAY__KIND=webhook`).

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory under the platform config dir that holds our files.
pub const CONFIG_DIR_NAME: &str = "wanich";
/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Placeholder Apps Script endpoint used until a real deployment is configured.
pub const DEFAULT_WEBHOOK_URL: &str =
    "https://script.google.com/macros/s/YOUR_APPS_SCRIPT_ID/exec";

const DEFAULT_CONFIG: &str = r#"# Wanich board game club client

# How long transient notifications stay visible.
notification_secs = 5

# Enables the game management screen (press `m` in the catalog).
admin_enabled = false

[gateway]
# "mock" waits `mock_delay_ms` and reports success without any network I/O.
# "webhook" POSTs each record as JSON to `webhook_url`.
kind = "mock"
webhook_url = "https://script.google.com/macros/s/YOUR_APPS_SCRIPT_ID/exec"
mock_delay_ms = 800
timeout_secs = 10
"#;

/// Which record sink implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// Artificial delay, always succeeds.
    Mock,
    /// HTTP POST to the spreadsheet webhook.
    Webhook,
}

/// Settings for the record gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Selected implementation.
    pub kind: GatewayKind,
    /// Endpoint for [`GatewayKind::Webhook`].
    pub webhook_url: String,
    /// Artificial delay for [`GatewayKind::Mock`], in milliseconds.
    pub mock_delay_ms: u64,
    /// Per-request timeout for [`GatewayKind::Webhook`], in seconds.
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// Mock delay as a [`Duration`].
    pub fn mock_delay(&self) -> Duration {
        Duration::from_millis(self.mock_delay_ms)
    }

    /// Webhook request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            kind: GatewayKind::Mock,
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            mock_delay_ms: 800,
            timeout_secs: 10,
        }
    }
}

/// Top-level configuration for the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Record gateway settings.
    pub gateway: GatewayConfig,
    /// Lifetime of transient notifications, in seconds.
    pub notification_secs: u64,
    /// Whether the game management screen can be opened.
    pub admin_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            notification_secs: 5,
            admin_enabled: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Some(&config_path()))
    }

    /// Load configuration from an optional file plus the environment.
    ///
    /// A missing file is not an error; defaults fill every absent key.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let defaults = AppConfig::default();
        let mut builder = Config::builder()
            .set_default("notification_secs", defaults.notification_secs)?
            .set_default("admin_enabled", defaults.admin_enabled)?
            .set_default("gateway.kind", "mock")?
            .set_default("gateway.webhook_url", defaults.gateway.webhook_url.clone())?
            .set_default("gateway.mock_delay_ms", defaults.gateway.mock_delay_ms)?
            .set_default("gateway.timeout_secs", defaults.gateway.timeout_secs)?;

        if let Some(path) = path {
            builder = builder.add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("WANICH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to assemble configuration")?;

        settings
            .try_deserialize()
            .context("failed to parse configuration")
    }

    /// Notification lifetime as a [`Duration`].
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }
}

/// Directory holding the configuration file.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Full path of the configuration file.
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Write the default configuration file when none exists yet.
pub fn ensure_default_config() -> Result<()> {
    ensure_default_config_at(&config_path())
}

/// Write the default configuration to `path` unless it already exists.
pub fn ensure_default_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}
