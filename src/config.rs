use crate::core::{ChannelSettings, MatchPolicy};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub socket: SocketSettings,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocketSettings {
    pub url: String,
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionSettings {
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub reconnect_initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    pub max_reconnect_attempts: Option<u32>,
    #[serde(default)]
    pub match_policy: MatchPolicy,
    #[serde(default = "default_pending_capacity")]
    pub pending_capacity: usize,
    #[serde(default = "default_seen_capacity")]
    pub seen_capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            reconnect_initial_delay_ms: default_initial_delay_ms(),
            reconnect_max_delay_ms: default_max_delay_ms(),
            max_reconnect_attempts: None,
            match_policy: MatchPolicy::default(),
            pending_capacity: default_pending_capacity(),
            seen_capacity: default_seen_capacity(),
        }
    }
}

impl From<&ChannelConfig> for ChannelSettings {
    fn from(config: &ChannelConfig) -> Self {
        Self {
            initial_backoff: Duration::from_millis(config.reconnect_initial_delay_ms),
            max_backoff: Duration::from_millis(config.reconnect_max_delay_ms),
            max_reconnect_attempts: config.max_reconnect_attempts,
            policy: config.match_policy,
            pending_capacity: config.pending_capacity,
            seen_capacity: config.seen_capacity,
        }
    }
}

fn default_initial_delay_ms() -> u64 { 500 }
fn default_max_delay_ms() -> u64 { 30_000 }
fn default_pending_capacity() -> usize { 16 }
fn default_seen_capacity() -> usize { 256 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with LUME__)
    /// 5. `API_URL` / `SOCKET_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(env_source())
            .build()?;

        apply_shortcut_overrides(settings)?.try_deserialize()
    }

    /// Load configuration from a single file instead of `config/`
    ///
    /// Environment variables still apply on top, shortcuts included.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        apply_shortcut_overrides(settings)?.try_deserialize()
    }

    pub fn channel_settings(&self) -> ChannelSettings {
        ChannelSettings::from(&self.channel)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.unwrap_or(30))
    }

    pub fn socket_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.socket.connect_timeout_secs.unwrap_or(10))
    }
}

// e.g., LUME__CHANNEL__MATCH_POLICY -> channel.match_policy
fn env_source() -> Environment {
    Environment::with_prefix("LUME")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// `API_URL` and `SOCKET_URL` override the endpoints without the LUME__ prefix
fn apply_shortcut_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("API_URL") {
        builder = builder.set_override("api.base_url", url)?;
    }
    if let Ok(url) = env::var("SOCKET_URL") {
        builder = builder.set_override("socket.url", url)?;
    }

    builder.build()
}
