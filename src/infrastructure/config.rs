use crate::application::scheduler::SchedulerSettings;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub dashboard: StartupSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Raw rate, validated by the rate controller at startup
    #[serde(default = "default_rate_ms")]
    pub initial_rate_ms: i64,
    #[serde(default = "default_frame_period_ms")]
    pub frame_period_ms: u64,
    #[serde(default = "default_true")]
    pub idle_frame_polling: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_rate_ms: default_rate_ms(),
            frame_period_ms: default_frame_period_ms(),
            idle_frame_polling: true,
        }
    }
}

impl SchedulerConfig {
    pub fn settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            frame_period: Duration::from_millis(self.frame_period_ms.max(1)),
            idle_frame_polling: self.idle_frame_polling,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StartupSettings {
    #[serde(default)]
    pub show_all_on_start: bool,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_rate_ms() -> i64 {
    100
}

fn default_frame_period_ms() -> u64 {
    16
}

fn default_true() -> bool {
    true
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

/// `config/dashboard.*` if present, then `DASHBOARD__SECTION__KEY` variables.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Join a provider base URL and an API path without doubling slashes.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
