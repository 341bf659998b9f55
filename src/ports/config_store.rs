use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    ReadError(String),

    #[error("Failed to write configuration: {0}")]
    WriteError(String),

    #[error("Invalid configuration format: {0}")]
    InvalidFormat(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub const DEFAULT_AUTHOR: &str = "Jayan (Technician)";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Overrides the platform data directory for the complaint blob and log file
    pub data_dir: Option<PathBuf>,
    /// Author recorded on comments added from this client
    pub author: String,
    pub time_refresh_seconds: u64,
    pub live_time_labels: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            author: DEFAULT_AUTHOR.to_string(),
            time_refresh_seconds: 60,
            live_time_labels: true,
        }
    }
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load_config(&self) -> ConfigResult<AppConfig>;
    async fn save_config(&self, config: &AppConfig) -> ConfigResult<()>;
}
