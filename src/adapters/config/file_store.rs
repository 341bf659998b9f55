use crate::ports::{AppConfig, ConfigError, ConfigResult, ConfigStore, DEFAULT_AUTHOR};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    author: Option<String>,
    time_refresh_seconds: Option<u64>,
    live_time_labels: Option<bool>,
}

pub struct FileConfigStore {
    config_path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::ReadError("Cannot determine config directory".to_string())
        })?;

        let app_config_dir = config_dir.join("complaint-tracker");
        Ok(Self::with_path(app_config_dir.join("config.json")))
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    async fn ensure_config_dir(&self) -> ConfigResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load_config(&self) -> ConfigResult<AppConfig> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    "No config at {}, using defaults",
                    self.config_path.display()
                );
                return Ok(AppConfig::default());
            }
            Err(e) => return Err(ConfigError::ReadError(e.to_string())),
        };

        let config_file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        let defaults = AppConfig::default();
        Ok(AppConfig {
            data_dir: config_file.data_dir,
            author: config_file
                .author
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            time_refresh_seconds: config_file
                .time_refresh_seconds
                .filter(|s| *s > 0)
                .unwrap_or(defaults.time_refresh_seconds),
            live_time_labels: config_file
                .live_time_labels
                .unwrap_or(defaults.live_time_labels),
        })
    }

    async fn save_config(&self, config: &AppConfig) -> ConfigResult<()> {
        self.ensure_config_dir().await?;

        let config_file = ConfigFile {
            data_dir: config.data_dir.clone(),
            author: Some(config.author.clone()),
            time_refresh_seconds: Some(config.time_refresh_seconds),
            live_time_labels: Some(config.live_time_labels),
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        fs::write(&self.config_path, content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));

        let config = store.load_config().await.unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"author": "Priya (Service Desk)"}"#)
            .await
            .unwrap();

        let config = FileConfigStore::with_path(&path).load_config().await.unwrap();
        assert_eq!(config.author, "Priya (Service Desk)");
        assert_eq!(config.time_refresh_seconds, 60);
        assert!(config.live_time_labels);
        assert_eq!(config.data_dir, None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let config = AppConfig {
            data_dir: Some(dir.path().join("data")),
            author: "Night shift".to_string(),
            time_refresh_seconds: 15,
            live_time_labels: false,
        };

        store.save_config(&config).await.unwrap();
        assert_eq!(store.load_config().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_invalid_json_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").await.unwrap();

        let err = FileConfigStore::with_path(&path).load_config().await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFormat(_)));
    }
}
