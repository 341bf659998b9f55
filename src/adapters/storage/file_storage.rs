use crate::ports::{KeyValueStorage, StorageError, StorageResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Stores each key as `<url-encoded key>.json` inside a directory.
pub struct FileKeyValueStorage {
    root: PathBuf,
}

impl FileKeyValueStorage {
    pub fn new() -> StorageResult<Self> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            StorageError::Read("Cannot determine data directory".to_string())
        })?;

        Ok(Self::with_root(data_dir.join("complaint-tracker")))
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", urlencoding::encode(key)))
    }

    async fn ensure_root(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Write(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStorage for FileKeyValueStorage {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.item_path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read(e.to_string())),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.ensure_root().await?;

        let path = self.item_path(key);
        let tmp_path = path.with_extension("json.tmp");

        // Write-then-rename so a crash mid-write leaves the previous blob intact
        fs::write(&tmp_path, value)
            .await
            .map_err(|e| StorageError::Write(e.to_string()))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StorageError::Write(e.to_string()))?;

        tracing::debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}
