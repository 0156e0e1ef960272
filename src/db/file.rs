use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{ListKey, ListStore};
use crate::error::{AppError, AppResult};

/// Stores each list as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileListStore {
    dir: PathBuf,
}

impl FileListStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &ListKey) -> AppResult<PathBuf> {
        let name = key.list_name();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(AppError::InvalidInput(format!(
                "List name '{}' cannot be used as a file name",
                name
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait::async_trait]
impl ListStore for FileListStore {
    async fn load(&self, key: &ListKey) -> AppResult<Option<String>> {
        let path = self.path_for(key)?;

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), bytes = contents.len(), "Loaded list snapshot");
                Ok(Some(contents))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No list snapshot on disk");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &ListKey, snapshot: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write beside the target and rename over it so a crash leaves the
        // previous snapshot intact
        let tmp_path = self
            .dir
            .join(format!(".{}.{}.tmp", key, Uuid::new_v4()));
        tokio::fs::write(&tmp_path, snapshot).await?;

        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), bytes = snapshot.len(), "Saved list snapshot");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
