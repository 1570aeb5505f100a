use crate::traits::{
    key_basename, key_parent, EntryKind, RemoteEntry, RemoteStore, StoreError, StoreResult,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem backend.
///
/// Folders are directories under a base path, renames are real filesystem
/// renames. Used for development runs and by the workflow tests.
#[derive(Clone)]
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at `base_path`, creating it if missing.
    pub async fn new(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to create store directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStore { base_path })
    }

    /// Convert an entry key to a filesystem path, rejecting traversal.
    ///
    /// Only a whole `..` component is traversal; basenames like `a..b.jpg`
    /// are legitimate.
    fn key_to_path(&self, key: &str) -> StoreResult<PathBuf> {
        let has_traversal = key.split('/').any(|component| component == "..");
        if has_traversal || key.starts_with('/') {
            return Err(StoreError::BackendError(format!(
                "Entry key '{}' contains invalid components",
                key
            )));
        }
        Ok(self.base_path.join(key.trim_end_matches('/')))
    }

    /// Iterative scan of the tree for the first entry whose basename matches
    /// `name`.
    async fn scan_for(&self, name: &str) -> StoreResult<Option<RemoteEntry>> {
        let mut pending = vec![self.base_path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                let basename = entry.file_name().to_string_lossy().to_string();

                let relative = path
                    .strip_prefix(&self.base_path)
                    .map_err(|e| StoreError::BackendError(e.to_string()))?
                    .to_string_lossy()
                    .replace('\\', "/");

                if basename == name {
                    let kind = if file_type.is_dir() {
                        EntryKind::Folder
                    } else {
                        EntryKind::File
                    };
                    let key = if file_type.is_dir() {
                        format!("{}/", relative)
                    } else {
                        relative
                    };
                    return Ok(Some(RemoteEntry {
                        key,
                        name: basename,
                        kind,
                    }));
                }

                if file_type.is_dir() {
                    pending.push(path);
                }
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl RemoteStore for LocalStore {
    async fn find_path(&self, path: &str) -> StoreResult<Option<RemoteEntry>> {
        let candidate = self.key_to_path(path.trim_matches('/'))?;

        match fs::metadata(&candidate).await {
            Ok(meta) if meta.is_dir() => {
                let key = format!("{}/", path.trim_matches('/'));
                Ok(Some(RemoteEntry {
                    name: key_basename(&key).to_string(),
                    key,
                    kind: EntryKind::Folder,
                }))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::FolderFailed(e.to_string())),
        }
    }

    async fn create_folder(&self, name: &str) -> StoreResult<()> {
        let path = self.key_to_path(name.trim_matches('/'))?;
        fs::create_dir_all(&path)
            .await
            .map_err(|e| StoreError::FolderFailed(e.to_string()))?;
        tracing::info!(folder = %name, "Created local folder");
        Ok(())
    }

    async fn find(&self, name: &str) -> StoreResult<Option<RemoteEntry>> {
        self.scan_for(name).await
    }

    async fn upload(
        &self,
        local_path: &Path,
        folder: Option<&RemoteEntry>,
    ) -> StoreResult<RemoteEntry> {
        let filename = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                StoreError::UploadFailed(format!("Invalid local path: {}", local_path.display()))
            })?;

        let key = match folder {
            Some(folder) => format!("{}{}", folder.key, filename),
            None => filename.clone(),
        };

        let target = self.key_to_path(&key)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::UploadFailed(e.to_string()))?;
        }

        fs::copy(local_path, &target)
            .await
            .map_err(|e| StoreError::UploadFailed(e.to_string()))?;

        tracing::info!(key = %key, "Local upload successful");

        Ok(RemoteEntry {
            key,
            name: filename,
            kind: EntryKind::File,
        })
    }

    async fn rename(&self, entry: &RemoteEntry, new_name: &str) -> StoreResult<RemoteEntry> {
        let new_key = format!("{}{}", key_parent(&entry.key), new_name);

        let from = self.key_to_path(&entry.key)?;
        let to = self.key_to_path(&new_key)?;

        fs::rename(&from, &to)
            .await
            .map_err(|e| StoreError::RenameFailed(e.to_string()))?;

        Ok(RemoteEntry {
            key: new_key,
            name: new_name.to_string(),
            kind: entry.kind,
        })
    }
}
