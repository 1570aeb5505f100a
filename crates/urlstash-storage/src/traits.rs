//! Remote storage abstraction trait
//!
//! This module defines the `RemoteStore` trait that all backends must
//! implement, plus the entry types the workflow passes around.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Remote storage operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Folder operation failed: {0}")]
    FolderFailed(String),

    #[error("Rename failed: {0}")]
    RenameFailed(String),

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for remote storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Kind of a resolved remote entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/// Handle to an entry in the remote account.
///
/// `key` is the backend's internal identifier (an object key or a relative
/// filesystem path); `name` is the entry's basename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub key: String,
    pub name: String,
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// Remote storage account abstraction.
///
/// Backends must be cheap to share behind an `Arc`; a single logged-in
/// instance is reused for every invocation in the process.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Resolve a folder by its full path relative to the account root.
    async fn find_path(&self, path: &str) -> StoreResult<Option<RemoteEntry>>;

    /// Create a folder (and any missing parents) under the account root.
    async fn create_folder(&self, name: &str) -> StoreResult<()>;

    /// Resolve an entry by bare name anywhere in the account.
    ///
    /// Scans the account and returns the first entry whose basename matches.
    /// With duplicate names across folders the result is backend-order
    /// dependent.
    async fn find(&self, name: &str) -> StoreResult<Option<RemoteEntry>>;

    /// Upload a local file, keyed by its basename, into `folder` or the
    /// account root when `None`. Returns the stored entry.
    async fn upload(
        &self,
        local_path: &Path,
        folder: Option<&RemoteEntry>,
    ) -> StoreResult<RemoteEntry>;

    /// Rename an entry in place (same parent folder).
    async fn rename(&self, entry: &RemoteEntry, new_name: &str) -> StoreResult<RemoteEntry>;
}

/// Basename of a key: the last non-empty slash-separated segment.
pub(crate) fn key_basename(key: &str) -> &str {
    key.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(key)
}

/// Parent prefix of a key, including the trailing slash; empty for root keys.
pub(crate) fn key_parent(key: &str) -> &str {
    let trimmed = key.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &key[..idx + 1],
        None => "",
    }
}
