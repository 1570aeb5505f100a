//! The upload workflow.
//!
//! One invocation runs a linear step sequence with no backtracking:
//! validate event, decode payload, validate fields, download, resolve folder,
//! upload, rename. Any step failure logs, emits one error report, and turns
//! into status `1`; full success is `0`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use urlstash_core::{
    decode_payload, original_filename, AppError, Config, Credentials, RemoteBackend, TriggerEvent,
};
use urlstash_storage::{create_store, RemoteEntry, RemoteStore};

use crate::download::fetch_to_temp;
use crate::reporter::ErrorReporter;

/// The workflow with its injected dependencies.
///
/// The logged-in store handle is memoized process-wide: the first invocation
/// pays for credentials loading and login, later ones reuse the session. A
/// failed initialization leaves the cell empty, so the next invocation retries
/// fresh instead of caching the failure.
pub struct Workflow {
    config: Config,
    http: reqwest::Client,
    reporter: ErrorReporter,
    store: OnceCell<Arc<dyn RemoteStore>>,
}

impl Workflow {
    pub fn new(config: Config, reporter: ErrorReporter) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs()))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Workflow {
            config,
            http,
            reporter,
            store: OnceCell::new(),
        })
    }

    /// Workflow over an already-constructed store handle, bypassing the lazy
    /// credentials load and login. Used when the backend is built elsewhere
    /// and by tests driving the workflow against a stub store.
    pub fn with_store(
        config: Config,
        reporter: ErrorReporter,
        store: Arc<dyn RemoteStore>,
    ) -> Result<Self, AppError> {
        let mut workflow = Self::new(config, reporter)?;
        workflow.store = OnceCell::new_with(Some(store));
        Ok(workflow)
    }

    /// Run one invocation, collapsing the result to the external status
    /// contract: `0` success, `1` any failure. Exactly one error report is
    /// emitted per failed invocation.
    pub async fn handle(&self, event: &TriggerEvent) -> i32 {
        match self.execute(event).await {
            Ok(()) => 0,
            Err(err) => {
                tracing::error!(kind = err.code(), error = %err, "Upload workflow failed");
                self.reporter.report(&err.to_string(), err.code()).await;
                1
            }
        }
    }

    async fn execute(&self, event: &TriggerEvent) -> Result<(), AppError> {
        // ValidateEvent: the event must carry a non-null data field.
        let data = event.data.as_deref().ok_or_else(|| {
            AppError::InvalidEvent("Cannot find the data object in event".to_string())
        })?;
        tracing::debug!(data_len = data.len(), "Received trigger event");

        // DecodePayload + ValidateFields.
        let request = decode_payload(data)?;
        if request.folder.is_none() {
            tracing::warn!(
                url = %request.url,
                "No folder in event payload to upload file to, uploading to root folder"
            );
        }

        let name = original_filename(&request.url)
            .ok_or_else(|| AppError::MissingFilename(request.url.clone()))?;

        // DownloadFile. The temp file deletes itself when this scope ends,
        // whatever happens below.
        let temp = fetch_to_temp(&self.http, &request.url).await?;
        let temp_name = temp
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| AppError::Internal("Temporary file has no name".to_string()))?;

        let store = self.store().await?;

        // ResolveFolder.
        let folder = match &request.folder {
            Some(folder_name) => self.resolve_folder(store.as_ref(), folder_name).await?,
            None => None,
        };

        // Upload.
        store
            .upload(temp.path(), folder.as_ref())
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        // Rename: the uploaded entry is re-located by the temporary file's
        // basename, then renamed to the URL-derived filename. A lookup miss
        // here is fatal.
        let uploaded = store
            .find(&temp_name)
            .await
            .map_err(|e| AppError::Rename(e.to_string()))?
            .ok_or_else(|| {
                AppError::Rename(format!(
                    "Uploaded entry '{}' not found in remote account",
                    temp_name
                ))
            })?;

        store
            .rename(&uploaded, &name)
            .await
            .map_err(|e| AppError::Rename(e.to_string()))?;

        tracing::info!(name = %name, "Finished uploading file to remote account");
        Ok(())
    }

    /// Resolve the destination folder, creating it when absent.
    ///
    /// Existence is checked by full path, but the entry handed to the upload
    /// step is re-fetched by bare name, mirroring the account API's two lookup
    /// modes. A name lookup that comes back empty (or resolves to a file)
    /// falls back to the account root with a warning rather than failing.
    async fn resolve_folder(
        &self,
        store: &dyn RemoteStore,
        folder_name: &str,
    ) -> Result<Option<RemoteEntry>, AppError> {
        let existing = store
            .find_path(folder_name)
            .await
            .map_err(|e| AppError::FolderResolution(e.to_string()))?;

        if existing.is_none() {
            store
                .create_folder(folder_name)
                .await
                .map_err(|e| AppError::FolderResolution(e.to_string()))?;
            tracing::warn!(
                folder = %folder_name,
                "Folder not found in remote account to upload the file to and was created"
            );
        } else {
            tracing::debug!(folder = %folder_name, "Folder already exists");
        }

        let entry = store
            .find(folder_name)
            .await
            .map_err(|e| AppError::FolderResolution(e.to_string()))?;

        match entry {
            Some(entry) if entry.is_folder() => Ok(Some(entry)),
            Some(entry) => {
                tracing::warn!(
                    folder = %folder_name,
                    key = %entry.key,
                    "Name lookup resolved to a non-folder entry, uploading to root"
                );
                Ok(None)
            }
            None => {
                tracing::warn!(
                    folder = %folder_name,
                    "Folder not locatable by name after resolution, uploading to root"
                );
                Ok(None)
            }
        }
    }

    /// Lazily initialize the logged-in store handle.
    async fn store(&self) -> Result<&Arc<dyn RemoteStore>, AppError> {
        self.store
            .get_or_try_init(|| async {
                let credentials = self.load_credentials().await?;
                create_store(&self.config, &credentials)
                    .await
                    .map_err(|e| AppError::Config(e.to_string()))
            })
            .await
    }

    async fn load_credentials(&self) -> Result<Credentials, AppError> {
        match self.config.remote_backend() {
            RemoteBackend::S3 => {
                let bucket = self.config.vars_bucket().ok_or_else(|| {
                    AppError::Config("VARS_BUCKET not configured".to_string())
                })?;
                let blob = self.config.vars_blob().ok_or_else(|| {
                    AppError::Config("VARS_BLOB not configured".to_string())
                })?;

                urlstash_storage::load_credentials(bucket, blob)
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            error = %e,
                            bucket = %bucket,
                            blob = %blob,
                            "Failed to load credentials from configuration store"
                        );
                        AppError::Config(e.to_string())
                    })
            }
            // The local backend has no account to log into.
            RemoteBackend::Local => Ok(Credentials {
                username: String::new(),
                password: String::new(),
            }),
        }
    }
}
