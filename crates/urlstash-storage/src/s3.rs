use crate::traits::{
    key_basename, key_parent, EntryKind, RemoteEntry, RemoteStore, StoreError, StoreResult,
};
use async_trait::async_trait;
use aws_config::retry::{RetryConfig, RetryMode};
use aws_sdk_s3::config::{BehaviorVersion, Credentials as S3Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use urlstash_core::Credentials;

const DEFAULT_REGION: &str = "us-east-1";
const CREDENTIALS_PROVIDER_NAME: &str = "urlstash-vars";

/// S3-compatible remote storage backend.
///
/// Folders are zero-byte marker objects whose key ends with `/`, the common
/// console convention, so `find_path` stays a single `HeadObject` call.
#[derive(Clone)]
pub struct S3RemoteStore {
    client: Client,
    bucket: String,
}

impl S3RemoteStore {
    /// Log into the remote account with the loaded credentials.
    ///
    /// The username/password pair from the configuration blob maps onto the
    /// access-key/secret-key pair of the S3-compatible provider. A `HeadBucket`
    /// probe verifies the session; a failed probe is fatal to initialization
    /// and the caller retries fresh on the next invocation.
    ///
    /// # Arguments
    /// * `bucket` - the account bucket files are stashed into
    /// * `region` - region identifier, defaults to `us-east-1`
    /// * `endpoint_url` - custom endpoint for S3-compatible providers
    ///   (e.g. "http://localhost:9000" for MinIO)
    pub async fn login(
        credentials: &Credentials,
        bucket: String,
        region: Option<String>,
        endpoint_url: Option<String>,
    ) -> StoreResult<Self> {
        let region = Region::new(region.unwrap_or_else(|| DEFAULT_REGION.to_string()));

        let retry_config = RetryConfig::standard()
            .with_max_attempts(5)
            .with_retry_mode(RetryMode::Adaptive);

        let provider = S3Credentials::new(
            credentials.username.clone(),
            credentials.password.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(provider)
            .retry_config(retry_config);

        if let Some(ref endpoint) = endpoint_url {
            // Path-style addressing is required by MinIO and most
            // S3-compatible providers.
            config_builder = config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        let client = Client::from_conf(config_builder.build());

        client
            .head_bucket()
            .bucket(&bucket)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    username = %credentials.username,
                    "Login check against remote account failed"
                );
                StoreError::LoginFailed(e.to_string())
            })?;

        tracing::info!(bucket = %bucket, "Logged into remote storage account");

        Ok(S3RemoteStore { client, bucket })
    }

    /// Folder marker key for a path: trimmed of surrounding slashes, with a
    /// single trailing slash.
    fn folder_key(path: &str) -> String {
        format!("{}/", path.trim_matches('/'))
    }

    /// Entry for a listed key whose basename matches `name`, at any depth.
    /// Marker keys (trailing slash) resolve as folders, everything else as
    /// files.
    fn entry_for_key(key: &str, name: &str) -> Option<RemoteEntry> {
        if key_basename(key) != name {
            return None;
        }
        let kind = if key.ends_with('/') {
            EntryKind::Folder
        } else {
            EntryKind::File
        };
        Some(RemoteEntry {
            key: key.to_string(),
            name: name.to_string(),
            kind,
        })
    }
}

#[async_trait]
impl RemoteStore for S3RemoteStore {
    async fn find_path(&self, path: &str) -> StoreResult<Option<RemoteEntry>> {
        let key = Self::folder_key(path);

        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(_) => Ok(Some(RemoteEntry {
                name: key_basename(&key).to_string(),
                key,
                kind: EntryKind::Folder,
            })),
            Err(e) => match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    HeadObjectError::NotFound(_) => Ok(None),
                    _ => Err(StoreError::FolderFailed(e.to_string())),
                },
                _ => Err(StoreError::FolderFailed(e.to_string())),
            },
        }
    }

    async fn create_folder(&self, name: &str) -> StoreResult<()> {
        // Put a marker for every path level so nested folders resolve too.
        let mut prefix = String::new();
        for segment in name.trim_matches('/').split('/').filter(|s| !s.is_empty()) {
            prefix.push_str(segment);
            prefix.push('/');

            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&prefix)
                .body(ByteStream::from_static(b""))
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(
                        error = %e,
                        bucket = %self.bucket,
                        key = %prefix,
                        "Failed to create folder marker"
                    );
                    StoreError::FolderFailed(e.to_string())
                })?;
        }

        tracing::info!(bucket = %self.bucket, folder = %name, "Created remote folder");
        Ok(())
    }

    async fn find(&self, name: &str) -> StoreResult<Option<RemoteEntry>> {
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StoreError::BackendError(e.to_string()))?;

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                if let Some(entry) = Self::entry_for_key(key, name) {
                    return Ok(Some(entry));
                }
            }

            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => return Ok(None),
            }
        }
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

        let size = tokio::fs::metadata(local_path).await.map(|m| m.len()).ok();
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StoreError::UploadFailed(e.to_string()))?;

        let start = std::time::Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Remote upload failed"
                );
                StoreError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote upload successful"
        );

        Ok(RemoteEntry {
            key,
            name: filename,
            kind: EntryKind::File,
        })
    }

    async fn rename(&self, entry: &RemoteEntry, new_name: &str) -> StoreResult<RemoteEntry> {
        if entry.is_folder() {
            return Err(StoreError::RenameFailed(format!(
                "Folder '{}' cannot be renamed in place",
                entry.name
            )));
        }

        let new_key = format!("{}{}", key_parent(&entry.key), new_name);
        if new_key == entry.key {
            return Ok(entry.clone());
        }

        // URL-encode the copy source per the S3 API requirements.
        let encoded_key = urlencoding::encode(&entry.key);
        let copy_source = format!("{}/{}", self.bucket, encoded_key);

        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(&copy_source)
            .key(&new_key)
            .send()
            .await
            .map_err(|e| StoreError::RenameFailed(e.to_string()))?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&entry.key)
            .send()
            .await
            .map_err(|e| StoreError::RenameFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            from_key = %entry.key,
            to_key = %new_key,
            "Remote rename successful"
        );

        Ok(RemoteEntry {
            key: new_key,
            name: new_name.to_string(),
            kind: EntryKind::File,
        })
    }
}
