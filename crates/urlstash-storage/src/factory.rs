#[cfg(feature = "store-local")]
use crate::LocalStore;
#[cfg(feature = "store-s3")]
use crate::S3RemoteStore;
use crate::{RemoteStore, StoreError, StoreResult};
use std::sync::Arc;
use urlstash_core::{Config, Credentials, RemoteBackend};

/// Create a remote storage backend based on configuration.
///
/// For the S3 backend this performs the login probe, so a factory failure is
/// equivalent to a login failure and must not be cached by the caller.
pub async fn create_store(
    config: &Config,
    credentials: &Credentials,
) -> StoreResult<Arc<dyn RemoteStore>> {
    match config.remote_backend() {
        #[cfg(feature = "store-s3")]
        RemoteBackend::S3 => {
            let bucket = config
                .remote_bucket()
                .map(String::from)
                .ok_or_else(|| StoreError::ConfigError("REMOTE_BUCKET not configured".to_string()))?;

            let store = S3RemoteStore::login(
                credentials,
                bucket,
                config.remote_region().map(String::from),
                config.remote_endpoint().map(String::from),
            )
            .await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "store-s3"))]
        RemoteBackend::S3 => Err(StoreError::ConfigError(
            "S3 backend not available (store-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "store-local")]
        RemoteBackend::Local => {
            let base_path = config.local_store_path().map(String::from).ok_or_else(|| {
                StoreError::ConfigError("LOCAL_STORE_PATH not configured".to_string())
            })?;

            let store = LocalStore::new(base_path).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "store-local"))]
        RemoteBackend::Local => Err(StoreError::ConfigError(
            "Local backend not available (store-local feature not enabled)".to_string(),
        )),
    }
}
