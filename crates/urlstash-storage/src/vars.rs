//! Credentials blob loader.
//!
//! Remote-account credentials live in a JSON object (`USERNAME`/`PASSWORD`
//! fields) stored in a separate configuration bucket, read once per process.
//! Any failure here is unrecoverable for the invocation: without credentials
//! there is nothing to log into.

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use urlstash_core::Credentials;

use crate::traits::{StoreError, StoreResult};

/// Fetch and parse the credentials blob from the configuration object store.
///
/// Uses the ambient credential chain of the hosting platform; the blob itself
/// holds the third-party account's credentials, not the platform's.
pub async fn load_credentials(bucket: &str, blob: &str) -> StoreResult<Credentials> {
    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let client = Client::new(&config);

    let response = client
        .get_object()
        .bucket(bucket)
        .key(blob)
        .send()
        .await
        .map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to get blob '{}' on the '{}' bucket: {}",
                blob, bucket, e
            ))
        })?;

    let data = response.body.collect().await.map_err(|e| {
        StoreError::ConfigError(format!(
            "Failed to read blob '{}' on the '{}' bucket: {}",
            blob, bucket, e
        ))
    })?;

    let credentials = parse_credentials(&data.into_bytes())?;

    tracing::info!(bucket = %bucket, blob = %blob, "Loaded remote account credentials");
    Ok(credentials)
}

/// Parse the blob content as a JSON credentials object.
pub fn parse_credentials(raw: &[u8]) -> StoreResult<Credentials> {
    serde_json::from_slice(raw)
        .map_err(|e| StoreError::ConfigError(format!("Credentials blob is not valid JSON: {}", e)))
}
