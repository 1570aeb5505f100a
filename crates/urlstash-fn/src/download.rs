//! HTTP download step.

use reqwest::StatusCode;
use tempfile::NamedTempFile;
use urlstash_core::AppError;

/// Fetch `url` and persist the body to a named temporary file.
///
/// The returned handle owns the file; dropping it deletes the file on every
/// exit path, success or failure.
pub async fn fetch_to_temp(
    client: &reqwest::Client,
    url: &str,
) -> Result<NamedTempFile, AppError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|_| AppError::Download(format!("Invalid URL format: {}", url)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::Download(
            "Only HTTP and HTTPS URLs are allowed".to_string(),
        ));
    }

    let response = client.get(parsed).send().await.map_err(|e| {
        AppError::Download(format!("Failed to download file at url {}: {}", url, e))
    })?;

    if response.status() != StatusCode::OK {
        return Err(AppError::Download(format!(
            "Failed to download file at url {}. Status code: {}",
            url,
            response.status().as_u16()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::Download(format!("Failed to read response body: {}", e)))?;

    let temp = NamedTempFile::new()
        .map_err(|e| AppError::Internal(format!("Failed to create temporary file: {}", e)))?;

    tokio::fs::write(temp.path(), &bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to write temporary file: {}", e)))?;

    tracing::info!(
        url = %url,
        size_bytes = bytes.len(),
        path = %temp.path().display(),
        "Success in downloading file"
    );

    Ok(temp)
}
