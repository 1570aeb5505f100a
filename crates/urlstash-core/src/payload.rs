//! Event and payload models.
//!
//! The trigger event carries a `data` field holding base64-encoded UTF-8 JSON:
//! `{ "url": "<http(s) URL>", "folder": "<optional string>" }`.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Raw trigger payload delivered by the hosting platform.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerEvent {
    pub data: Option<String>,
}

/// Decoded upload request. `folder` absence means the account root.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UploadRequest {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

/// Remote-account credentials, loaded once from the configuration blob.
///
/// The blob is a JSON object with at least `USERNAME` and `PASSWORD` fields.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    #[serde(rename = "USERNAME")]
    pub username: String,
    #[serde(rename = "PASSWORD")]
    pub password: String,
}

// Keep the password out of debug output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Decode the event `data` field: base64 -> UTF-8 -> JSON.
pub fn decode_payload(data: &str) -> Result<UploadRequest, AppError> {
    let raw = general_purpose::STANDARD
        .decode(data)
        .map_err(|e| AppError::PayloadDecode(format!("invalid base64: {}", e)))?;

    let text = String::from_utf8(raw)
        .map_err(|e| AppError::PayloadDecode(format!("payload is not UTF-8: {}", e)))?;

    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| AppError::PayloadDecode(format!("payload is not valid JSON: {}", e)))?;

    // A well-formed payload without a `url` field is a distinct failure from a
    // payload that does not parse at all.
    if value.get("url").is_none() {
        return Err(AppError::MissingUrl);
    }

    let request: UploadRequest = serde_json::from_value(value)
        .map_err(|e| AppError::PayloadDecode(format!("malformed payload fields: {}", e)))?;

    if request.url.trim().is_empty() {
        return Err(AppError::MissingUrl);
    }

    Ok(request)
}

/// Derive the original filename from the URL's path: last non-empty segment.
pub fn original_filename(raw_url: &str) -> Option<String> {
    let parsed = url::Url::parse(raw_url).ok()?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(|s| s.to_string())
}
