//! Error types module
//!
//! All workflow failures are unified under the `AppError` enum. The external
//! contract collapses every failure to status code `1`; `AppError::code()`
//! keeps a stable machine-readable kind for logs and error reports.

/// Unified error type for the upload workflow.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Payload decode failed: {0}")]
    PayloadDecode(String),

    #[error("No file URL in event payload to upload")]
    MissingUrl,

    #[error("URL '{0}' has no filename path segment")]
    MissingFilename(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Folder resolution failed: {0}")]
    FolderResolution(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Rename failed: {0}")]
    Rename(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable error kind, attached to log lines and error
    /// reports so the collapsed integer status stays diagnosable.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidEvent(_) => "INVALID_EVENT",
            AppError::PayloadDecode(_) => "PAYLOAD_DECODE",
            AppError::MissingUrl => "MISSING_URL",
            AppError::MissingFilename(_) => "MISSING_FILENAME",
            AppError::Download(_) => "DOWNLOAD_FAILED",
            AppError::FolderResolution(_) => "FOLDER_RESOLUTION_FAILED",
            AppError::Upload(_) => "UPLOAD_FAILED",
            AppError::Rename(_) => "RENAME_FAILED",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
