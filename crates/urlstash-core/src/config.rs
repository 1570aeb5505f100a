//! Configuration module
//!
//! Environment-driven configuration for the function: where the credentials
//! blob lives, which remote backend to use, and the ambient HTTP settings.

use std::env;

use crate::error::AppError;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Remote storage backend selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteBackend {
    /// S3-compatible account (AWS S3, MinIO, DigitalOcean Spaces, ...).
    S3,
    /// Local filesystem tree, for development and tests.
    Local,
}

impl RemoteBackend {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value.to_lowercase().as_str() {
            "s3" => Ok(RemoteBackend::S3),
            "local" => Ok(RemoteBackend::Local),
            other => Err(AppError::Config(format!(
                "Unknown REMOTE_BACKEND '{}', expected 's3' or 'local'",
                other
            ))),
        }
    }
}

/// Function configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    vars_bucket: Option<String>,
    vars_blob: Option<String>,
    remote_backend: RemoteBackend,
    remote_bucket: Option<String>,
    remote_region: Option<String>,
    remote_endpoint: Option<String>,
    local_store_path: Option<String>,
    error_report_url: Option<String>,
    http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let remote_backend = match env::var("REMOTE_BACKEND") {
            Ok(value) => RemoteBackend::parse(&value)?,
            Err(_) => RemoteBackend::S3,
        };

        let http_timeout_secs = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(value) => value.parse::<u64>().map_err(|_| {
                AppError::Config(format!("HTTP_TIMEOUT_SECS is not a number: '{}'", value))
            })?,
            Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let config = Config {
            vars_bucket: env::var("VARS_BUCKET").ok(),
            vars_blob: env::var("VARS_BLOB").ok(),
            remote_backend,
            remote_bucket: env::var("REMOTE_BUCKET").ok(),
            remote_region: env::var("REMOTE_REGION").ok(),
            remote_endpoint: env::var("REMOTE_ENDPOINT").ok(),
            local_store_path: env::var("LOCAL_STORE_PATH").ok(),
            error_report_url: env::var("ERROR_REPORT_URL").ok(),
            http_timeout_secs,
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration for a development run against a local filesystem store.
    pub fn local(path: impl Into<String>) -> Self {
        Config {
            vars_bucket: None,
            vars_blob: None,
            remote_backend: RemoteBackend::Local,
            remote_bucket: None,
            remote_region: None,
            remote_endpoint: None,
            local_store_path: Some(path.into()),
            error_report_url: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        match self.remote_backend {
            RemoteBackend::S3 => {
                if self.vars_bucket.is_none() || self.vars_blob.is_none() {
                    return Err(AppError::Config(
                        "VARS_BUCKET and VARS_BLOB must be set for the s3 backend".to_string(),
                    ));
                }
                if self.remote_bucket.is_none() {
                    return Err(AppError::Config(
                        "REMOTE_BUCKET must be set for the s3 backend".to_string(),
                    ));
                }
            }
            RemoteBackend::Local => {
                if self.local_store_path.is_none() {
                    return Err(AppError::Config(
                        "LOCAL_STORE_PATH must be set for the local backend".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn vars_bucket(&self) -> Option<&str> {
        self.vars_bucket.as_deref()
    }

    pub fn vars_blob(&self) -> Option<&str> {
        self.vars_blob.as_deref()
    }

    pub fn remote_backend(&self) -> RemoteBackend {
        self.remote_backend
    }

    pub fn remote_bucket(&self) -> Option<&str> {
        self.remote_bucket.as_deref()
    }

    pub fn remote_region(&self) -> Option<&str> {
        self.remote_region.as_deref()
    }

    pub fn remote_endpoint(&self) -> Option<&str> {
        self.remote_endpoint.as_deref()
    }

    pub fn local_store_path(&self) -> Option<&str> {
        self.local_store_path.as_deref()
    }

    pub fn error_report_url(&self) -> Option<&str> {
        self.error_report_url.as_deref()
    }

    pub fn http_timeout_secs(&self) -> u64 {
        self.http_timeout_secs
    }
}
