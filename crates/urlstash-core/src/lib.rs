//! Core types for urlstash: configuration, error taxonomy, and the
//! event/payload models shared by the storage backends and the function crate.

pub mod config;
pub mod error;
pub mod payload;

pub use config::{Config, RemoteBackend};
pub use error::AppError;
pub use payload::{decode_payload, original_filename, Credentials, TriggerEvent, UploadRequest};
