//! Remote storage abstraction for urlstash.
//!
//! This crate defines the `RemoteStore` trait the upload workflow drives, two
//! backends (an S3-compatible account and a local filesystem tree), the
//! credentials-blob loader, and a backend factory.
//!
//! # Entry addressing
//!
//! Folders are addressed by slash-separated paths relative to the account
//! root. `find_path` resolves a folder by its full path; `find` resolves an
//! entry by bare name, scanning the whole account and returning the first
//! match. The two lookup modes intentionally coexist; the workflow uses both.

pub mod factory;
#[cfg(feature = "store-local")]
pub mod local;
#[cfg(feature = "store-s3")]
pub mod s3;
pub mod traits;
#[cfg(feature = "store-s3")]
pub mod vars;

pub use factory::create_store;
#[cfg(feature = "store-local")]
pub use local::LocalStore;
#[cfg(feature = "store-s3")]
pub use s3::S3RemoteStore;
pub use traits::{EntryKind, RemoteEntry, RemoteStore, StoreError, StoreResult};
#[cfg(feature = "store-s3")]
pub use vars::load_credentials;
