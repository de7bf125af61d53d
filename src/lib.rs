//! Sirius storage SDK
//!
//! Uploads content to a content-addressed storage backend, records it on a
//! ledger and downloads it back, optionally encrypted with a pluggable
//! privacy strategy.
//!
//! ```ignore
//! use sirius_storage::{bootstrap, UploadParameter};
//!
//! let client = bootstrap::build_client(&bootstrap::load_config("sirius.toml")?)?;
//! let result = client
//!     .uploader()
//!     .upload(&UploadParameter::for_string("hello", private_key).build()?)?;
//! ```

pub mod bootstrap;

// 重新导出常用类型
pub use ss_app::{AsyncCallbacks, AsyncTask, Downloader, StorageDeps, TaskRunner, Uploader};
pub use ss_core::{
    ClientConfig, ContentMetadata, ContentSource, DataHash, DirectDownloadParameter,
    DirectDownloadResult, Digest, Locator, PlainPrivacyStrategy, PrivacyType, StorageError,
    TransactionHash, UploadParameter, UploadResult,
};
pub use ss_core::ports::PrivacyStrategy;
pub use ss_infra::{KdfParams, KeysPrivacyStrategy, PasswordPrivacyStrategy};
