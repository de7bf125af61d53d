//! # ss-core
//!
//! Core domain models and ports for the Sirius storage SDK.
//!
//! This crate contains the upload/download vocabulary (sources, parameters,
//! results, payloads, errors) and the ports adapters implement. It performs no I/O
//! of its own beyond reading streams handed to it.

// Public module exports
pub mod config;
pub mod content;
pub mod credential;
pub mod download;
pub mod error;
pub mod ids;
pub mod payload;
pub mod ports;
pub mod privacy;
pub mod upload;

// Re-export commonly used types at the crate root
pub use config::ClientConfig;
pub use content::{ByteStream, ContentMetadata, ContentSource, StreamFactory};
pub use credential::Credential;
pub use download::{DirectDownloadParameter, DirectDownloadResult, Locator};
pub use error::StorageError;
pub use ids::{DataHash, Digest, TransactionHash};
pub use payload::{MessagePayload, RecordedData};
pub use privacy::{PlainPrivacyStrategy, PrivacyError, PrivacyType};
pub use upload::{UploadParameter, UploadResult};
