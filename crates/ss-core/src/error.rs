//! Error taxonomy for the upload/download pipelines.
//!
//! Every port error converts into [`StorageError`] so callers see one typed failure,
//! whichever stage raised it.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::ids::Digest;
use crate::ports::{LedgerError, RepositoryError};
use crate::privacy::PrivacyError;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Malformed parameter, caught before any network call.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("content source not found: {0}")]
    SourceNotFound(String),

    #[error("invalid content source: {0}")]
    InvalidSource(String),

    #[error("encryption failed: {0}")]
    EncryptionFailure(String),

    #[error("decryption failed: {0}")]
    DecryptionFailure(String),

    #[error("digest mismatch: expected {expected}, computed {actual}")]
    DigestMismatch { expected: Digest, actual: Digest },

    #[error("locator not found: {0}")]
    LocatorNotFound(String),

    #[error("content not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    /// Umbrella for any failure raised from the direct-download entry point.
    #[error("direct download failed: {0}")]
    DirectDownloadFailure(#[source] Box<StorageError>),
}

impl StorageError {
    /// True when the backend or network was unavailable, as opposed to content that
    /// cannot be produced or verified. Retrying is only meaningful for these.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Network(_) | StorageError::TimedOut(_) => true,
            StorageError::DirectDownloadFailure(cause) => cause.is_transient(),
            _ => false,
        }
    }

    /// Unwraps the direct-download umbrella to the stage error that caused it.
    pub fn root_cause(&self) -> &StorageError {
        match self {
            StorageError::DirectDownloadFailure(cause) => cause.root_cause(),
            other => other,
        }
    }

    pub fn into_direct_download_failure(self) -> StorageError {
        match self {
            already @ StorageError::DirectDownloadFailure(_) => already,
            other => StorageError::DirectDownloadFailure(Box::new(other)),
        }
    }

    /// Maps an I/O error raised while reading a pipeline stream.
    ///
    /// Stream adapters smuggle their typed failure through `io::Error::other`, so the
    /// original variant is recovered here when present.
    pub fn from_stream_error(err: io::Error) -> StorageError {
        if err.get_ref().is_some_and(|inner| inner.is::<StorageError>()) {
            if let Some(inner) = err.into_inner() {
                if let Ok(storage) = inner.downcast::<StorageError>() {
                    return *storage;
                }
            }
            return StorageError::Io("stream failed".to_string());
        }
        if err.get_ref().is_some_and(|inner| inner.is::<PrivacyError>()) {
            if let Some(inner) = err.into_inner() {
                if let Ok(privacy) = inner.downcast::<PrivacyError>() {
                    return (*privacy).into();
                }
            }
            return StorageError::DecryptionFailure("stream failed".to_string());
        }
        StorageError::Io(err.to_string())
    }
}

impl From<PrivacyError> for StorageError {
    fn from(err: PrivacyError) -> Self {
        match err {
            PrivacyError::Encryption(msg) => StorageError::EncryptionFailure(msg),
            PrivacyError::Decryption(msg) => StorageError::DecryptionFailure(msg),
            PrivacyError::InvalidKey(msg) => StorageError::Validation(msg),
        }
    }
}

impl From<RepositoryError> for StorageError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(hash) => StorageError::NotFound(hash),
            RepositoryError::NotAFile(hash) => {
                StorageError::InvalidSource(format!("{hash} is a directory, not a file"))
            }
            RepositoryError::Network(msg) => StorageError::Network(msg),
            RepositoryError::Io(msg) => StorageError::Io(msg),
        }
    }
}

impl From<LedgerError> for StorageError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(hash) => StorageError::LocatorNotFound(hash),
            LedgerError::InvalidHash(hash) => {
                StorageError::LocatorNotFound(format!("malformed transaction hash {hash}"))
            }
            LedgerError::InvalidPayload(msg) => StorageError::LocatorNotFound(msg),
            LedgerError::Rejected(msg) => StorageError::Validation(msg),
            LedgerError::Network(msg) => StorageError::Network(msg),
        }
    }
}

impl From<StorageError> for io::Error {
    fn from(err: StorageError) -> Self {
        io::Error::other(err)
    }
}
