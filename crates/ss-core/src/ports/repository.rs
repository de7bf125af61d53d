use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::content::ByteStream;
use crate::ids::DataHash;

#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("no content stored under {0}")]
    NotFound(String),

    #[error("{0} addresses a directory")]
    NotAFile(String),

    #[error("storage transport failed: {0}")]
    Network(String),

    #[error("storage io failed: {0}")]
    Io(String),
}

/// Content-addressed storage backend (local node or remote storage proxy).
pub trait FileRepositoryPort: Send + Sync {
    /// Stores the stream and returns the content hash the backend assigned.
    fn add_byte_stream(&self, stream: ByteStream) -> Result<DataHash, RepositoryError>;

    /// Stores a file or directory tree found at `path`.
    fn add_path(&self, path: &Path) -> Result<DataHash, RepositoryError>;

    fn get_byte_stream(&self, data_hash: &DataHash) -> Result<ByteStream, RepositoryError>;
}

impl<T: FileRepositoryPort + ?Sized> FileRepositoryPort for Arc<T> {
    fn add_byte_stream(&self, stream: ByteStream) -> Result<DataHash, RepositoryError> {
        (**self).add_byte_stream(stream)
    }

    fn add_path(&self, path: &Path) -> Result<DataHash, RepositoryError> {
        (**self).add_path(path)
    }

    fn get_byte_stream(&self, data_hash: &DataHash) -> Result<ByteStream, RepositoryError> {
        (**self).get_byte_stream(data_hash)
    }
}
