use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::RwLock;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use ss_core::content::ByteStream;
use ss_core::ids::DataHash;
use ss_core::ports::{FileRepositoryPort, RepositoryError};
use tracing::debug_span;

use super::tree::{collect_tree, io_error, TreeManifest};

/// Process-local repository. Content lives as long as the repository does.
#[derive(Default)]
pub struct InMemoryFileRepository {
    blobs: RwLock<HashMap<DataHash, Bytes>>,
    trees: RwLock<HashMap<DataHash, TreeManifest>>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, data_hash: &DataHash) -> bool {
        self.blobs
            .read()
            .map(|blobs| blobs.contains_key(data_hash))
            .unwrap_or(false)
    }

    /// Overwrites stored bytes in place, leaving the hash unchanged. Test hook for
    /// simulating a backend that returns tampered content.
    pub fn replace_content(&self, data_hash: &DataHash, bytes: impl Into<Bytes>) {
        if let Ok(mut blobs) = self.blobs.write() {
            blobs.insert(data_hash.clone(), bytes.into());
        }
    }

    fn store(&self, bytes: Vec<u8>) -> Result<DataHash, RepositoryError> {
        let data_hash = DataHash::from(hex::encode(Sha256::digest(&bytes)));
        self.blobs
            .write()
            .map_err(|_| RepositoryError::Io("repository lock poisoned".to_string()))?
            .entry(data_hash.clone())
            .or_insert_with(|| Bytes::from(bytes));
        Ok(data_hash)
    }
}

impl FileRepositoryPort for InMemoryFileRepository {
    fn add_byte_stream(&self, mut stream: ByteStream) -> Result<DataHash, RepositoryError> {
        let span = debug_span!("infra.repository.memory.add_byte_stream");
        let _enter = span.enter();

        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .map_err(|e| RepositoryError::Io(format!("failed to read upload stream: {e}")))?;
        let size_bytes = bytes.len();
        let data_hash = self.store(bytes)?;
        tracing::debug!(data_hash = %data_hash, size_bytes, "Stored content");
        Ok(data_hash)
    }

    fn add_path(&self, path: &Path) -> Result<DataHash, RepositoryError> {
        let metadata = fs::metadata(path).map_err(|e| io_error(path, e))?;
        if !metadata.is_dir() {
            let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
            return self.store(bytes);
        }

        let manifest = collect_tree(path, |file| {
            let bytes = fs::read(file).map_err(|e| io_error(file, e))?;
            self.store(bytes)
        })?;
        let data_hash = manifest.data_hash()?;
        self.trees
            .write()
            .map_err(|_| RepositoryError::Io("repository lock poisoned".to_string()))?
            .insert(data_hash.clone(), manifest);
        Ok(data_hash)
    }

    fn get_byte_stream(&self, data_hash: &DataHash) -> Result<ByteStream, RepositoryError> {
        let is_tree = self
            .trees
            .read()
            .map_err(|_| RepositoryError::Io("repository lock poisoned".to_string()))?
            .contains_key(data_hash);
        if is_tree {
            return Err(RepositoryError::NotAFile(data_hash.to_string()));
        }

        let bytes = self
            .blobs
            .read()
            .map_err(|_| RepositoryError::Io("repository lock poisoned".to_string()))?
            .get(data_hash)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(data_hash.to_string()))?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}
