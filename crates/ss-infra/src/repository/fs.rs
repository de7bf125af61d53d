use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use ss_core::content::ByteStream;
use ss_core::ids::DataHash;
use ss_core::ports::{FileRepositoryPort, RepositoryError};
use tempfile::NamedTempFile;
use tracing::{debug, debug_span};

use super::tree::{collect_tree, io_error, TreeManifest};

const BLOBS_DIR: &str = "blobs";
const TREES_DIR: &str = "trees";
const STAGING_DIR: &str = "staging";
const BLOB_DATA_FILE_NAME: &str = "data.bin";
const TREE_FILE_NAME: &str = "tree.json";
const COPY_BUF_SIZE: usize = 64 * 1024;

/// Content-addressed directory store.
///
/// Layout under `root`:
/// `blobs/<data_hash>/data.bin` for content and `trees/<data_hash>/tree.json`
/// for directory manifests. Uploads are staged in `staging/` and moved into
/// place once their hash is known.
pub struct FsFileRepository {
    root: PathBuf,
}

impl FsFileRepository {
    /// Create a new FsFileRepository rooted at the given filesystem path.
    ///
    /// Directories are created on first write.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn blob_path(&self, data_hash: &DataHash) -> PathBuf {
        self.root
            .join(BLOBS_DIR)
            .join(data_hash.as_str())
            .join(BLOB_DATA_FILE_NAME)
    }

    fn tree_path(&self, data_hash: &DataHash) -> PathBuf {
        self.root
            .join(TREES_DIR)
            .join(data_hash.as_str())
            .join(TREE_FILE_NAME)
    }

    fn store_stream(&self, stream: &mut dyn Read) -> Result<DataHash, RepositoryError> {
        let staging = self.root.join(STAGING_DIR);
        fs::create_dir_all(&staging).map_err(|e| io_error(&staging, e))?;
        let mut staged = NamedTempFile::new_in(&staging).map_err(|e| io_error(&staging, e))?;

        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; COPY_BUF_SIZE];
        let mut size_bytes = 0u64;
        loop {
            let n = match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(RepositoryError::Io(format!(
                        "failed to read upload stream: {e}"
                    )))
                }
            };
            hasher.update(&buf[..n]);
            staged
                .write_all(&buf[..n])
                .map_err(|e| io_error(staged.path(), e))?;
            size_bytes += n as u64;
        }
        staged.flush().map_err(|e| io_error(staged.path(), e))?;

        let data_hash = DataHash::from(hex::encode(hasher.finalize()));
        let target = self.blob_path(&data_hash);
        if target.exists() {
            debug!(data_hash = %data_hash, "Content already stored");
            return Ok(data_hash);
        }

        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }
        staged
            .persist(&target)
            .map_err(|e| io_error(&target, e.error))?;

        debug!(data_hash = %data_hash, size_bytes, "Stored content");
        Ok(data_hash)
    }

    fn store_file(&self, path: &Path) -> Result<DataHash, RepositoryError> {
        let mut file = File::open(path).map_err(|e| io_error(path, e))?;
        self.store_stream(&mut file)
    }

    fn store_tree(&self, manifest: &TreeManifest) -> Result<DataHash, RepositoryError> {
        let data_hash = manifest.data_hash()?;
        let path = self.tree_path(&data_hash);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }
        let json = serde_json::to_vec_pretty(manifest)
            .map_err(|e| RepositoryError::Io(format!("serialize manifest: {e}")))?;
        fs::write(&path, json).map_err(|e| io_error(&path, e))?;
        Ok(data_hash)
    }
}

/// Hashes this store issues are 64 lowercase hex characters; anything else
/// cannot name stored content and must not be joined into a path.
fn validate_data_hash(data_hash: &DataHash) -> Result<(), RepositoryError> {
    let s = data_hash.as_str();
    if s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        Ok(())
    } else {
        Err(RepositoryError::NotFound(s.to_string()))
    }
}

impl FileRepositoryPort for FsFileRepository {
    fn add_byte_stream(&self, mut stream: ByteStream) -> Result<DataHash, RepositoryError> {
        let span = debug_span!("infra.repository.fs.add_byte_stream", root = %self.root.display());
        let _enter = span.enter();
        self.store_stream(&mut stream)
    }

    fn add_path(&self, path: &Path) -> Result<DataHash, RepositoryError> {
        let span = debug_span!("infra.repository.fs.add_path", path = %path.display());
        let _enter = span.enter();

        let metadata = fs::metadata(path).map_err(|e| io_error(path, e))?;
        if !metadata.is_dir() {
            return self.store_file(path);
        }
        let manifest = collect_tree(path, |file| self.store_file(file))?;
        self.store_tree(&manifest)
    }

    fn get_byte_stream(&self, data_hash: &DataHash) -> Result<ByteStream, RepositoryError> {
        validate_data_hash(data_hash)?;
        if self.tree_path(data_hash).exists() {
            return Err(RepositoryError::NotAFile(data_hash.to_string()));
        }
        let path = self.blob_path(data_hash);
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RepositoryError::NotFound(data_hash.to_string()),
            _ => io_error(&path, e),
        })?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn read(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn stores_under_content_hash() {
        let dir = tempdir().unwrap();
        let repo = FsFileRepository::new(dir.path().to_path_buf());

        let hash = repo
            .add_byte_stream(Box::new(Cursor::new(b"hello".to_vec())))
            .unwrap();

        assert_eq!(
            hash.as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert!(dir
            .path()
            .join(BLOBS_DIR)
            .join(hash.as_str())
            .join(BLOB_DATA_FILE_NAME)
            .exists());
        assert_eq!(read(repo.get_byte_stream(&hash).unwrap()), b"hello");
    }

    #[test]
    fn storing_twice_is_idempotent() {
        let dir = tempdir().unwrap();
        let repo = FsFileRepository::new(dir.path().to_path_buf());

        let a = repo.add_byte_stream(Box::new(Cursor::new(b"x".to_vec()))).unwrap();
        let b = repo.add_byte_stream(Box::new(Cursor::new(b"x".to_vec()))).unwrap();

        assert_eq!(a, b);
        let staged = fs::read_dir(dir.path().join(STAGING_DIR)).unwrap().count();
        assert_eq!(staged, 0);
    }

    #[test]
    fn malformed_hash_is_not_found() {
        let dir = tempdir().unwrap();
        let repo = FsFileRepository::new(dir.path().to_path_buf());

        let result = repo.get_byte_stream(&DataHash::from("../../etc/passwd"));
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[test]
    fn unknown_hash_is_not_found() {
        let dir = tempdir().unwrap();
        let repo = FsFileRepository::new(dir.path().to_path_buf());

        let result = repo.get_byte_stream(&DataHash::from("a".repeat(64)));
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[test]
    fn add_path_stores_directory_manifest() {
        let source = tempdir().unwrap();
        fs::write(source.path().join("one.txt"), b"1").unwrap();
        fs::create_dir(source.path().join("nested")).unwrap();
        fs::write(source.path().join("nested/two.txt"), b"2").unwrap();

        let store = tempdir().unwrap();
        let repo = FsFileRepository::new(store.path().to_path_buf());
        let hash = repo.add_path(source.path()).unwrap();

        assert!(matches!(
            repo.get_byte_stream(&hash),
            Err(RepositoryError::NotAFile(_))
        ));

        let manifest: TreeManifest =
            serde_json::from_slice(&fs::read(repo.tree_path(&hash)).unwrap()).unwrap();
        let paths: Vec<_> = manifest.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["nested/two.txt", "one.txt"]);
    }

    #[test]
    fn add_path_on_a_file_stores_the_file() {
        let source = tempdir().unwrap();
        let file = source.path().join("single.txt");
        fs::write(&file, b"single").unwrap();

        let store = tempdir().unwrap();
        let repo = FsFileRepository::new(store.path().to_path_buf());
        let hash = repo.add_path(&file).unwrap();

        assert_eq!(read(repo.get_byte_stream(&hash).unwrap()), b"single");
    }
}
