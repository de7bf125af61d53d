//! Directory manifests for path uploads.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use ss_core::ids::DataHash;
use ss_core::ports::RepositoryError;

/// One file inside an uploaded directory, addressed by its own data hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TreeEntry {
    pub path: String,
    pub data_hash: DataHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TreeManifest {
    pub entries: Vec<TreeEntry>,
}

impl TreeManifest {
    /// Hash of the manifest itself; entries are sorted so the hash is stable.
    pub fn data_hash(&self) -> Result<DataHash, RepositoryError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| RepositoryError::Io(format!("serialize manifest: {e}")))?;
        Ok(DataHash::from(hex::encode(Sha256::digest(&json))))
    }
}

/// Walks `root` and stores every regular file through `store_file`.
pub(crate) fn collect_tree<F>(root: &Path, mut store_file: F) -> Result<TreeManifest, RepositoryError>
where
    F: FnMut(&Path) -> Result<DataHash, RepositoryError>,
{
    let mut entries = Vec::new();
    walk(root, root, &mut store_file, &mut entries)?;
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(TreeManifest { entries })
}

fn walk<F>(
    root: &Path,
    dir: &Path,
    store_file: &mut F,
    entries: &mut Vec<TreeEntry>,
) -> Result<(), RepositoryError>
where
    F: FnMut(&Path) -> Result<DataHash, RepositoryError>,
{
    let read_dir = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
    for entry in read_dir {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_error(&path, e))?;
        if file_type.is_dir() {
            walk(root, &path, store_file, entries)?;
        } else if file_type.is_file() {
            let relative = path
                .strip_prefix(root)
                .map_err(|e| RepositoryError::Io(e.to_string()))?
                .to_string_lossy()
                .replace('\\', "/");
            let data_hash = store_file(&path)?;
            entries.push(TreeEntry {
                path: relative,
                data_hash,
            });
        }
    }
    Ok(())
}

pub(crate) fn io_error(path: &Path, err: io::Error) -> RepositoryError {
    match err.kind() {
        io::ErrorKind::NotFound => RepositoryError::NotFound(path.display().to_string()),
        _ => RepositoryError::Io(format!("{}: {err}", path.display())),
    }
}
