//! Bundles a list of files into one zip archive backed by a temporary file.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use ss_core::content::ByteStream;
use ss_core::error::StorageError;
use ss_core::ports::StreamProducer;
use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::normalizer::{check_regular_file, open_file};

/// Archive written once; every `open` reads it again from the start.
pub(crate) struct ZipProducer {
    archive: NamedTempFile,
}

impl ZipProducer {
    pub(crate) fn build(paths: &[PathBuf]) -> Result<Self, StorageError> {
        if paths.is_empty() {
            return Err(StorageError::Validation(
                "at least one file is required for a zip upload".to_string(),
            ));
        }
        for path in paths {
            check_regular_file(path)?;
        }

        let archive = NamedTempFile::new()
            .map_err(|e| StorageError::Io(format!("failed to create temp archive: {e}")))?;
        let file = archive
            .reopen()
            .map_err(|e| StorageError::Io(format!("failed to open temp archive: {e}")))?;

        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        let mut seen = HashSet::new();

        for path in paths {
            let entry = entry_name(path)?;
            if !seen.insert(entry.clone()) {
                return Err(StorageError::InvalidSource(format!(
                    "duplicate archive entry {entry}"
                )));
            }

            writer
                .start_file(entry.as_str(), options)
                .map_err(|e| StorageError::Io(format!("failed to add {entry}: {e}")))?;
            let mut source = open_file(path)?;
            io::copy(&mut source, &mut writer)
                .map_err(|e| StorageError::Io(format!("failed to write {entry}: {e}")))?;
        }

        writer
            .finish()
            .map_err(|e| StorageError::Io(format!("failed to finish archive: {e}")))?;

        debug!(entries = paths.len(), "Built zip archive");
        Ok(Self { archive })
    }
}

fn entry_name(path: &Path) -> Result<String, StorageError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            StorageError::InvalidSource(format!("{} has no usable file name", path.display()))
        })
}

impl StreamProducer for ZipProducer {
    fn open(&self) -> Result<ByteStream, StorageError> {
        let file: File = self
            .archive
            .reopen()
            .map_err(|e| StorageError::Io(format!("failed to reopen archive: {e}")))?;
        Ok(Box::new(file))
    }
}
