//! Download facade
//! 下载门面

use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use ss_core::content::ByteStream;
use ss_core::download::{DirectDownloadParameter, DirectDownloadResult};
use ss_core::error::StorageError;
use ss_core::ids::{DataHash, Digest};
use ss_core::ports::PrivacyStrategy;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::deps::StorageDeps;
use crate::tasks::{AsyncCallbacks, AsyncTask, TaskRunner};
use crate::usecases::{DirectDownloadUseCase, DownloadUseCase};

/// Entry point for downloads by data hash and for direct downloads.
#[derive(Clone)]
pub struct Downloader {
    download: Arc<DownloadUseCase>,
    direct_download: Arc<DirectDownloadUseCase>,
    runner: Arc<TaskRunner>,
}

impl Downloader {
    pub fn new(deps: &StorageDeps, runner: Arc<TaskRunner>) -> Self {
        Self {
            download: Arc::new(DownloadUseCase::from_deps(deps)),
            direct_download: Arc::new(DirectDownloadUseCase::from_deps(deps)),
            runner,
        }
    }

    /// Fetches and decrypts `data_hash`, validating against `expected_digest` first.
    pub fn download(
        &self,
        data_hash: &DataHash,
        privacy: &dyn PrivacyStrategy,
        expected_digest: Option<&Digest>,
    ) -> Result<ByteStream, StorageError> {
        self.download.execute(data_hash, privacy, expected_digest)
    }

    pub fn download_bytes(
        &self,
        data_hash: &DataHash,
        privacy: &dyn PrivacyStrategy,
        expected_digest: Option<&Digest>,
    ) -> Result<Bytes, StorageError> {
        let stream = self.download(data_hash, privacy, expected_digest)?;
        read_to_bytes(stream)
    }

    /// Streams the plaintext into `path`, returning the number of bytes written.
    ///
    /// The plaintext is staged next to `path` and only moved into place once the
    /// whole stream decrypted; on failure `path` is left untouched.
    pub fn download_to_file(
        &self,
        data_hash: &DataHash,
        privacy: &dyn PrivacyStrategy,
        expected_digest: Option<&Digest>,
        path: &Path,
    ) -> Result<u64, StorageError> {
        let mut stream = self.download(data_hash, privacy, expected_digest)?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(parent)
            .map_err(|e| StorageError::Io(format!("stage in {}: {e}", parent.display())))?;
        let written = io::copy(&mut stream, staged.as_file_mut())
            .map_err(StorageError::from_stream_error)?;
        staged
            .persist(path)
            .map_err(|e| StorageError::Io(format!("persist {}: {}", path.display(), e.error)))?;

        debug!(path = %path.display(), size_bytes = written, "Download saved");
        Ok(written)
    }

    /// Schedules a download whose plaintext is materialized on the worker.
    pub fn download_async(
        &self,
        data_hash: DataHash,
        privacy: Arc<dyn PrivacyStrategy>,
        expected_digest: Option<Digest>,
        callbacks: AsyncCallbacks<Bytes>,
    ) -> AsyncTask<Bytes> {
        let download = self.download.clone();
        self.runner.spawn(
            move || {
                let stream = download.execute(&data_hash, &*privacy, expected_digest.as_ref())?;
                read_to_bytes(stream)
            },
            callbacks,
        )
    }

    pub fn direct_download(
        &self,
        param: &DirectDownloadParameter,
    ) -> Result<DirectDownloadResult, StorageError> {
        self.direct_download.execute(param)
    }

    pub fn direct_download_async(
        &self,
        param: DirectDownloadParameter,
        callbacks: AsyncCallbacks<DirectDownloadResult>,
    ) -> AsyncTask<DirectDownloadResult> {
        let direct_download = self.direct_download.clone();
        self.runner.spawn_mapped(
            move || direct_download.execute(&param),
            StorageError::into_direct_download_failure,
            callbacks,
        )
    }
}

fn read_to_bytes(mut stream: ByteStream) -> Result<Bytes, StorageError> {
    let mut buf = Vec::new();
    stream
        .read_to_end(&mut buf)
        .map_err(StorageError::from_stream_error)?;
    Ok(Bytes::from(buf))
}
