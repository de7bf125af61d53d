//! Client wiring
//! 客户端装配
//!
//! Turns a [`ClientConfig`] into concrete adapters and hands them to the facades.

use std::sync::Arc;

use anyhow::{bail, Context};
use ss_app::{Downloader, StorageDeps, TaskRunner, Uploader};
use ss_core::config::ClientConfig;
use ss_core::ports::FileRepositoryPort;
use ss_infra::content::NormalizerConfig;
use ss_infra::{
    ContentNormalizer, FsFileRepository, InMemoryFileRepository, InMemoryLedger, KdfParams,
    PasswordPrivacyStrategy, Sha256Digester, SystemClock,
};
use tracing::info;

/// Wired storage client: upload and download facades sharing one task runner.
#[derive(Clone)]
pub struct StorageClient {
    uploader: Uploader,
    downloader: Downloader,
    kdf: KdfParams,
}

impl StorageClient {
    pub fn uploader(&self) -> &Uploader {
        &self.uploader
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Password strategy using the KDF cost from the client configuration.
    pub fn password_strategy(
        &self,
        password: impl Into<String>,
    ) -> anyhow::Result<PasswordPrivacyStrategy> {
        PasswordPrivacyStrategy::with_params(password, self.kdf)
            .context("Failed to build password privacy strategy")
    }
}

/// Build a [`StorageClient`] from configuration
///
/// `storage.kind` selects the repository: `memory` or `fs` (rooted at `storage.root`).
/// The ledger is always the in-process one, even over `fs`: blobs outlive the
/// process but transaction hashes do not. A later client over the same root can
/// still download by data hash, while resolving an earlier transaction hash fails
/// with [`StorageError::LocatorNotFound`](ss_core::StorageError::LocatorNotFound).
///
/// Must not be called from inside an async context when the client owns its
/// runtime; the runtime is created here.
pub fn build_client(config: &ClientConfig) -> anyhow::Result<StorageClient> {
    let repository: Arc<dyn FileRepositoryPort> = match config.storage_kind.as_str() {
        "memory" => Arc::new(InMemoryFileRepository::new()),
        "fs" => {
            if config.storage_root.as_os_str().is_empty() {
                bail!("storage.root is required for the fs storage kind");
            }
            Arc::new(FsFileRepository::new(config.storage_root.clone()))
        }
        other => bail!("Unknown storage kind: {other}"),
    };

    let deps = StorageDeps {
        repository,
        ledger: Some(Arc::new(InMemoryLedger::new())),
        normalizer: Arc::new(ContentNormalizer::new(NormalizerConfig::from_config(config))),
        digest: Arc::new(Sha256Digester),
        clock: Arc::new(SystemClock),
    };

    let runner = Arc::new(
        TaskRunner::new(config.worker_threads).context("Failed to start task runner")?,
    );

    info!(
        storage_kind = %config.storage_kind,
        worker_threads = config.worker_threads,
        "Storage client ready"
    );

    Ok(StorageClient {
        uploader: Uploader::new(&deps, runner.clone()),
        downloader: Downloader::new(&deps, runner),
        kdf: KdfParams::from_config(config),
    })
}
