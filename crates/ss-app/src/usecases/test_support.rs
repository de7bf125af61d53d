//! Shared fixtures for use case tests.

use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use ss_core::content::ByteStream;
use ss_core::ids::DataHash;
use ss_core::ports::{ClockPort, FileRepositoryPort, PrivacyStrategy, RepositoryError};
use ss_core::privacy::{PrivacyError, PrivacyType};
use ss_infra::{ContentNormalizer, InMemoryFileRepository, InMemoryLedger, Sha256Digester};

use crate::deps::StorageDeps;

pub(crate) const KEY: &str = "4f3c2a1b4f3c2a1b4f3c2a1b4f3c2a1b4f3c2a1b4f3c2a1b4f3c2a1b4f3c2a1b";
pub(crate) const FIXED_NOW_MS: i64 = 1_700_000_000_000;

pub(crate) struct FixedClock;

impl ClockPort for FixedClock {
    fn now_ms(&self) -> i64 {
        FIXED_NOW_MS
    }
}

/// Reader whose every read fails the way a broken cipher stream does.
pub(crate) struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other(PrivacyError::Encryption(
            "cipher failed mid-stream".to_string(),
        )))
    }
}

/// Deps backed by the in-memory repository and ledger.
pub(crate) fn memory_deps() -> (StorageDeps, Arc<InMemoryFileRepository>, Arc<InMemoryLedger>) {
    let repository = Arc::new(InMemoryFileRepository::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let deps = StorageDeps {
        repository: repository.clone(),
        ledger: Some(ledger.clone()),
        normalizer: Arc::new(ContentNormalizer::default()),
        digest: Arc::new(Sha256Digester),
        clock: Arc::new(FixedClock),
    };
    (deps, repository, ledger)
}

mockall::mock! {
    pub Privacy {}

    impl PrivacyStrategy for Privacy {
        fn privacy_type(&self) -> PrivacyType;
        fn encrypt(&self, stream: ByteStream) -> Result<ByteStream, PrivacyError>;
        fn decrypt(&self, stream: ByteStream) -> Result<ByteStream, PrivacyError>;
    }
}

mockall::mock! {
    pub Repository {}

    impl FileRepositoryPort for Repository {
        fn add_byte_stream(&self, stream: ByteStream) -> Result<DataHash, RepositoryError>;
        fn add_path(&self, path: &Path) -> Result<DataHash, RepositoryError>;
        fn get_byte_stream(&self, data_hash: &DataHash) -> Result<ByteStream, RepositoryError>;
    }
}
