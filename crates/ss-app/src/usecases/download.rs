use std::sync::Arc;

use ss_core::content::ByteStream;
use ss_core::error::StorageError;
use ss_core::ids::{DataHash, Digest};
use ss_core::ports::{DigestPort, FileRepositoryPort, PrivacyStrategy};
use tracing::debug;

use crate::deps::StorageDeps;

/// Download pipeline: optional validation fetch, then fetch and decrypt.
///
/// Validation drains a first fetch of the raw (still encrypted) bytes and drops
/// it; decryption only ever starts on a second fetch after validation passed.
pub struct DownloadUseCase {
    repository: Arc<dyn FileRepositoryPort>,
    digest: Arc<dyn DigestPort>,
}

impl DownloadUseCase {
    pub fn from_deps(deps: &StorageDeps) -> Self {
        Self {
            repository: deps.repository.clone(),
            digest: deps.digest.clone(),
        }
    }

    #[tracing::instrument(
        name = "usecase.download.execute",
        skip(self, privacy, expected_digest),
        fields(
            data_hash = %data_hash,
            privacy_type = %privacy.privacy_type(),
            validate_digest = expected_digest.is_some(),
        )
    )]
    pub fn execute(
        &self,
        data_hash: &DataHash,
        privacy: &dyn PrivacyStrategy,
        expected_digest: Option<&Digest>,
    ) -> Result<ByteStream, StorageError> {
        if data_hash.is_empty() {
            return Err(StorageError::Validation(
                "data hash must not be empty".to_string(),
            ));
        }

        if let Some(expected) = expected_digest {
            let mut raw = self.repository.get_byte_stream(data_hash)?;
            self.digest.validate(&mut raw, expected)?;
            debug!("Digest validated");
        }

        let raw = self.repository.get_byte_stream(data_hash)?;
        Ok(privacy.decrypt(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_support::*;
    use ss_core::ports::RepositoryError;
    use ss_core::privacy::{PlainPrivacyStrategy, PrivacyType};
    use ss_infra::{KdfParams, PasswordPrivacyStrategy};
    use std::io::{Cursor, Read};

    fn read_all(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn wrong_digest_aborts_before_decrypt() {
        let (mut deps, _, _) = memory_deps();
        let mut repo = MockRepository::new();
        repo.expect_get_byte_stream()
            .times(1)
            .returning(|_| Ok(Box::new(Cursor::new(b"ciphertext")) as ByteStream));
        deps.repository = Arc::new(repo);

        let mut privacy = MockPrivacy::new();
        privacy.expect_privacy_type().return_const(PrivacyType::Password);
        privacy.expect_decrypt().never();

        let wrong = Digest::from("00".repeat(32));
        let result = DownloadUseCase::from_deps(&deps).execute(
            &DataHash::from("hash"),
            &privacy,
            Some(&wrong),
        );

        assert!(matches!(result, Err(StorageError::DigestMismatch { .. })));
    }

    #[test]
    fn matching_digest_fetches_twice_then_decrypts() {
        let (mut deps, _, _) = memory_deps();
        let mut repo = MockRepository::new();
        repo.expect_get_byte_stream()
            .times(2)
            .returning(|_| Ok(Box::new(Cursor::new(b"hello")) as ByteStream));
        deps.repository = Arc::new(repo);

        let mut privacy = MockPrivacy::new();
        privacy.expect_privacy_type().return_const(PrivacyType::Plain);
        privacy.expect_decrypt().times(1).returning(Ok);

        let expected = Digest::from(
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
        );
        let stream = DownloadUseCase::from_deps(&deps)
            .execute(&DataHash::from("hash"), &privacy, Some(&expected))
            .unwrap();
        assert_eq!(read_all(stream), b"hello");
    }

    #[test]
    fn unknown_hash_is_not_found() {
        let (mut deps, _, _) = memory_deps();
        let mut repo = MockRepository::new();
        repo.expect_get_byte_stream()
            .returning(|hash| Err(RepositoryError::NotFound(hash.to_string())));
        deps.repository = Arc::new(repo);

        let result = DownloadUseCase::from_deps(&deps).execute(
            &DataHash::from("missing"),
            &PlainPrivacyStrategy::new(),
            None,
        );
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn password_mismatch_is_decryption_failure() {
        let (deps, repo, _) = memory_deps();
        let params = KdfParams {
            mem_kib: 32,
            iters: 1,
            parallelism: 1,
        };
        let pw1 = PasswordPrivacyStrategy::with_params("pw1", params).unwrap();
        let pw2 = PasswordPrivacyStrategy::with_params("pw2", params).unwrap();

        let hash = repo
            .add_byte_stream(pw1.encrypt(Box::new(Cursor::new(b"secret".to_vec()))).unwrap())
            .unwrap();

        let result = DownloadUseCase::from_deps(&deps).execute(&hash, &pw2, None);
        assert!(matches!(result, Err(StorageError::DecryptionFailure(_))));

        let plaintext = DownloadUseCase::from_deps(&deps)
            .execute(&hash, &pw1, None)
            .unwrap();
        assert_eq!(read_all(plaintext), b"secret");
    }

    #[test]
    fn empty_hash_is_rejected_before_fetch() {
        let (mut deps, _, _) = memory_deps();
        let mut repo = MockRepository::new();
        repo.expect_get_byte_stream().never();
        deps.repository = Arc::new(repo);

        let result = DownloadUseCase::from_deps(&deps).execute(
            &DataHash::from(""),
            &PlainPrivacyStrategy::new(),
            None,
        );
        assert!(matches!(result, Err(StorageError::Validation(_))));
    }
}
