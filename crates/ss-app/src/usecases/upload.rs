use std::path::Path;
use std::sync::Arc;

use ss_core::content::{ContentMetadata, ContentSource, PATH_UPLOAD_CONTENT_TYPE};
use ss_core::error::StorageError;
use ss_core::ids::{DataHash, Digest, TransactionHash};
use ss_core::payload::{MessagePayload, RecordedData};
use ss_core::ports::{
    ClockPort, ContentNormalizerPort, DigestPort, FileRepositoryPort, LedgerPort,
    NormalizedContent, RepositoryError,
};
use ss_core::upload::{UploadParameter, UploadResult};
use tracing::{debug, info};

use super::stream_capture::StreamErrorSlot;
use crate::deps::StorageDeps;

/// Upload pipeline: normalize, optionally digest, encrypt, store, record.
///
/// Within one invocation the digest pass happens-before the storing pass, and
/// encryption happens-before the store call. The digest describes the bytes of the
/// digest pass; for randomized strategies the stored ciphertext is a second,
/// independently valid encryption.
pub struct UploadUseCase {
    repository: Arc<dyn FileRepositoryPort>,
    ledger: Option<Arc<dyn LedgerPort>>,
    normalizer: Arc<dyn ContentNormalizerPort>,
    digest: Arc<dyn DigestPort>,
    clock: Arc<dyn ClockPort>,
}

impl UploadUseCase {
    pub fn from_deps(deps: &StorageDeps) -> Self {
        Self {
            repository: deps.repository.clone(),
            ledger: deps.ledger.clone(),
            normalizer: deps.normalizer.clone(),
            digest: deps.digest.clone(),
            clock: deps.clock.clone(),
        }
    }

    #[tracing::instrument(
        name = "usecase.upload.execute",
        skip(self, param),
        fields(
            source = param.source().kind(),
            privacy_type = %param.privacy().privacy_type(),
            compute_digest = param.compute_digest(),
        )
    )]
    pub fn execute(&self, param: &UploadParameter) -> Result<UploadResult, StorageError> {
        // 1. Validate before touching any collaborator
        param.validate()?;

        // 2-4. Produce, digest and store
        let (data_hash, digest, defaults) = match param.source() {
            ContentSource::Path(path) => self.store_path(path)?,
            source => {
                let normalized = self.normalizer.normalize(source)?;
                self.store_stream(param, normalized)?
            }
        };

        // 5. Assemble the record; caller metadata wins over source defaults
        let metadata = param.metadata().clone().or_defaults(&defaults);
        let privacy_type = param.privacy().privacy_type();
        let data = RecordedData::new(data_hash, digest, metadata, self.clock.now_ms());
        let payload = MessagePayload::new(privacy_type, data);

        // 6. Announce on the ledger when one is wired
        let transaction_hash = self.record(param, &payload)?;

        info!(
            data_hash = %payload.data.data_hash,
            transaction_hash = transaction_hash.as_ref().map(|h| h.as_str()),
            "Upload completed"
        );
        Ok(UploadResult {
            transaction_hash,
            privacy_type,
            version: payload.version,
            data: payload.data,
        })
    }

    fn store_stream(
        &self,
        param: &UploadParameter,
        normalized: NormalizedContent,
    ) -> Result<(DataHash, Option<Digest>, ContentMetadata), StorageError> {
        let privacy = param.privacy();

        let digest = if param.compute_digest() {
            let mut encrypted = privacy.encrypt(normalized.producer.open()?)?;
            let digest = self.digest.digest(&mut encrypted)?;
            debug!(digest = %digest, "Computed upload digest");
            Some(digest)
        } else {
            None
        };

        let slot = StreamErrorSlot::default();
        let encrypted = privacy.encrypt(normalized.producer.open()?)?;
        let data_hash = self
            .repository
            .add_byte_stream(slot.wrap(encrypted))
            .map_err(|e| slot.take().unwrap_or_else(|| StorageError::from(e)))?;

        if data_hash.is_empty() {
            return Err(StorageError::Io(
                "storage backend returned an empty data hash".to_string(),
            ));
        }
        Ok((data_hash, digest, normalized.defaults))
    }

    fn store_path(
        &self,
        path: &Path,
    ) -> Result<(DataHash, Option<Digest>, ContentMetadata), StorageError> {
        let data_hash = self.repository.add_path(path).map_err(|e| match e {
            RepositoryError::NotFound(_) => {
                StorageError::SourceNotFound(path.display().to_string())
            }
            other => other.into(),
        })?;

        let defaults = ContentMetadata {
            name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            content_type: Some(PATH_UPLOAD_CONTENT_TYPE.to_string()),
            ..Default::default()
        };
        Ok((data_hash, None, defaults))
    }

    fn record(
        &self,
        param: &UploadParameter,
        payload: &MessagePayload,
    ) -> Result<Option<TransactionHash>, StorageError> {
        let Some(ledger) = &self.ledger else {
            return Ok(None);
        };
        let hash = ledger.record(param.credential(), param.recipient_public_key(), payload)?;
        Ok(Some(hash))
    }
}
