use std::sync::Arc;

use ss_core::download::{DirectDownloadParameter, DirectDownloadResult, Locator};
use ss_core::error::StorageError;
use ss_core::ids::{DataHash, Digest, TransactionHash};
use ss_core::ports::{LedgerPort, PrivacyStrategy};
use ss_core::privacy::{PlainPrivacyStrategy, PrivacyType};
use tracing::{debug, info};

use super::download::DownloadUseCase;
use crate::deps::StorageDeps;

/// What a locator resolved to before any content is fetched.
struct ResolvedContent {
    data_hash: DataHash,
    recorded_privacy: Option<PrivacyType>,
    recorded_digest: Option<Digest>,
    content_type: Option<String>,
    is_directory: bool,
}

/// Direct-download pipeline: resolve, fetch, validate, decrypt, wrap.
///
/// Every failure surfaces as [`StorageError::DirectDownloadFailure`] carrying the cause.
pub struct DirectDownloadUseCase {
    ledger: Option<Arc<dyn LedgerPort>>,
    download: DownloadUseCase,
}

impl DirectDownloadUseCase {
    pub fn from_deps(deps: &StorageDeps) -> Self {
        Self {
            ledger: deps.ledger.clone(),
            download: DownloadUseCase::from_deps(deps),
        }
    }

    #[tracing::instrument(
        name = "usecase.direct_download.execute",
        skip(self, param),
        fields(locator = %param.locator(), validate_digest = param.validate_digest())
    )]
    pub fn execute(
        &self,
        param: &DirectDownloadParameter,
    ) -> Result<DirectDownloadResult, StorageError> {
        self.run(param)
            .map_err(StorageError::into_direct_download_failure)
    }

    fn run(&self, param: &DirectDownloadParameter) -> Result<DirectDownloadResult, StorageError> {
        // 1. Resolve the locator
        let resolved = self.resolve(param.locator())?;
        if resolved.is_directory {
            return Err(StorageError::InvalidSource(format!(
                "{} addresses a directory and cannot be downloaded as a file",
                resolved.data_hash
            )));
        }

        let privacy = resolve_privacy(param.privacy(), resolved.recorded_privacy)?;

        // A caller-supplied digest wins; a transaction's recorded digest is the fallback.
        let expected_digest = if param.validate_digest() {
            param.digest().or(resolved.recorded_digest.as_ref())
        } else {
            None
        };
        if param.validate_digest() && expected_digest.is_none() {
            debug!("Digest validation requested but no digest is available");
        }

        // 2-4. Fetch, validate, decrypt
        let stream = self.download.execute(
            &resolved.data_hash,
            &*privacy,
            expected_digest,
        )?;

        info!(
            data_hash = %resolved.data_hash,
            privacy_type = %privacy.privacy_type(),
            "Direct download ready"
        );

        // 5. Wrap for lazy materialization
        Ok(DirectDownloadResult::new(
            resolved.data_hash,
            privacy.privacy_type(),
            resolved.content_type,
            stream,
        ))
    }

    fn resolve(&self, locator: &Locator) -> Result<ResolvedContent, StorageError> {
        match locator {
            Locator::TransactionHash(hash) => self.resolve_transaction(hash),
            Locator::DataHash(hash) => {
                if hash.is_empty() {
                    return Err(StorageError::Validation(
                        "data hash must not be empty".to_string(),
                    ));
                }
                Ok(ResolvedContent {
                    data_hash: hash.clone(),
                    recorded_privacy: None,
                    recorded_digest: None,
                    content_type: None,
                    is_directory: false,
                })
            }
        }
    }

    fn resolve_transaction(&self, hash: &TransactionHash) -> Result<ResolvedContent, StorageError> {
        if !hash.is_well_formed() {
            return Err(StorageError::LocatorNotFound(format!(
                "malformed transaction hash {hash}"
            )));
        }
        let ledger = self.ledger.as_ref().ok_or_else(|| {
            StorageError::Validation(
                "a ledger is required to download by transaction hash".to_string(),
            )
        })?;

        let payload = ledger.resolve_transaction(hash)?;
        debug!(
            data_hash = %payload.data.data_hash,
            recorded_privacy = %payload.privacy_type,
            "Resolved transaction"
        );

        let is_directory = payload.data.is_directory();
        Ok(ResolvedContent {
            data_hash: payload.data.data_hash,
            recorded_privacy: Some(payload.privacy_type),
            recorded_digest: payload.data.digest,
            content_type: payload.data.content_type,
            is_directory,
        })
    }
}

/// Picks the strategy to decrypt with.
///
/// An explicit strategy wins unless it is a built-in type that contradicts the
/// recorded one. Without an explicit strategy only plain content can be decrypted,
/// since keyed strategies need caller secrets.
fn resolve_privacy(
    explicit: Option<&Arc<dyn PrivacyStrategy>>,
    recorded: Option<PrivacyType>,
) -> Result<Arc<dyn PrivacyStrategy>, StorageError> {
    match (explicit, recorded) {
        (Some(strategy), Some(recorded)) => {
            let supplied = strategy.privacy_type();
            if !matches!(supplied, PrivacyType::Custom(_)) && supplied != recorded {
                return Err(StorageError::Validation(format!(
                    "content was recorded with {recorded} privacy but a {supplied} strategy was supplied"
                )));
            }
            Ok(strategy.clone())
        }
        (Some(strategy), None) => Ok(strategy.clone()),
        (None, None) | (None, Some(PrivacyType::Plain)) => Ok(Arc::new(PlainPrivacyStrategy::new())),
        (None, Some(recorded)) => Err(StorageError::Validation(format!(
            "content is protected with {recorded} privacy; supply a matching strategy"
        ))),
    }
}
