//! Upload parameter object, its builder, and the upload result.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use url::Url;

use crate::content::{ByteStream, ContentMetadata, ContentSource};
use crate::credential::{parse_key_hex, Credential};
use crate::error::StorageError;
use crate::ids::{DataHash, Digest, TransactionHash};
use crate::payload::RecordedData;
use crate::ports::PrivacyStrategy;
use crate::privacy::{PlainPrivacyStrategy, PrivacyType};

/// Everything one upload needs. Immutable once built and consumed by a single upload.
#[derive(Clone)]
pub struct UploadParameter {
    source: ContentSource,
    credential: Credential,
    metadata: ContentMetadata,
    privacy: Arc<dyn PrivacyStrategy>,
    compute_digest: bool,
    recipient_public_key: Option<String>,
}

impl UploadParameter {
    pub fn for_bytes(bytes: impl Into<Bytes>, private_key: &str) -> UploadParameterBuilder {
        UploadParameterBuilder::new(ContentSource::Bytes(bytes.into()), private_key)
    }

    pub fn for_file(path: impl Into<PathBuf>, private_key: &str) -> UploadParameterBuilder {
        UploadParameterBuilder::new(ContentSource::File(path.into()), private_key)
    }

    pub fn for_url(url: Url, private_key: &str) -> UploadParameterBuilder {
        UploadParameterBuilder::new(ContentSource::Url(url), private_key)
    }

    pub fn for_stream<F>(factory: F, private_key: &str) -> UploadParameterBuilder
    where
        F: Fn() -> io::Result<ByteStream> + Send + Sync + 'static,
    {
        UploadParameterBuilder::new(ContentSource::Stream(Arc::new(factory)), private_key)
    }

    pub fn for_files_as_zip<I, P>(paths: I, private_key: &str) -> UploadParameterBuilder
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths = paths.into_iter().map(Into::into).collect();
        UploadParameterBuilder::new(ContentSource::FilesAsZip(paths), private_key)
    }

    pub fn for_string(text: impl Into<String>, private_key: &str) -> UploadParameterBuilder {
        UploadParameterBuilder::new(ContentSource::Text(text.into()), private_key)
    }

    pub fn for_path(path: impl Into<PathBuf>, private_key: &str) -> UploadParameterBuilder {
        UploadParameterBuilder::new(ContentSource::Path(path.into()), private_key)
    }

    pub fn source(&self) -> &ContentSource {
        &self.source
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn metadata(&self) -> &ContentMetadata {
        &self.metadata
    }

    pub fn privacy(&self) -> &Arc<dyn PrivacyStrategy> {
        &self.privacy
    }

    pub fn compute_digest(&self) -> bool {
        self.compute_digest
    }

    pub fn recipient_public_key(&self) -> Option<&str> {
        self.recipient_public_key.as_deref()
    }

    /// Checks the invariants the builder enforces. Cheap; the upload pipeline calls it again.
    pub fn validate(&self) -> Result<(), StorageError> {
        match &self.source {
            ContentSource::FilesAsZip(paths) if paths.is_empty() => {
                return Err(StorageError::Validation(
                    "at least one file is required for a zip upload".to_string(),
                ));
            }
            ContentSource::Path(_) => {
                if self.privacy.privacy_type() != PrivacyType::Plain {
                    return Err(StorageError::Validation(
                        "path uploads only support plain privacy".to_string(),
                    ));
                }
                if self.compute_digest {
                    return Err(StorageError::Validation(
                        "digest computation is not supported for path uploads".to_string(),
                    ));
                }
            }
            ContentSource::Url(url) if url.cannot_be_a_base() => {
                return Err(StorageError::Validation(format!(
                    "url {url} is not a fetchable resource"
                )));
            }
            _ => {}
        }

        if let Some(public_key) = &self.recipient_public_key {
            parse_key_hex(public_key).map_err(|reason| {
                StorageError::Validation(format!(
                    "recipient public key should be a valid key: {reason}"
                ))
            })?;
        }
        Ok(())
    }
}

impl fmt::Debug for UploadParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadParameter")
            .field("source", &self.source)
            .field("credential", &self.credential)
            .field("metadata", &self.metadata)
            .field("privacy_type", &self.privacy.privacy_type())
            .field("compute_digest", &self.compute_digest)
            .finish()
    }
}

/// Assembles an [`UploadParameter`]. The content source is fixed by the constructor,
/// so a parameter can never carry zero or two sources.
pub struct UploadParameterBuilder {
    source: ContentSource,
    private_key: String,
    metadata: ContentMetadata,
    privacy: Option<Arc<dyn PrivacyStrategy>>,
    compute_digest: bool,
    recipient_public_key: Option<String>,
}

impl UploadParameterBuilder {
    fn new(source: ContentSource, private_key: &str) -> Self {
        Self {
            source,
            private_key: private_key.to_string(),
            metadata: ContentMetadata::default(),
            privacy: None,
            compute_digest: false,
            recipient_public_key: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.metadata.content_type = Some(content_type.into());
        self
    }

    pub fn metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata.custom = Some(metadata);
        self
    }

    pub fn privacy_strategy(mut self, privacy: Arc<dyn PrivacyStrategy>) -> Self {
        self.privacy = Some(privacy);
        self
    }

    pub fn plain_privacy(mut self) -> Self {
        self.privacy = Some(Arc::new(PlainPrivacyStrategy::new()));
        self
    }

    pub fn compute_digest(mut self, compute_digest: bool) -> Self {
        self.compute_digest = compute_digest;
        self
    }

    pub fn recipient_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.recipient_public_key = Some(public_key.into());
        self
    }

    pub fn build(self) -> Result<UploadParameter, StorageError> {
        let credential = Credential::from_private_key(&self.private_key)?;
        let parameter = UploadParameter {
            source: self.source,
            credential,
            metadata: self.metadata,
            privacy: self
                .privacy
                .unwrap_or_else(|| Arc::new(PlainPrivacyStrategy::new())),
            compute_digest: self.compute_digest,
            recipient_public_key: self.recipient_public_key,
        };
        parameter.validate()?;
        Ok(parameter)
    }
}

/// Outcome of one upload. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Ledger record linking to the content, when the upload was recorded on a ledger.
    pub transaction_hash: Option<TransactionHash>,
    pub privacy_type: PrivacyType,
    pub version: String,
    pub data: RecordedData,
}

impl UploadResult {
    pub fn data_hash(&self) -> &DataHash {
        &self.data.data_hash
    }

    /// Present only when digest computation was requested.
    pub fn digest(&self) -> Option<&Digest> {
        self.data.digest.as_ref()
    }
}
