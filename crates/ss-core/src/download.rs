//! Direct-download parameter object and the lazily materialized result handle.

use std::fmt;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::content::ByteStream;
use crate::credential::Credential;
use crate::error::StorageError;
use crate::ids::{DataHash, Digest, TransactionHash};
use crate::ports::PrivacyStrategy;
use crate::privacy::{PlainPrivacyStrategy, PrivacyType};

/// Where the content to download lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Ledger record whose message payload names the content.
    TransactionHash(TransactionHash),
    DataHash(DataHash),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::TransactionHash(hash) => write!(f, "transaction:{hash}"),
            Locator::DataHash(hash) => write!(f, "data:{hash}"),
        }
    }
}

#[derive(Clone)]
pub struct DirectDownloadParameter {
    locator: Locator,
    credential: Option<Credential>,
    validate_digest: bool,
    privacy: Option<Arc<dyn PrivacyStrategy>>,
    digest: Option<Digest>,
}

impl DirectDownloadParameter {
    /// Digest validation is off by default; the recorded digest is used once enabled.
    pub fn from_transaction_hash(
        hash: impl Into<TransactionHash>,
    ) -> DirectDownloadParameterBuilder {
        DirectDownloadParameterBuilder::new(Locator::TransactionHash(hash.into()), None, false)
    }

    /// Digest validation is on by default and checks against `digest` when one is given.
    pub fn from_data_hash(
        hash: impl Into<DataHash>,
        digest: Option<Digest>,
    ) -> DirectDownloadParameterBuilder {
        DirectDownloadParameterBuilder::new(Locator::DataHash(hash.into()), digest, true)
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn validate_digest(&self) -> bool {
        self.validate_digest
    }

    pub fn privacy(&self) -> Option<&Arc<dyn PrivacyStrategy>> {
        self.privacy.as_ref()
    }

    pub fn digest(&self) -> Option<&Digest> {
        self.digest.as_ref()
    }
}

impl fmt::Debug for DirectDownloadParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectDownloadParameter")
            .field("locator", &self.locator)
            .field("credential", &self.credential)
            .field("validate_digest", &self.validate_digest)
            .field(
                "privacy_type",
                &self.privacy.as_ref().map(|privacy| privacy.privacy_type()),
            )
            .field("digest", &self.digest)
            .finish()
    }
}

pub struct DirectDownloadParameterBuilder {
    locator: Locator,
    private_key: Option<String>,
    validate_digest: bool,
    privacy: Option<Arc<dyn PrivacyStrategy>>,
    digest: Option<Digest>,
}

impl DirectDownloadParameterBuilder {
    fn new(locator: Locator, digest: Option<Digest>, validate_digest: bool) -> Self {
        Self {
            locator,
            private_key: None,
            validate_digest,
            privacy: None,
            digest,
        }
    }

    pub fn credential(mut self, private_key: &str) -> Self {
        self.private_key = Some(private_key.to_string());
        self
    }

    pub fn validate_digest(mut self, validate_digest: bool) -> Self {
        self.validate_digest = validate_digest;
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

    pub fn build(self) -> Result<DirectDownloadParameter, StorageError> {
        let credential = self
            .private_key
            .as_deref()
            .map(Credential::from_private_key)
            .transpose()?;

        Ok(DirectDownloadParameter {
            locator: self.locator,
            credential,
            validate_digest: self.validate_digest,
            privacy: self.privacy,
            digest: self.digest,
        })
    }
}

struct LazyContent {
    stream: Option<ByteStream>,
    cached: Option<Bytes>,
}

/// Handle over decrypted content. Clones share the same underlying stream,
/// and the first materialization is cached for every clone.
#[derive(Clone)]
pub struct DirectDownloadResult {
    data_hash: DataHash,
    privacy_type: PrivacyType,
    content_type: Option<String>,
    content: Arc<Mutex<LazyContent>>,
}

impl DirectDownloadResult {
    pub fn new(
        data_hash: DataHash,
        privacy_type: PrivacyType,
        content_type: Option<String>,
        stream: ByteStream,
    ) -> Self {
        Self {
            data_hash,
            privacy_type,
            content_type,
            content: Arc::new(Mutex::new(LazyContent {
                stream: Some(stream),
                cached: None,
            })),
        }
    }

    pub fn data_hash(&self) -> &DataHash {
        &self.data_hash
    }

    /// The strategy actually used to decrypt, after resolution against the ledger record.
    pub fn privacy_type(&self) -> PrivacyType {
        self.privacy_type
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_as_bytes(&self) -> Result<Bytes, StorageError> {
        let mut content = self.content.lock().map_err(|_| {
            StorageError::Io("download content lock poisoned".to_string())
                .into_direct_download_failure()
        })?;
        materialize(&mut content)
    }

    pub fn content_as_string(&self) -> Result<String, StorageError> {
        let bytes = self.content_as_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            StorageError::Validation(format!("downloaded content is not valid UTF-8: {e}"))
                .into_direct_download_failure()
        })
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        let bytes = self.content_as_bytes()?;
        fs::write(path, &bytes).map_err(|e| {
            StorageError::Io(format!("write {}: {e}", path.display())).into_direct_download_failure()
        })
    }

    /// Streams the content. When this is the last handle and nothing was
    /// materialized yet, the decrypted stream is handed over without buffering.
    pub fn into_stream(self) -> Result<ByteStream, StorageError> {
        let sole_owner = Arc::strong_count(&self.content) == 1;
        let mut content = self.content.lock().map_err(|_| {
            StorageError::Io("download content lock poisoned".to_string())
                .into_direct_download_failure()
        })?;

        if let Some(cached) = &content.cached {
            return Ok(Box::new(Cursor::new(cached.clone())));
        }
        if sole_owner {
            if let Some(stream) = content.stream.take() {
                return Ok(stream);
            }
        }
        let bytes = materialize(&mut content)?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}

fn materialize(content: &mut LazyContent) -> Result<Bytes, StorageError> {
    if let Some(cached) = &content.cached {
        return Ok(cached.clone());
    }
    let mut stream = content.stream.take().ok_or_else(|| {
        StorageError::Validation("download content was already consumed".to_string())
            .into_direct_download_failure()
    })?;

    let mut buf = Vec::new();
    stream
        .read_to_end(&mut buf)
        .map_err(|e| StorageError::from_stream_error(e).into_direct_download_failure())?;

    let bytes = Bytes::from(buf);
    content.cached = Some(bytes.clone());
    Ok(bytes)
}

impl fmt::Debug for DirectDownloadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectDownloadResult")
            .field("data_hash", &self.data_hash)
            .field("privacy_type", &self.privacy_type)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}
