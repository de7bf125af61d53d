use crate::content::{ByteStream, ContentMetadata, ContentSource};
use crate::error::StorageError;

/// Re-invocable producer of fresh streams over the same content.
pub trait StreamProducer: Send + Sync {
    fn open(&self) -> Result<ByteStream, StorageError>;
}

/// Result of normalizing a content source.
pub struct NormalizedContent {
    pub producer: Box<dyn StreamProducer>,
    /// Metadata implied by the source itself (file name, archive content type).
    pub defaults: ContentMetadata,
}

/// Turns any supported [`ContentSource`] into a stream producer.
///
/// Fails with `SourceNotFound` for missing paths and `InvalidSource` for directories
/// or sources that cannot be streamed (a `Path` upload).
pub trait ContentNormalizerPort: Send + Sync {
    fn normalize(&self, source: &ContentSource) -> Result<NormalizedContent, StorageError>;
}
