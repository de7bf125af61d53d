//! Content source normalizer
//! 内容源规范化器

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use ss_core::config::{ClientConfig, DEFAULT_URL_TIMEOUT_SECS};
use ss_core::content::{ByteStream, ContentMetadata, ContentSource, StreamFactory, ZIP_CONTENT_TYPE};
use ss_core::error::StorageError;
use ss_core::ports::{ContentNormalizerPort, NormalizedContent, StreamProducer};
use tracing::debug;

use super::url_source::UrlProducer;
use super::zip_archive::ZipProducer;

#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Upper bound for a whole URL fetch.
    pub url_timeout: Duration,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            url_timeout: Duration::from_secs(DEFAULT_URL_TIMEOUT_SECS),
        }
    }
}

impl NormalizerConfig {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            url_timeout: Duration::from_secs(config.url_timeout_secs),
        }
    }
}

/// Maps every [`ContentSource`] variant to a re-openable stream producer.
///
/// File checks run at normalization time; URL fetches run at open time.
pub struct ContentNormalizer {
    config: NormalizerConfig,
}

impl ContentNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }
}

impl Default for ContentNormalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl ContentNormalizerPort for ContentNormalizer {
    fn normalize(&self, source: &ContentSource) -> Result<NormalizedContent, StorageError> {
        debug!(source = source.kind(), "Normalizing content source");

        let normalized = match source {
            ContentSource::Bytes(bytes) => NormalizedContent {
                producer: Box::new(BytesProducer(bytes.clone())),
                defaults: ContentMetadata::default(),
            },
            ContentSource::Text(text) => NormalizedContent {
                producer: Box::new(BytesProducer(Bytes::from(text.clone().into_bytes()))),
                defaults: ContentMetadata::default(),
            },
            ContentSource::File(path) => {
                check_regular_file(path)?;
                NormalizedContent {
                    producer: Box::new(FileProducer(path.clone())),
                    defaults: ContentMetadata {
                        name: base_name(path),
                        ..Default::default()
                    },
                }
            }
            ContentSource::Url(url) => NormalizedContent {
                producer: Box::new(UrlProducer::new(url.clone(), self.config.url_timeout)),
                defaults: ContentMetadata::default(),
            },
            ContentSource::Stream(factory) => NormalizedContent {
                producer: Box::new(FactoryProducer(factory.clone())),
                defaults: ContentMetadata::default(),
            },
            ContentSource::FilesAsZip(paths) => NormalizedContent {
                producer: Box::new(ZipProducer::build(paths)?),
                defaults: ContentMetadata {
                    content_type: Some(ZIP_CONTENT_TYPE.to_string()),
                    ..Default::default()
                },
            },
            ContentSource::Path(path) => {
                return Err(StorageError::InvalidSource(format!(
                    "{} is uploaded by path and cannot be streamed",
                    path.display()
                )));
            }
        };

        Ok(normalized)
    }
}

/// Directories are never traversed; a missing path and a directory fail differently.
pub(crate) fn check_regular_file(path: &Path) -> Result<(), StorageError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StorageError::SourceNotFound(path.display().to_string()),
        _ => StorageError::Io(format!("stat {}: {e}", path.display())),
    })?;
    if metadata.is_dir() {
        return Err(StorageError::InvalidSource(format!(
            "{} is a directory",
            path.display()
        )));
    }
    Ok(())
}

pub(crate) fn open_file(path: &Path) -> Result<File, StorageError> {
    check_regular_file(path)?;
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StorageError::SourceNotFound(path.display().to_string()),
        _ => StorageError::Io(format!("open {}: {e}", path.display())),
    })
}

fn base_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

struct BytesProducer(Bytes);

impl StreamProducer for BytesProducer {
    fn open(&self) -> Result<ByteStream, StorageError> {
        Ok(Box::new(Cursor::new(self.0.clone())))
    }
}

struct FileProducer(std::path::PathBuf);

impl StreamProducer for FileProducer {
    fn open(&self) -> Result<ByteStream, StorageError> {
        Ok(Box::new(open_file(&self.0)?))
    }
}

struct FactoryProducer(StreamFactory);

impl StreamProducer for FactoryProducer {
    fn open(&self) -> Result<ByteStream, StorageError> {
        (self.0)().map_err(|e| match StorageError::from_stream_error(e) {
            StorageError::Io(msg) => {
                StorageError::InvalidSource(format!("stream factory failed: {msg}"))
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn read_all(producer: &dyn StreamProducer) -> Vec<u8> {
        let mut out = Vec::new();
        producer
            .open()
            .expect("open stream")
            .read_to_end(&mut out)
            .expect("read stream");
        out
    }

    #[test]
    fn bytes_have_no_default_name() {
        let normalized = ContentNormalizer::default()
            .normalize(&ContentSource::Bytes(Bytes::from_static(b"hello")))
            .unwrap();

        assert_eq!(normalized.defaults, ContentMetadata::default());
        assert_eq!(read_all(normalized.producer.as_ref()), b"hello");
        assert_eq!(read_all(normalized.producer.as_ref()), b"hello");
    }

    #[test]
    fn file_defaults_name_to_base_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"my notes").unwrap();

        let normalized = ContentNormalizer::default()
            .normalize(&ContentSource::File(path))
            .unwrap();

        assert_eq!(normalized.defaults.name.as_deref(), Some("notes.txt"));
        assert_eq!(normalized.defaults.content_type, None);
        assert_eq!(read_all(normalized.producer.as_ref()), b"my notes");
    }

    #[test]
    fn missing_file_is_source_not_found() {
        let dir = tempdir().unwrap();
        let result = ContentNormalizer::default()
            .normalize(&ContentSource::File(dir.path().join("missing.bin")));

        assert!(matches!(result, Err(StorageError::SourceNotFound(_))));
    }

    #[test]
    fn directory_is_invalid_source() {
        let dir = tempdir().unwrap();
        let result = ContentNormalizer::default()
            .normalize(&ContentSource::File(dir.path().to_path_buf()));

        assert!(matches!(result, Err(StorageError::InvalidSource(_))));
    }

    #[test]
    fn directory_in_zip_list_is_invalid_source() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"a").unwrap();

        let result = ContentNormalizer::default().normalize(&ContentSource::FilesAsZip(vec![
            file,
            dir.path().to_path_buf(),
        ]));

        assert!(matches!(result, Err(StorageError::InvalidSource(_))));
    }

    #[test]
    fn zip_bundles_every_file_by_base_name() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, b"alpha").unwrap();
        fs::write(&b, b"beta").unwrap();

        let normalized = ContentNormalizer::default()
            .normalize(&ContentSource::FilesAsZip(vec![a, b]))
            .unwrap();
        assert_eq!(
            normalized.defaults.content_type.as_deref(),
            Some(ZIP_CONTENT_TYPE)
        );

        let archive_bytes = read_all(normalized.producer.as_ref());
        let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("b.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "beta");
    }

    #[test]
    fn stream_factory_is_invoked_per_open() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let factory: StreamFactory = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Cursor::new(b"fresh".to_vec())) as ByteStream)
        });

        let normalized = ContentNormalizer::default()
            .normalize(&ContentSource::Stream(factory))
            .unwrap();
        assert_eq!(read_all(normalized.producer.as_ref()), b"fresh");
        assert_eq!(read_all(normalized.producer.as_ref()), b"fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn file_url_is_read_at_open_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("remote.txt");
        let url = url::Url::from_file_path(&path).unwrap();

        // Building against a not-yet-existing resource succeeds.
        let normalized = ContentNormalizer::default()
            .normalize(&ContentSource::Url(url))
            .unwrap();

        fs::write(&path, b"late content").unwrap();
        assert_eq!(read_all(normalized.producer.as_ref()), b"late content");
    }

    #[test]
    fn path_sources_are_not_streamed() {
        let dir = tempdir().unwrap();
        let result = ContentNormalizer::default()
            .normalize(&ContentSource::Path(dir.path().to_path_buf()));

        assert!(matches!(result, Err(StorageError::InvalidSource(_))));
    }
}
