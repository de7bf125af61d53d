//! End-to-end scenarios over the facades, wired to the in-memory adapters.

use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ss_app::{AsyncCallbacks, Downloader, StorageDeps, TaskRunner, Uploader};
use ss_core::content::ByteStream;
use ss_core::ports::{FileRepositoryPort, PrivacyStrategy};
use ss_core::privacy::{PlainPrivacyStrategy, PrivacyError, PrivacyType};
use ss_core::{DataHash, DirectDownloadParameter, Digest, StorageError, UploadParameter};
use ss_infra::{
    ContentNormalizer, InMemoryFileRepository, InMemoryLedger, KdfParams,
    PasswordPrivacyStrategy, Sha256Digester, SystemClock,
};

const KEY: &str = "0101010101010101010101010101010101010101010101010101010101010101";

struct Harness {
    uploader: Uploader,
    downloader: Downloader,
    repository: Arc<InMemoryFileRepository>,
}

fn harness() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let repository = Arc::new(InMemoryFileRepository::new());
    let deps = StorageDeps {
        repository: repository.clone(),
        ledger: Some(Arc::new(InMemoryLedger::new())),
        normalizer: Arc::new(ContentNormalizer::default()),
        digest: Arc::new(Sha256Digester),
        clock: Arc::new(SystemClock),
    };
    let runner = Arc::new(TaskRunner::new(2).expect("task runtime"));
    Harness {
        uploader: Uploader::new(&deps, runner.clone()),
        downloader: Downloader::new(&deps, runner),
        repository,
    }
}

fn fast_password(password: &str) -> Arc<dyn PrivacyStrategy> {
    let params = KdfParams {
        mem_kib: 32,
        iters: 1,
        parallelism: 1,
    };
    Arc::new(PasswordPrivacyStrategy::with_params(password, params).unwrap())
}

/// Identity strategy that counts how often decrypt is requested.
#[derive(Default)]
struct CountingStrategy {
    decrypts: AtomicUsize,
}

impl PrivacyStrategy for CountingStrategy {
    fn privacy_type(&self) -> PrivacyType {
        PrivacyType::Custom(42)
    }

    fn encrypt(&self, stream: ByteStream) -> Result<ByteStream, PrivacyError> {
        Ok(stream)
    }

    fn decrypt(&self, stream: ByteStream) -> Result<ByteStream, PrivacyError> {
        self.decrypts.fetch_add(1, Ordering::SeqCst);
        Ok(stream)
    }
}

#[test]
fn plain_hello_upload_has_no_digest_or_metadata() {
    let h = harness();
    let result = h
        .uploader
        .upload(&UploadParameter::for_bytes(b"hello".to_vec(), KEY).build().unwrap())
        .unwrap();

    assert!(!result.data_hash().is_empty());
    assert!(result.digest().is_none());
    assert!(result.data.name.is_none());
    assert!(result.data.description.is_none());
    assert!(result.data.content_type.is_none());
    assert!(result.data.metadata.is_none());
}

#[test]
fn file_upload_echoes_metadata_and_round_trips() {
    let h = harness();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    let contents = b"line one\nline two\n\x00\xff binary tail";
    std::fs::write(&file, contents).unwrap();

    let result = h
        .uploader
        .upload(
            &UploadParameter::for_file(&file, KEY)
                .description("my notes")
                .content_type("text/plain")
                .build()
                .unwrap(),
        )
        .unwrap();

    assert_eq!(result.data.name.as_deref(), Some("notes.txt"));
    assert_eq!(result.data.description.as_deref(), Some("my notes"));
    assert_eq!(result.data.content_type.as_deref(), Some("text/plain"));

    let bytes = h
        .downloader
        .download_bytes(result.data_hash(), &PlainPrivacyStrategy::new(), None)
        .unwrap();
    assert_eq!(&bytes[..], &contents[..]);
}

#[test]
fn wrong_password_never_yields_plaintext() {
    let h = harness();
    let result = h
        .uploader
        .upload(
            &UploadParameter::for_string("secret", KEY)
                .privacy_strategy(fast_password("pw1"))
                .build()
                .unwrap(),
        )
        .unwrap();

    let err = h
        .downloader
        .download_bytes(result.data_hash(), fast_password("pw2").as_ref(), None)
        .unwrap_err();
    assert!(matches!(err, StorageError::DecryptionFailure(_)));

    let plaintext = h
        .downloader
        .download_bytes(result.data_hash(), fast_password("pw1").as_ref(), None)
        .unwrap();
    assert_eq!(&plaintext[..], b"secret");
}

#[test]
fn wrong_digest_aborts_before_any_decrypt() {
    let h = harness();
    let hash = h
        .repository
        .add_byte_stream(Box::new(Cursor::new(b"stored bytes".to_vec())))
        .unwrap();
    let strategy = Arc::new(CountingStrategy::default());

    let param = DirectDownloadParameter::from_data_hash(hash, Some(Digest::from("ff".repeat(32))))
        .privacy_strategy(strategy.clone())
        .build()
        .unwrap();
    let err = h.downloader.direct_download(&param).unwrap_err();

    assert!(matches!(
        err.root_cause(),
        StorageError::DigestMismatch { .. }
    ));
    assert_eq!(strategy.decrypts.load(Ordering::SeqCst), 0);
}

#[test]
fn computed_digest_validates_transaction_download() {
    let h = harness();
    let result = h
        .uploader
        .upload(
            &UploadParameter::for_string("checked", KEY)
                .privacy_strategy(fast_password("pw"))
                .compute_digest(true)
                .build()
                .unwrap(),
        )
        .unwrap();
    assert!(result.digest().is_some());

    let param = DirectDownloadParameter::from_transaction_hash(
        result.transaction_hash.clone().unwrap(),
    )
    .validate_digest(true)
    .privacy_strategy(fast_password("pw"))
    .build()
    .unwrap();

    let download = h.downloader.direct_download(&param).unwrap();
    assert_eq!(download.privacy_type(), PrivacyType::Password);
    assert_eq!(download.content_as_string().unwrap(), "checked");
    // Cached after the first materialization.
    assert_eq!(download.clone().content_as_string().unwrap(), "checked");
}

#[test]
fn invalid_locators_surface_the_umbrella_error() {
    let h = harness();
    let params = [
        DirectDownloadParameter::from_transaction_hash("not hex").build().unwrap(),
        DirectDownloadParameter::from_transaction_hash("ab".repeat(32))
            .build()
            .unwrap(),
        DirectDownloadParameter::from_data_hash("", None).build().unwrap(),
        DirectDownloadParameter::from_data_hash(DataHash::from("cd".repeat(32)), None)
            .build()
            .unwrap(),
    ];

    for param in &params {
        let err = h.downloader.direct_download(param).unwrap_err();
        assert!(
            matches!(err, StorageError::DirectDownloadFailure(_)),
            "{param:?} produced {err:?}"
        );
    }
}

#[test]
fn async_callbacks_are_exclusive() {
    let h = harness();
    let successes = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let (s, f) = (successes.clone(), failures.clone());
        let source = if i % 2 == 0 {
            UploadParameter::for_string(format!("item {i}"), KEY)
        } else {
            UploadParameter::for_file(format!("/definitely/missing/{i}.bin"), KEY)
        };
        let task = h.uploader.upload_async(
            source.build().unwrap(),
            AsyncCallbacks::new()
                .on_success(move |_| {
                    s.fetch_add(1, Ordering::SeqCst);
                })
                .on_failure(move |_| {
                    f.fetch_add(1, Ordering::SeqCst);
                }),
        );
        tasks.push(task);
    }

    for mut task in tasks {
        let _ = task.wait(Some(Duration::from_secs(10)));
        assert!(task.is_done());
    }
    assert_eq!(successes.load(Ordering::SeqCst), 4);
    assert_eq!(failures.load(Ordering::SeqCst), 4);
}

#[test]
fn streamed_source_round_trips_through_async_download() {
    let h = harness();
    let factory = || -> std::io::Result<ByteStream> { Ok(Box::new(Cursor::new(vec![7u8; 200_000]))) };
    let result = h
        .uploader
        .upload(
            &UploadParameter::for_stream(factory, KEY)
                .privacy_strategy(fast_password("stream"))
                .build()
                .unwrap(),
        )
        .unwrap();

    let mut task = h.downloader.download_async(
        result.data_hash().clone(),
        fast_password("stream"),
        None,
        AsyncCallbacks::new(),
    );
    let bytes = task.wait(Some(Duration::from_secs(10))).unwrap();
    assert_eq!(bytes.len(), 200_000);
    assert!(bytes.iter().all(|b| *b == 7));

    let mut stream = h
        .downloader
        .download(result.data_hash(), fast_password("stream").as_ref(), None)
        .unwrap();
    let mut first = [0u8; 4];
    stream.read_exact(&mut first).unwrap();
    assert_eq!(first, [7; 4]);
}
