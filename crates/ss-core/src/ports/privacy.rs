use std::sync::Arc;

use crate::content::ByteStream;
use crate::privacy::{PrivacyError, PrivacyType};

/// Encrypt/decrypt transform applied before storage and after retrieval.
///
/// Contract:
/// - `decrypt(encrypt(s)) == s` byte for byte for every finite stream
/// - streaming: never requires the whole payload in memory
/// - `decrypt` fails with [`PrivacyError::Decryption`] when the input was not produced
///   by a compatible `encrypt`; it never yields garbage silently
/// - stateless after construction, so one instance may serve concurrent pipelines
pub trait PrivacyStrategy: Send + Sync {
    fn privacy_type(&self) -> PrivacyType;

    fn encrypt(&self, stream: ByteStream) -> Result<ByteStream, PrivacyError>;

    fn decrypt(&self, stream: ByteStream) -> Result<ByteStream, PrivacyError>;
}

impl<T: PrivacyStrategy + ?Sized> PrivacyStrategy for Arc<T> {
    fn privacy_type(&self) -> PrivacyType {
        (**self).privacy_type()
    }

    fn encrypt(&self, stream: ByteStream) -> Result<ByteStream, PrivacyError> {
        (**self).encrypt(stream)
    }

    fn decrypt(&self, stream: ByteStream) -> Result<ByteStream, PrivacyError> {
        (**self).decrypt(stream)
    }
}
