use std::io::Read;

use crate::error::StorageError;
use crate::ids::Digest;

/// Content fingerprinting over byte streams.
pub trait DigestPort: Send + Sync {
    /// Pure function of the stream's bytes; consumes the stream to completion.
    fn digest(&self, stream: &mut dyn Read) -> Result<Digest, StorageError>;

    /// Recomputes the digest and fails with `DigestMismatch` when it differs.
    fn validate(&self, stream: &mut dyn Read, expected: &Digest) -> Result<(), StorageError> {
        let actual = self.digest(stream)?;
        if actual.matches(expected) {
            Ok(())
        } else {
            Err(StorageError::DigestMismatch {
                expected: expected.clone(),
                actual,
            })
        }
    }
}
