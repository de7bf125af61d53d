use std::io::{self, Read};

use sha2::{Digest as _, Sha256};
use ss_core::error::StorageError;
use ss_core::ids::Digest;
use ss_core::ports::DigestPort;

const BUF_SIZE: usize = 64 * 1024;

/// SHA-256 over the full stream, rendered as lowercase hex.
pub struct Sha256Digester;

impl DigestPort for Sha256Digester {
    fn digest(&self, stream: &mut dyn Read) -> Result<Digest, StorageError> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; BUF_SIZE];
        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => hasher.update(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(StorageError::from_stream_error(e)),
            }
        }
        Ok(Digest::from_bytes(&hasher.finalize()))
    }
}
