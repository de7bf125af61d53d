//! Identifiers exchanged with the storage backend and the ledger.

mod id_macro;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use id_macro::impl_hash_id;

/// Content-addressing identifier assigned by the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataHash(String);

/// Identifier of a ledger record that links to a data hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionHash(String);

/// Integrity fingerprint (lowercase hex) of the bytes that crossed the storage backend.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl_hash_id!(DataHash, TransactionHash, Digest);

/// Length in hex characters of a ledger transaction hash (32 bytes).
pub const TRANSACTION_HASH_HEX_LEN: usize = 64;

impl TransactionHash {
    /// Returns true when the hash is 64 hex characters, the only shape the ledger issues.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == TRANSACTION_HASH_HEX_LEN && self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl DataHash {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Digest {
    /// Builds a digest from raw fingerprint bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Case-insensitive, constant-time comparison of two hex digests.
    pub fn matches(&self, other: &Digest) -> bool {
        let a = self.0.to_ascii_lowercase();
        let b = other.0.to_ascii_lowercase();
        a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
    }
}

impl PartialEq for Digest {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}
