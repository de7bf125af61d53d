//! Signing credential handed to the ledger and, optionally, to a key-pair privacy strategy.
//!
//! The core treats the key as opaque: it is only checked for shape (32 bytes, hex encoded).

use std::fmt;

use zeroize::Zeroizing;

use crate::error::StorageError;

/// Length in bytes of a private or public key.
pub const KEY_LEN: usize = 32;

/// Account private key. Debug output is redacted and the bytes are wiped on drop.
#[derive(Clone)]
pub struct Credential {
    private_key: Zeroizing<[u8; KEY_LEN]>,
}

impl Credential {
    /// Parses a 64 character hex private key.
    pub fn from_private_key(hex_key: &str) -> Result<Self, StorageError> {
        let bytes = parse_key_hex(hex_key).map_err(|reason| {
            StorageError::Validation(format!("private key should be a valid key: {reason}"))
        })?;
        Ok(Self {
            private_key: Zeroizing::new(bytes),
        })
    }

    pub fn private_key_bytes(&self) -> &[u8; KEY_LEN] {
        &self.private_key
    }

    /// Hex form of the private key, for collaborators that sign with it.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.private_key.as_slice()))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential([REDACTED])")
    }
}

/// Decodes a 32-byte key from hex, rejecting any other length.
pub fn parse_key_hex(hex_key: &str) -> Result<[u8; KEY_LEN], String> {
    let decoded = hex::decode(hex_key.trim()).map_err(|e| e.to_string())?;
    if decoded.len() != KEY_LEN {
        return Err(format!(
            "expected {} bytes, got {}",
            KEY_LEN,
            decoded.len()
        ));
    }
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&decoded);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_64_hex_chars() {
        let key = "1".repeat(64);
        let credential = Credential::from_private_key(&key).expect("valid key");
        assert_eq!(credential.private_key_bytes(), &[0x11u8; KEY_LEN]);
        assert_eq!(credential.private_key_hex().as_str(), key);
    }

    #[test]
    fn rejects_wrong_length_and_non_hex() {
        assert!(matches!(
            Credential::from_private_key("abcd"),
            Err(StorageError::Validation(_))
        ));
        assert!(matches!(
            Credential::from_private_key(&"x".repeat(64)),
            Err(StorageError::Validation(_))
        ));
    }

    #[test]
    fn debug_is_redacted() {
        let credential = Credential::from_private_key(&"2".repeat(64)).unwrap();
        assert_eq!(format!("{:?}", credential), "Credential([REDACTED])");
    }
}
