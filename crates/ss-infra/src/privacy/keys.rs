use ss_core::content::ByteStream;
use ss_core::credential::parse_key_hex;
use ss_core::ports::PrivacyStrategy;
use ss_core::privacy::{PrivacyError, PrivacyType};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use super::stream_cipher::{self, StreamKey};

const KEY_CONTEXT: &str = "sirius-storage keys-privacy stream key v1";

/// Key-pair privacy: X25519 agreement between our private key and the peer's
/// public key, expanded with BLAKE3 into the stream key.
///
/// The agreement is symmetric, so content encrypted with
/// `(uploader private, recipient public)` decrypts with
/// `(recipient private, uploader public)`.
pub struct KeysPrivacyStrategy {
    key: StreamKey,
}

impl KeysPrivacyStrategy {
    /// Both keys are 32-byte values in hex.
    pub fn new(private_key_hex: &str, peer_public_key_hex: &str) -> Result<Self, PrivacyError> {
        let secret = StaticSecret::from(
            parse_key_hex(private_key_hex)
                .map_err(|e| PrivacyError::InvalidKey(format!("private key: {e}")))?,
        );
        let peer = PublicKey::from(
            parse_key_hex(peer_public_key_hex)
                .map_err(|e| PrivacyError::InvalidKey(format!("public key: {e}")))?,
        );

        let shared = secret.diffie_hellman(&peer);
        if !shared.was_contributory() {
            return Err(PrivacyError::InvalidKey(
                "public key is a low-order point".to_string(),
            ));
        }

        Ok(Self {
            key: Zeroizing::new(blake3::derive_key(KEY_CONTEXT, shared.as_bytes())),
        })
    }

    /// Public key (hex) matching a private key (hex).
    pub fn public_key_for(private_key_hex: &str) -> Result<String, PrivacyError> {
        let secret = StaticSecret::from(
            parse_key_hex(private_key_hex)
                .map_err(|e| PrivacyError::InvalidKey(format!("private key: {e}")))?,
        );
        Ok(hex::encode(PublicKey::from(&secret).as_bytes()))
    }

    fn strategy_id() -> u8 {
        PrivacyType::KEYS_TAG as u8
    }
}

impl PrivacyStrategy for KeysPrivacyStrategy {
    fn privacy_type(&self) -> PrivacyType {
        PrivacyType::Keys
    }

    fn encrypt(&self, stream: ByteStream) -> Result<ByteStream, PrivacyError> {
        stream_cipher::encrypt_stream(stream, Self::strategy_id(), &[], &self.key)
    }

    fn decrypt(&self, mut stream: ByteStream) -> Result<ByteStream, PrivacyError> {
        let header = stream_cipher::read_header(&mut stream, Self::strategy_id(), 0)?;
        stream_cipher::decrypt_stream(stream, header, &self.key)
    }
}
