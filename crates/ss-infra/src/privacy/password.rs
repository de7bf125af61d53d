use argon2::Argon2;
use rand::RngCore;
use ss_core::config::ClientConfig;
use ss_core::content::ByteStream;
use ss_core::ports::PrivacyStrategy;
use ss_core::privacy::{PrivacyError, PrivacyType};
use zeroize::Zeroizing;

use super::stream_cipher::{self, StreamKey, KEY_LEN};

const SALT_LEN: usize = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub mem_kib: u32,
    pub iters: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_kib: ss_core::config::DEFAULT_KDF_MEM_KIB,
            iters: ss_core::config::DEFAULT_KDF_ITERS,
            parallelism: ss_core::config::DEFAULT_KDF_PARALLELISM,
        }
    }
}

impl KdfParams {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            mem_kib: config.kdf_mem_kib,
            iters: config.kdf_iters,
            parallelism: config.kdf_parallelism,
        }
    }
}

/// Password-based privacy: a fresh random salt per stream, Argon2id key derivation,
/// and the chunked AEAD stream format. The salt travels in the stream header.
pub struct PasswordPrivacyStrategy {
    password: Zeroizing<String>,
    kdf: KdfParams,
}

impl PasswordPrivacyStrategy {
    pub fn new(password: impl Into<String>) -> Result<Self, PrivacyError> {
        Self::with_params(password, KdfParams::default())
    }

    pub fn with_params(password: impl Into<String>, kdf: KdfParams) -> Result<Self, PrivacyError> {
        let password = Zeroizing::new(password.into());
        if password.is_empty() {
            return Err(PrivacyError::InvalidKey(
                "password must not be empty".to_string(),
            ));
        }
        // Surface bad cost parameters at construction instead of on first use.
        argon2::Params::new(kdf.mem_kib, kdf.iters, kdf.parallelism, Some(KEY_LEN))
            .map_err(|e| PrivacyError::InvalidKey(format!("invalid kdf parameters: {e}")))?;
        Ok(Self { password, kdf })
    }

    fn derive_key(&self, salt: &[u8]) -> Result<StreamKey, PrivacyError> {
        let params = argon2::Params::new(
            self.kdf.mem_kib,
            self.kdf.iters,
            self.kdf.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| PrivacyError::InvalidKey(format!("invalid kdf parameters: {e}")))?;
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        argon2
            .hash_password_into(self.password.as_bytes(), salt, &mut key[..])
            .map_err(|e| PrivacyError::InvalidKey(format!("key derivation failed: {e}")))?;
        Ok(key)
    }

    fn strategy_id() -> u8 {
        PrivacyType::PASSWORD_TAG as u8
    }
}

impl PrivacyStrategy for PasswordPrivacyStrategy {
    fn privacy_type(&self) -> PrivacyType {
        PrivacyType::Password
    }

    fn encrypt(&self, stream: ByteStream) -> Result<ByteStream, PrivacyError> {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        let key = self.derive_key(&salt)?;
        stream_cipher::encrypt_stream(stream, Self::strategy_id(), &salt, &key)
    }

    fn decrypt(&self, mut stream: ByteStream) -> Result<ByteStream, PrivacyError> {
        let header = stream_cipher::read_header(&mut stream, Self::strategy_id(), SALT_LEN)?;
        let key = self.derive_key(header.extra())?;
        stream_cipher::decrypt_stream(stream, header, &key)
    }
}
