//! Privacy types and the keyless plain strategy.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ByteStream;
use crate::ports::PrivacyStrategy;

/// Tag persisted next to uploaded content so a downloader can pick a compatible strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum PrivacyType {
    Plain,
    Password,
    Keys,
    /// Caller-defined strategy; the tag is whatever the caller chose.
    Custom(i32),
}

impl PrivacyType {
    pub const PLAIN_TAG: i32 = 0;
    pub const PASSWORD_TAG: i32 = 1;
    pub const KEYS_TAG: i32 = 2;

    pub fn tag(self) -> i32 {
        match self {
            PrivacyType::Plain => Self::PLAIN_TAG,
            PrivacyType::Password => Self::PASSWORD_TAG,
            PrivacyType::Keys => Self::KEYS_TAG,
            PrivacyType::Custom(tag) => tag,
        }
    }

    pub fn from_tag(tag: i32) -> Self {
        match tag {
            Self::PLAIN_TAG => PrivacyType::Plain,
            Self::PASSWORD_TAG => PrivacyType::Password,
            Self::KEYS_TAG => PrivacyType::Keys,
            other => PrivacyType::Custom(other),
        }
    }

    /// Whether decryption needs key material the downloader must be given out-of-band.
    pub fn is_keyed(self) -> bool {
        !matches!(self, PrivacyType::Plain)
    }
}

impl From<i32> for PrivacyType {
    fn from(tag: i32) -> Self {
        PrivacyType::from_tag(tag)
    }
}

impl From<PrivacyType> for i32 {
    fn from(privacy_type: PrivacyType) -> Self {
        privacy_type.tag()
    }
}

impl fmt::Display for PrivacyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivacyType::Plain => write!(f, "plain"),
            PrivacyType::Password => write!(f, "password"),
            PrivacyType::Keys => write!(f, "keys"),
            PrivacyType::Custom(tag) => write!(f, "custom({tag})"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum PrivacyError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Ciphertext was corrupt, truncated, or produced by an incompatible strategy/key.
    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),
}

impl From<PrivacyError> for io::Error {
    fn from(err: PrivacyError) -> Self {
        io::Error::other(err)
    }
}

/// Identity transform. Content is stored as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPrivacyStrategy;

impl PlainPrivacyStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl PrivacyStrategy for PlainPrivacyStrategy {
    fn privacy_type(&self) -> PrivacyType {
        PrivacyType::Plain
    }

    fn encrypt(&self, stream: ByteStream) -> Result<ByteStream, PrivacyError> {
        Ok(stream)
    }

    fn decrypt(&self, stream: ByteStream) -> Result<ByteStream, PrivacyError> {
        Ok(stream)
    }
}
