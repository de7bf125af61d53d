//! Keyed privacy strategies and the stream format they share.
//!
//! The plain (identity) strategy lives in `ss_core::privacy`; custom strategies are
//! any caller type implementing `ss_core::ports::PrivacyStrategy`.

mod keys;
mod password;
mod stream_cipher;

pub use keys::KeysPrivacyStrategy;
pub use password::{KdfParams, PasswordPrivacyStrategy};
