use thiserror::Error;

use crate::credential::Credential;
use crate::ids::TransactionHash;
use crate::payload::MessagePayload;

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("transaction {0} not found")]
    NotFound(String),

    #[error("malformed transaction hash {0}")]
    InvalidHash(String),

    #[error("transaction message is not a storage payload: {0}")]
    InvalidPayload(String),

    #[error("ledger rejected the transaction: {0}")]
    Rejected(String),

    #[error("ledger transport failed: {0}")]
    Network(String),
}

/// Ledger client: records payloads and resolves them back by transaction hash.
pub trait LedgerPort: Send + Sync {
    /// Resolves a transaction hash to the message payload it carries.
    fn resolve_transaction(&self, hash: &TransactionHash) -> Result<MessagePayload, LedgerError>;

    /// Announces `payload` signed by `signer`, optionally addressed to `recipient_public_key`.
    fn record(
        &self,
        signer: &Credential,
        recipient_public_key: Option<&str>,
        payload: &MessagePayload,
    ) -> Result<TransactionHash, LedgerError>;
}
