use std::collections::HashMap;
use std::sync::Mutex;

use ss_core::credential::Credential;
use ss_core::ids::TransactionHash;
use ss_core::payload::MessagePayload;
use ss_core::ports::{LedgerError, LedgerPort};
use tracing::debug;

const TRANSACTION_CONTEXT: &str = "sirius-storage in-memory ledger transaction v1";

struct RecordedMessage {
    json: String,
    recipient: Option<String>,
}

#[derive(Default)]
struct LedgerState {
    sequence: u64,
    messages: HashMap<TransactionHash, RecordedMessage>,
}

/// Process-local ledger. Payloads are kept as the JSON message they would carry on chain.
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recipient public key the transaction was addressed to, if any.
    pub fn recipient_of(&self, hash: &TransactionHash) -> Option<String> {
        self.state
            .lock()
            .ok()?
            .messages
            .get(hash)
            .and_then(|message| message.recipient.clone())
    }

    /// Stores an arbitrary message, bypassing payload encoding. Test hook for
    /// transactions that were not written by a storage client.
    pub fn insert_raw(&self, message: impl Into<String>) -> Result<TransactionHash, LedgerError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| LedgerError::Network("ledger lock poisoned".to_string()))?;
        let hash = next_hash(&mut state, message.into().as_bytes());
        Ok(hash)
    }
}

fn next_hash(state: &mut LedgerState, message: &[u8]) -> TransactionHash {
    state.sequence += 1;
    let mut material = state.sequence.to_be_bytes().to_vec();
    material.extend_from_slice(message);
    let hash = TransactionHash::from(hex::encode(blake3::derive_key(
        TRANSACTION_CONTEXT,
        &material,
    )));
    state.messages.insert(
        hash.clone(),
        RecordedMessage {
            json: String::from_utf8_lossy(message).into_owned(),
            recipient: None,
        },
    );
    hash
}

impl LedgerPort for InMemoryLedger {
    fn resolve_transaction(&self, hash: &TransactionHash) -> Result<MessagePayload, LedgerError> {
        if !hash.is_well_formed() {
            return Err(LedgerError::InvalidHash(hash.to_string()));
        }

        let state = self
            .state
            .lock()
            .map_err(|_| LedgerError::Network("ledger lock poisoned".to_string()))?;
        let message = state
            .messages
            .get(hash)
            .ok_or_else(|| LedgerError::NotFound(hash.to_string()))?;

        MessagePayload::from_json(&message.json)
            .map_err(|e| LedgerError::InvalidPayload(format!("transaction {hash}: {e}")))
    }

    fn record(
        &self,
        _signer: &Credential,
        recipient_public_key: Option<&str>,
        payload: &MessagePayload,
    ) -> Result<TransactionHash, LedgerError> {
        if payload.data.data_hash.is_empty() {
            return Err(LedgerError::Rejected(
                "payload does not reference any content".to_string(),
            ));
        }
        let json = payload
            .to_json()
            .map_err(|e| LedgerError::InvalidPayload(e.to_string()))?;

        let mut state = self
            .state
            .lock()
            .map_err(|_| LedgerError::Network("ledger lock poisoned".to_string()))?;
        let hash = next_hash(&mut state, json.as_bytes());
        if let Some(message) = state.messages.get_mut(&hash) {
            message.recipient = recipient_public_key.map(str::to_string);
        }

        debug!(
            transaction_hash = %hash,
            data_hash = %payload.data.data_hash,
            "Recorded storage payload"
        );
        Ok(hash)
    }
}
