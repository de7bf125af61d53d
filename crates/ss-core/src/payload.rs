//! Message payload recorded on the ledger for every upload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::{ContentMetadata, PATH_UPLOAD_CONTENT_TYPE};
use crate::ids::{DataHash, Digest};
use crate::privacy::PrivacyType;

/// Schema version written into every payload.
pub const SCHEMA_VERSION: &str = "1.0";

/// What the ledger knows about one stored piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedData {
    pub data_hash: DataHash,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    /// Milliseconds since the UNIX epoch.
    pub timestamp: i64,
}

impl RecordedData {
    pub fn new(
        data_hash: DataHash,
        digest: Option<Digest>,
        metadata: ContentMetadata,
        timestamp: i64,
    ) -> Self {
        Self {
            data_hash,
            digest,
            name: metadata.name,
            description: metadata.description,
            content_type: metadata.content_type,
            metadata: metadata.custom,
            timestamp,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.content_type.as_deref() == Some(PATH_UPLOAD_CONTENT_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub privacy_type: PrivacyType,
    pub version: String,
    pub data: RecordedData,
}

impl MessagePayload {
    pub fn new(privacy_type: PrivacyType, data: RecordedData) -> Self {
        Self {
            privacy_type,
            version: SCHEMA_VERSION.to_string(),
            data,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
