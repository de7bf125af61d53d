//! Content sources and descriptive metadata.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// Byte stream flowing through the pipelines.
pub type ByteStream = Box<dyn Read + Send>;

/// Zero-argument producer re-invoked every time a fresh stream is needed.
pub type StreamFactory = Arc<dyn Fn() -> io::Result<ByteStream> + Send + Sync>;

/// Content type recorded for a files-as-zip upload.
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Content type recorded for a directory uploaded by path.
pub const PATH_UPLOAD_CONTENT_TYPE: &str = "ipfs/directory";

/// Where uploaded content comes from. Exactly one origin per upload.
#[derive(Clone)]
pub enum ContentSource {
    Bytes(Bytes),
    /// Local file; directories are rejected.
    File(PathBuf),
    /// Remote resource, fetched when the stream is opened rather than when the parameter is built.
    Url(Url),
    Stream(StreamFactory),
    /// Files bundled into a single zip archive.
    FilesAsZip(Vec<PathBuf>),
    /// UTF-8 text.
    Text(String),
    /// A whole directory handed to the repository's path upload.
    Path(PathBuf),
}

impl ContentSource {
    pub fn kind(&self) -> &'static str {
        match self {
            ContentSource::Bytes(_) => "bytes",
            ContentSource::File(_) => "file",
            ContentSource::Url(_) => "url",
            ContentSource::Stream(_) => "stream",
            ContentSource::FilesAsZip(_) => "files_as_zip",
            ContentSource::Text(_) => "text",
            ContentSource::Path(_) => "path",
        }
    }
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            ContentSource::File(path) => f.debug_tuple("File").field(path).finish(),
            ContentSource::Url(url) => f.debug_tuple("Url").field(&url.as_str()).finish(),
            ContentSource::Stream(_) => write!(f, "Stream(<factory>)"),
            ContentSource::FilesAsZip(paths) => f.debug_tuple("FilesAsZip").field(paths).finish(),
            ContentSource::Text(text) => write!(f, "Text({} chars)", text.chars().count()),
            ContentSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
        }
    }
}

/// Descriptive metadata. Unset fields stay `None` so "not provided" differs from "empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<BTreeMap<String, String>>,
}

impl ContentMetadata {
    /// Field-by-field overlay: values set on `self` win over `defaults`.
    pub fn or_defaults(self, defaults: &ContentMetadata) -> ContentMetadata {
        ContentMetadata {
            name: self.name.or_else(|| defaults.name.clone()),
            description: self.description.or_else(|| defaults.description.clone()),
            content_type: self.content_type.or_else(|| defaults.content_type.clone()),
            custom: self.custom.or_else(|| defaults.custom.clone()),
        }
    }
}
