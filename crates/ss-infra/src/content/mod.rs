//! Content-source normalization: every upload source becomes a re-openable stream.

mod normalizer;
mod url_source;
mod zip_archive;

pub use normalizer::{ContentNormalizer, NormalizerConfig};
