//! Content-addressed storage repositories. The data hash of stored bytes is the
//! lowercase hex SHA-256 of those bytes, so identical content shares one hash.

mod fs;
mod memory;
mod tree;

pub use fs::FsFileRepository;
pub use memory::InMemoryFileRepository;
