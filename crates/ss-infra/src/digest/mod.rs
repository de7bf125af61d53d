mod sha256_digester;

pub use sha256_digester::Sha256Digester;
