pub mod content;
pub mod digest;
pub mod ledger;
pub mod privacy;
pub mod repository;
pub mod time;

pub use content::ContentNormalizer;
pub use digest::Sha256Digester;
pub use ledger::InMemoryLedger;
pub use privacy::{KdfParams, KeysPrivacyStrategy, PasswordPrivacyStrategy};
pub use repository::{FsFileRepository, InMemoryFileRepository};
pub use time::SystemClock;
