//! Port interfaces consumed by the pipelines.
//!
//! Ports define the contract between the upload/download use cases and the
//! adapters that talk to crypto libraries, the storage backend and the ledger.
//! All ports are synchronous and may block the calling thread; the async entry
//! points live at the application boundary only.

mod clock;
mod content;
mod digest;
mod ledger;
mod privacy;
mod repository;

pub use clock::ClockPort;
pub use content::{ContentNormalizerPort, NormalizedContent, StreamProducer};
pub use digest::DigestPort;
pub use ledger::{LedgerError, LedgerPort};
pub use privacy::PrivacyStrategy;
pub use repository::{FileRepositoryPort, RepositoryError};
