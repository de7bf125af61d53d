//! Sirius storage application layer
//!
//! Upload, download and direct-download pipelines over the ports defined in
//! `ss-core`, plus the async task boundary.

pub mod deps;
pub mod downloader;
pub mod tasks;
pub mod uploader;
pub mod usecases;

pub use deps::StorageDeps;
pub use downloader::Downloader;
pub use tasks::{AsyncCallbacks, AsyncTask, TaskRunner};
pub use uploader::Uploader;
pub use usecases::{DirectDownloadUseCase, DownloadUseCase, UploadUseCase};
