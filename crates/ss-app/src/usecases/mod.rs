//! Storage use cases
//! 存储用例
//!
//! UploadUseCase          → normalize → digest → encrypt → store → record
//! DownloadUseCase        → (validate) → fetch → decrypt
//! DirectDownloadUseCase  → resolve locator → DownloadUseCase → lazy result

pub mod direct_download;
pub mod download;
pub mod upload;

mod stream_capture;

#[cfg(test)]
pub(crate) mod test_support;

pub use direct_download::DirectDownloadUseCase;
pub use download::DownloadUseCase;
pub use upload::UploadUseCase;
