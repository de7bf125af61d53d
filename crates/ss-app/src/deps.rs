//! # Storage Dependencies / 存储依赖
//!
//! Dependency grouping for the use cases and facades.
//! 用例与门面的依赖分组。
//!
//! **Note / 注意**: This is NOT a Builder pattern, just parameter grouping.
//! **这不是 Builder 模式，仅用于参数打包。**

use std::sync::Arc;
use ss_core::ports::*;

/// Port grouping consumed by [`crate::Uploader`] and [`crate::Downloader`].
/// 上传/下载门面所需的端口分组。
///
/// `ledger` is the only optional port: without it uploads return no transaction
/// hash and transaction-hash lookups fail with a validation error.
#[derive(Clone)]
pub struct StorageDeps {
    // Storage / 存储
    pub repository: Arc<dyn FileRepositoryPort>,
    pub ledger: Option<Arc<dyn LedgerPort>>,

    // Content / 内容
    pub normalizer: Arc<dyn ContentNormalizerPort>,
    pub digest: Arc<dyn DigestPort>,

    // System / 系统
    pub clock: Arc<dyn ClockPort>,
}
