//! # Pure Data Module / 纯数据模块
//!
//! Client configuration DTO and its TOML mapping. No validation happens here:
//! out-of-range or unknown values are carried as-is and rejected, if at all,
//! by whoever wires the client.
//! 客户端配置 DTO，只做 TOML → DTO 映射，不做校验。

use std::path::PathBuf;

/// Argon2 memory cost used when the config omits it (KiB).
pub const DEFAULT_KDF_MEM_KIB: u32 = 19 * 1024;
pub const DEFAULT_KDF_ITERS: u32 = 2;
pub const DEFAULT_KDF_PARALLELISM: u32 = 1;
pub const DEFAULT_URL_TIMEOUT_SECS: u64 = 30;

/// Client configuration DTO (pure data, no logic)
/// 客户端配置 DTO（纯数据，无逻辑）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Worker threads for the async task runner; 0 means the runtime's own default.
    pub worker_threads: usize,

    /// Storage backend kind, `memory` or `fs` (not checked here)
    /// 存储后端类型（此处不检查）
    ///
    /// Only the blob store follows this setting. Transaction records stay in
    /// process memory, so with `fs` only data hashes survive a restart.
    pub storage_kind: String,

    /// Root directory of the `fs` backend (path info only, no existence check)
    pub storage_root: PathBuf,

    pub kdf_mem_kib: u32,
    pub kdf_iters: u32,
    pub kdf_parallelism: u32,

    pub url_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            storage_kind: "memory".to_string(),
            storage_root: PathBuf::new(),
            kdf_mem_kib: DEFAULT_KDF_MEM_KIB,
            kdf_iters: DEFAULT_KDF_ITERS,
            kdf_parallelism: DEFAULT_KDF_PARALLELISM,
            url_timeout_secs: DEFAULT_URL_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Create ClientConfig from TOML value
    /// 从 TOML 值创建 ClientConfig
    ///
    /// Missing keys fall back to [`ClientConfig::default`]; present keys are taken verbatim.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let int = |section: &str, key: &str| {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_integer())
        };

        Ok(Self {
            worker_threads: int("async", "worker_threads")
                .map(|v| v as usize)
                .unwrap_or(defaults.worker_threads),
            storage_kind: toml_value
                .get("storage")
                .and_then(|s| s.get("kind"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or(defaults.storage_kind),
            storage_root: toml_value
                .get("storage")
                .and_then(|s| s.get("root"))
                .and_then(|v| v.as_str())
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_root),
            kdf_mem_kib: int("privacy", "kdf_mem_kib")
                .map(|v| v as u32)
                .unwrap_or(defaults.kdf_mem_kib),
            kdf_iters: int("privacy", "kdf_iters")
                .map(|v| v as u32)
                .unwrap_or(defaults.kdf_iters),
            kdf_parallelism: int("privacy", "kdf_parallelism")
                .map(|v| v as u32)
                .unwrap_or(defaults.kdf_parallelism),
            url_timeout_secs: int("network", "url_timeout_secs")
                .map(|v| v as u64)
                .unwrap_or(defaults.url_timeout_secs),
        })
    }
}
