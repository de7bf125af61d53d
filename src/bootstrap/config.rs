//! # Configuration Loader / 配置加载器
//!
//! Reads a TOML file into the [`ClientConfig`] DTO. Pure data loading: no
//! validation, missing values fall back to `ClientConfig` defaults.

use std::path::Path;

use anyhow::Context;
use ss_core::config::ClientConfig;

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: impl AsRef<Path>) -> anyhow::Result<ClientConfig> {
    let config_path = config_path.as_ref();
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    ClientConfig::from_toml(&toml_value)
}
