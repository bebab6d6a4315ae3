//! # Configuration Module / 配置模块
//!
//! Loads the optional `Runner.toml` file. Every key is optional; command-line
//! arguments override what the file says.
//!
//! 加载可选的 `Runner.toml` 文件。所有键都是可选的，命令行参数优先。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::variables::VariableStore;

/// File name looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Runner.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Runner settings, loaded from a TOML file.
/// 从 TOML 文件加载的运行器设置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// The language for console messages (e.g., "en", "zh-CN").
    /// Detected from the system when not set.
    ///
    /// 控制台消息的语言（例如 "en", "zh-CN"）。未设置时从系统检测。
    pub language: Option<String>,

    /// Default domain requests are sent to.
    /// 请求发送到的默认域名。
    pub domain: Option<String>,

    /// Directory searched for test-case documents.
    /// 搜索测试用例文档的目录。
    pub input_directory: PathBuf,

    /// Directory receiving annotated copies and summaries. Nothing is written
    /// when unset.
    /// 接收带注释副本和摘要的目录。未设置时不写入任何内容。
    pub output_directory: Option<PathBuf>,

    /// Keep executing tables after a failed one.
    /// 表格失败后继续执行后续表格。
    pub continue_on_failure: bool,

    /// Per-request timeout in seconds.
    /// 每个请求的超时时间（秒）。
    pub timeout_secs: u64,

    /// Seed values for `@@name@@` placeholders.
    /// `@@name@@` 占位符的初始值。
    pub variables: BTreeMap<String, String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            language: None,
            domain: None,
            input_directory: PathBuf::from("."),
            output_directory: None,
            continue_on_failure: false,
            timeout_secs: 30,
            variables: BTreeMap::new(),
        }
    }
}

impl RunnerConfig {
    /// The configured seed values as a variable store.
    pub fn seed_variables(&self) -> VariableStore {
        self.variables
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Parses configuration text.
pub fn parse_config(content: &str, path: &Path) -> Result<RunnerConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads and parses the config file at `path`.
pub fn load_config(path: &Path) -> Result<RunnerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, path)
}

/// Loads the config for a command.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
/// working directory is used if present, and the defaults otherwise.
pub fn resolve_config(explicit: Option<&Path>) -> Result<RunnerConfig, ConfigError> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.is_file() {
                load_config(default_path)
            } else {
                Ok(RunnerConfig::default())
            }
        }
    }
}

/// Expands `~` and environment variables in a configured path.
/// The path is returned unchanged when expansion fails.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}
