//! # Commands / 命令
//!
//! One module per subcommand, plus the settings both share.
//!
//! 每个子命令一个模块，以及它们共享的设置。

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::core::config::{RunnerConfig, expand_path, resolve_config};
use crate::core::variables::VariableStore;
use crate::infra::t;

pub mod run;
pub mod validate;

/// Loads the config file and applies its language unless `--lang` was given.
pub(crate) fn load_config(path: Option<&Path>, language_set: bool) -> Result<RunnerConfig> {
    let config = resolve_config(path).with_context(|| t!("config.load_failed").to_string())?;
    if !language_set {
        if let Some(language) = &config.language {
            crate::set_language(language);
        }
    }
    Ok(config)
}

/// The input directory: the argument if given, else the configured one.
pub(crate) fn input_directory(arg: Option<&PathBuf>, config: &RunnerConfig) -> PathBuf {
    expand_path(arg.unwrap_or(&config.input_directory))
}

/// Seed variables: the configured ones overridden by `-v key=value` pairs.
pub(crate) fn seed_variables(pairs: &[String], config: &RunnerConfig) -> VariableStore {
    let mut seeds = config.seed_variables();
    seeds.merge(&VariableStore::from_pairs(pairs));
    seeds
}
