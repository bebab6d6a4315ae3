//! # Config Module Unit Tests / Config 模块单元测试
//!
//! Tests for loading `Runner.toml` and the defaults used without one.
//!
//! 测试 `Runner.toml` 的加载以及未提供时使用的默认值。

use api_case_runner::core::config::{
    ConfigError, RunnerConfig, expand_path, load_config, parse_config, resolve_config,
};
use std::path::{Path, PathBuf};

#[cfg(test)]
mod runner_config_tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();

        assert_eq!(config.language, None);
        assert_eq!(config.domain, None);
        assert_eq!(config.input_directory, PathBuf::from("."));
        assert_eq!(config.output_directory, None);
        assert!(!config.continue_on_failure);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.variables.is_empty());
    }

    #[test]
    fn test_full_config_deserialization() {
        let toml_str = r#"
            language = "zh-CN"
            domain = "https://api.example.com"
            input_directory = "cases"
            output_directory = "results"
            continue_on_failure = true
            timeout_secs = 5

            [variables]
            ApiKey = "secret"
            TenantId = "7"
        "#;
        let config = parse_config(toml_str, Path::new("Runner.toml")).unwrap();

        assert_eq!(config.language.as_deref(), Some("zh-CN"));
        assert_eq!(config.domain.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.input_directory, PathBuf::from("cases"));
        assert_eq!(config.output_directory, Some(PathBuf::from("results")));
        assert!(config.continue_on_failure);
        assert_eq!(config.timeout_secs, 5);

        let seeds = config.seed_variables();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds.get("ApiKey"), Some("secret"));
        assert_eq!(seeds.get("TenantId"), Some("7"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config("domain = \"http://localhost:8080\"\n", Path::new("x.toml")).unwrap();

        assert_eq!(config.domain.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.input_directory, PathBuf::from("."));
    }

    #[test]
    fn test_invalid_config_is_a_parse_error() {
        let err = parse_config("timeout_secs = \"soon\"", Path::new("bad.toml")).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut config = RunnerConfig::default();
        config.domain = Some("https://api.test".to_string());
        config
            .variables
            .insert("Token".to_string(), "abc".to_string());

        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("domain = \"https://api.test\""));

        let parsed = parse_config(&toml_str, Path::new("Runner.toml")).unwrap();
        assert_eq!(parsed, config);
    }
}

#[cfg(test)]
mod loading_tests {
    use super::*;

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Runner.toml");
        std::fs::write(&path, "continue_on_failure = true\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.continue_on_failure);

        let explicit = resolve_config(Some(&path)).unwrap();
        assert_eq!(explicit, config);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = resolve_config(Some(Path::new("no/such/Runner.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_expand_path_leaves_plain_paths_alone() {
        assert_eq!(expand_path(Path::new("cases/api")), PathBuf::from("cases/api"));
    }

    #[test]
    fn test_expand_path_expands_environment_variables() {
        let home = std::env::var("HOME").unwrap_or_default();
        if home.is_empty() {
            return;
        }
        assert_eq!(
            expand_path(Path::new("$HOME/cases")),
            PathBuf::from(format!("{home}/cases"))
        );
    }
}
