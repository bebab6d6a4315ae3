//! # API Case Runner Library / API Case Runner 库
//!
//! This library provides the core functionality for the API Case Runner tool,
//! a markdown-driven executor for HTTP API test cases. Each test case is a
//! document whose tables describe, row by row, how to build a request, what to
//! expect from the response and which values to capture for later tables.
//!
//! 此库为 API Case Runner 工具提供核心功能，
//! 这是一个由 Markdown 驱动的 HTTP API 测试用例执行器。每个测试用例是一个文档，
//! 其中的表格逐行描述如何构建请求、期望的响应以及需要为后续表格捕获的值。
//!
//! ## Modules / 模块
//!
//! - `core` - Document parsing, instruction compilation, validation and execution
//! - `infra` - Infrastructure services like file discovery, HTTP transport and JSON path queries
//! - `reporting` - Console, HTML and document write-back reporting
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 文档解析、指令编译、校验与执行
//! - `infra` - 基础设施服务，如文件查找、HTTP 传输和 JSON 路径查询
//! - `reporting` - 控制台、HTML 和文档回写报告
//! - `cli` - 命令行接口和命令

pub mod core;
pub mod infra;
pub mod reporting;
pub mod cli;

// Re-export commonly used items
pub use core::models;
pub use core::config;
pub use core::orchestrator;

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the application's console output. It attempts to match the full
/// locale (e.g., "zh-CN"), then just the language code (e.g., "en"), and
/// finally falls back to the default language ("en").
pub fn init() {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    set_language(&locale);
}

/// Sets the console language, falling back the same way as [`init`].
pub fn set_language(locale: &str) {
    let available_locales = rust_i18n::available_locales!();

    let is_available = |code: &str| available_locales.iter().any(|l| *l == code);

    let lang = if is_available(locale) {
        locale
    } else {
        locale
            .split(['-', '_'])
            .next()
            .filter(|lang_code| is_available(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
