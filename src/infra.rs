//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for the API Case Runner,
//! including test-case file discovery, the HTTP transport, the JSON path
//! query language and i18n support.
//!
//! 此模块为 API Case Runner 提供基础设施服务，
//! 包括测试用例文件查找、HTTP 传输、JSON 路径查询语言和国际化支持。

pub mod fs;
pub mod http;
pub mod json_path;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
