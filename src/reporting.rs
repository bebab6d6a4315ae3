//! # Reporting Module / 报告模块
//!
//! This module handles everything that leaves the engine once a test case has
//! run: colourful console summaries, the HTML report, and the annotated copy
//! of the test-case document together with its execution summary.
//!
//! 此模块处理测试用例运行后输出的所有内容：彩色控制台摘要、HTML 报告，
//! 以及带注释的测试用例文档副本及其执行摘要。

pub mod console;
pub mod document;
pub mod html;

// Re-export common reporting functions
pub use console::{print_run_failures, print_summary, print_validation_errors};
pub use document::save_run;
pub use html::generate_html_report;
