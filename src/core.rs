//! # Core Module / 核心模块
//!
//! This module contains the execution engine of the API Case Runner:
//! the document parser, the variable store, the instruction compiler,
//! the action validators, the request builder, the response validator,
//! the variable extractor and the orchestrator that sequences them.
//!
//! 此模块包含 API Case Runner 的执行引擎：
//! 文档解析器、变量存储、指令编译器、动作校验器、请求构建器、
//! 响应校验器、变量提取器以及对它们进行编排的调度器。

pub mod models;
pub mod config;
pub mod variables;
pub mod document;
pub mod instruction;
pub mod validation;
pub mod http;
pub mod request;
pub mod response;
pub mod extractor;
pub mod execution;
pub mod orchestrator;

// Re-exports
pub use models::{StepResult, TestCase, TestCaseExecutionResult};
pub use config::RunnerConfig;
pub use orchestrator::{Orchestrator, RunOutcome, TestCaseRun};
