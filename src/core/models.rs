//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures used throughout the runner.
//! It includes the parsed test case with its tables and steps, the per-step
//! outcome, and the result of executing one table.
//!
//! 此模块定义了整个运行器中使用的核心数据结构。
//! 它包括解析后的测试用例（含表格与步骤）、单步结果以及执行单个表格的结果。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::variables::VariableStore;

/// Glyph written into the Actual Result cell of a successful step.
pub const SUCCESS_GLYPH: &str = "✅";
/// Glyph written into the Actual Result cell of a failed step.
pub const FAILURE_GLYPH: &str = "❌";

/// The kind of a test-case document.
/// 测试用例文档的类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestCaseType {
    /// A definition authored by hand, ready to be executed.
    /// 手工编写、可直接执行的定义。
    Definition,
    /// An annotated copy produced by a run.
    /// 由一次运行产生的带注释副本。
    Run,
}

impl TestCaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestCaseType::Definition => "Definition",
            TestCaseType::Run => "Run",
        }
    }
}

impl FromStr for TestCaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Definition" => Ok(TestCaseType::Definition),
            "Run" => Ok(TestCaseType::Run),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for TestCaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The recorded status of a test case.
/// 测试用例记录的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestCaseStatus {
    Passed,
    Failed,
    Unknown,
}

impl TestCaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestCaseStatus::Passed => "Passed",
            TestCaseStatus::Failed => "Failed",
            TestCaseStatus::Unknown => "Unknown",
        }
    }
}

impl FromStr for TestCaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Passed" => Ok(TestCaseStatus::Passed),
            "Failed" => Ok(TestCaseStatus::Failed),
            "Unknown" => Ok(TestCaseStatus::Unknown),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for TestCaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a step table.
/// 步骤表格中的一行。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    /// Step identifier, unique within its table.
    /// 步骤标识，在所属表格内唯一。
    pub id: i32,
    pub description: String,
    /// The raw DSL source of the step. Empty for purely descriptive rows.
    /// 步骤的原始 DSL 文本。纯描述性的行为空。
    pub test_data: String,
    pub expected_result: String,
    /// The Actual Result cell as found in the document.
    pub actual_result: String,
    /// `Some(true)` when the Actual Result cell carries the success glyph,
    /// `Some(false)` for the failure glyph, `None` otherwise.
    pub is_success: Option<bool>,
}

impl TestStep {
    /// Returns `true` if the step carries DSL text that must be compiled.
    pub fn is_actionable(&self) -> bool {
        !self.test_data.trim().is_empty()
    }
}

/// A contiguous step table. Each table is executed as one HTTP round-trip.
/// 一个连续的步骤表格。每个表格作为一次 HTTP 往返执行。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub steps: Vec<TestStep>,
}

impl Table {
    pub fn actionable_steps(&self) -> impl Iterator<Item = &TestStep> {
        self.steps.iter().filter(|s| s.is_actionable())
    }
}

/// A test case read from one document.
///
/// `case_type` and `status` keep the raw tag text so that validation can
/// report values outside the enumerations; use [`TestCase::case_type`] and
/// [`TestCase::status`] for the typed view.
///
/// 从一个文档读取的测试用例。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub title: String,
    pub module: Option<String>,
    pub raw_type: String,
    pub raw_status: String,
    pub tables: Vec<Table>,
    /// The path of the document the test case was read from.
    pub file: PathBuf,
    /// The resolved path of a linked prerequisite document, if any.
    pub linked_file: Option<PathBuf>,
    domain: String,
    variables: VariableStore,
}

impl TestCase {
    /// The parsed `Type` tag, or `None` if it is missing or not recognised.
    pub fn case_type(&self) -> Option<TestCaseType> {
        self.raw_type.parse().ok()
    }

    /// The parsed `Status` tag, or `None` if it is missing or not recognised.
    pub fn status(&self) -> Option<TestCaseStatus> {
        self.raw_status.parse().ok()
    }

    pub fn is_definition(&self) -> bool {
        self.case_type() == Some(TestCaseType::Definition)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Sets the domain requests are sent to.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Replaces the variable store, typically with the seed values.
    pub fn with_variables(mut self, variables: VariableStore) -> Self {
        self.variables = variables;
        self
    }

    /// Merges `variables` into the store; later values win.
    pub fn add_or_merge_variables(&mut self, variables: &VariableStore) {
        self.variables.merge(variables);
    }

    /// Total number of steps across all tables.
    pub fn step_count(&self) -> usize {
        self.tables.iter().map(|t| t.steps.len()).sum()
    }
}

/// The outcome of one step: success, or failure with a human-readable message.
/// 单个步骤的结果：成功，或附带可读信息的失败。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: i32,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepResult {
    pub fn success(step_id: i32) -> Self {
        Self {
            step_id,
            success: true,
            error: None,
        }
    }

    pub fn failed(step_id: i32, error: impl Into<String>) -> Self {
        Self {
            step_id,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// The result of executing one table: its step results and the variables
/// captured from its response.
/// 执行单个表格的结果：步骤结果以及从响应中捕获的变量。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseExecutionResult {
    pub step_results: Vec<StepResult>,
    pub variables: VariableStore,
}

impl TestCaseExecutionResult {
    pub fn is_success(&self) -> bool {
        self.step_results.iter().all(|r| r.success)
    }
}
