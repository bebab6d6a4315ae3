//! # Variable Extractor / 变量提取器
//!
//! Captures values from a response body for use by later tables.
//!
//! 从响应正文中捕获值，供后续表格使用。

use once_cell::unsync::OnceCell;
use serde_json::Value;

use crate::core::execution::ExecutionError;
use crate::core::instruction::{Action, Instruction};
use crate::core::models::{StepResult, TestCaseExecutionResult};
use crate::core::variables::VariableStore;
use crate::infra::json_path::{select_first, value_to_string};

/// Processes every StoreVariable instruction against `body`.
///
/// A literal Value is stored first and a JsonPath match then overwrites it.
/// A JsonPath without a match is skipped: no binding from it and no result
/// for the step. An empty body has no matches; a non-empty body that is not
/// JSON fails the first step that queries it.
pub fn extract_variables(
    instructions: &[Instruction],
    body: &str,
) -> Result<TestCaseExecutionResult, ExecutionError> {
    let mut variables = VariableStore::new();
    let mut step_results = Vec::new();
    let document: OnceCell<Value> = OnceCell::new();

    for instruction in instructions
        .iter()
        .filter(|i| i.action == Action::StoreVariable)
    {
        let name = instruction
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or(ExecutionError::MissingVariableName {
                step_id: instruction.step_id,
            })?;

        if let Some(value) = &instruction.value {
            variables.insert(name, value.as_str());
        }

        if let Some(path) = instruction.json_path.as_deref().filter(|p| !p.trim().is_empty()) {
            if body.trim().is_empty() {
                continue;
            }
            let root = document.get_or_try_init(|| {
                serde_json::from_str::<Value>(body).map_err(|e| {
                    ExecutionError::InvalidResponseBody {
                        step_id: instruction.step_id,
                        message: e.to_string(),
                    }
                })
            })?;
            let found = select_first(root, path).map_err(|source| {
                ExecutionError::InvalidJsonPath {
                    step_id: instruction.step_id,
                    source,
                }
            })?;
            let Some(found) = found else {
                continue;
            };
            variables.insert(name, value_to_string(found));
        }

        step_results.push(StepResult::success(instruction.step_id));
    }

    Ok(TestCaseExecutionResult {
        step_results,
        variables,
    })
}
