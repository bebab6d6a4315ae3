//! # Response Validator / 响应校验器
//!
//! Compares a received response with the table's check instructions.
//! Mismatches are ordinary failed [`StepResult`]s. Only problems that make a
//! check impossible to evaluate, such as an unparseable body, are errors.
//!
//! 将收到的响应与表格中的检查指令进行比较。不匹配是普通的失败结果。

use colored::*;
use once_cell::unsync::OnceCell;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::core::execution::{ExecutionError, read_text_file};
use crate::core::http::HttpResponse;
use crate::core::instruction::{Action, ContentType, Instruction};
use crate::core::models::StepResult;
use crate::infra::json_path::{select_first, value_to_string};
use crate::infra::t;

pub const EMPTY_CONTENT_MESSAGE: &str = "Response content is empty.";
pub const CONTENT_MISMATCH_MESSAGE: &str =
    "Response content does not match the expected content.";

fn of(instructions: &[Instruction], action: Action) -> Vec<&Instruction> {
    instructions.iter().filter(|i| i.action == action).collect()
}

/// Checks `response` against `instructions` and returns one result per
/// relevant step, in this order: Send, status codes, reason phrases,
/// headers, whole-content verifications, content checks, content logging.
pub async fn validate_response(
    instructions: &[Instruction],
    response: &HttpResponse,
    cancel: &CancellationToken,
) -> Result<Vec<StepResult>, ExecutionError> {
    let mut results: Vec<StepResult> = of(instructions, Action::Send)
        .iter()
        .map(|i| StepResult::success(i.step_id))
        .collect();

    for instruction in of(instructions, Action::CheckStatusCode) {
        results.push(check_status_code(instruction, response)?);
    }
    for instruction in of(instructions, Action::CheckReasonPhrase) {
        results.push(check_reason_phrase(instruction, response));
    }
    for instruction in of(instructions, Action::CheckContentHeader) {
        results.push(check_header(instruction, response));
    }

    let verify = of(instructions, Action::VerifyContent);
    if !verify.is_empty() {
        results.extend(verify_content(&verify, &response.body, cancel).await?);
    }

    let check = of(instructions, Action::CheckContent);
    if !check.is_empty() {
        results.extend(check_content(&check, &response.body, cancel).await?);
    }

    for instruction in of(instructions, Action::LogResponseContent) {
        log_content(instruction, &response.body);
        results.push(StepResult::success(instruction.step_id));
    }

    Ok(results)
}

fn check_status_code(
    instruction: &Instruction,
    response: &HttpResponse,
) -> Result<StepResult, ExecutionError> {
    let raw = instruction.value.clone().unwrap_or_default();
    let expected: u16 = raw
        .trim()
        .parse()
        .map_err(|_| ExecutionError::InvalidStatusCode {
            step_id: instruction.step_id,
            value: raw.clone(),
        })?;

    Ok(if expected == response.status {
        StepResult::success(instruction.step_id)
    } else {
        StepResult::failed(
            instruction.step_id,
            format!(
                "Expected status code '{}' but was '{}'.",
                expected, response.status
            ),
        )
    })
}

fn check_reason_phrase(instruction: &Instruction, response: &HttpResponse) -> StepResult {
    let expected = instruction.value.as_deref().unwrap_or_default();
    let actual = response.reason_phrase.as_deref().unwrap_or_default();
    if expected == actual {
        StepResult::success(instruction.step_id)
    } else {
        StepResult::failed(
            instruction.step_id,
            format!("Expected reason phrase '{expected}' but was '{actual}'."),
        )
    }
}

fn check_header(instruction: &Instruction, response: &HttpResponse) -> StepResult {
    let name = instruction.name.as_deref().unwrap_or_default();
    let expected = instruction.value.as_deref().unwrap_or_default();
    match response.header_value(name) {
        None => StepResult::failed(
            instruction.step_id,
            format!("Expected header '{name}' was not found."),
        ),
        Some(actual) if actual == expected => StepResult::success(instruction.step_id),
        Some(actual) => StepResult::failed(
            instruction.step_id,
            format!("Expected header '{name}' value '{expected}' but was '{actual}'."),
        ),
    }
}

/// The expected value of a content step: its file if set, else its value.
async fn expected_content(
    instruction: &Instruction,
    cancel: &CancellationToken,
) -> Result<String, ExecutionError> {
    match instruction.file.as_deref().filter(|f| !f.trim().is_empty()) {
        Some(file) => read_text_file(file, instruction.step_id, cancel).await,
        None => Ok(instruction.value.clone().unwrap_or_default()),
    }
}

/// Canonical JSON text, or the input unchanged when it does not parse.
fn normalize_json(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| text.to_string())
}

async fn verify_content(
    instructions: &[&Instruction],
    body: &str,
    cancel: &CancellationToken,
) -> Result<Vec<StepResult>, ExecutionError> {
    if body.is_empty() {
        return Ok(vec![StepResult::failed(
            instructions[0].step_id,
            EMPTY_CONTENT_MESSAGE,
        )]);
    }

    let mut results = Vec::with_capacity(instructions.len());
    for instruction in instructions {
        let expected = expected_content(instruction, cancel).await?;
        let matches = match instruction.content_type {
            ContentType::Json => normalize_json(&expected) == normalize_json(body),
            _ => expected == body,
        };
        results.push(if matches {
            StepResult::success(instruction.step_id)
        } else {
            StepResult::failed(instruction.step_id, CONTENT_MISMATCH_MESSAGE)
        });
    }
    Ok(results)
}

async fn check_content(
    instructions: &[&Instruction],
    body: &str,
    cancel: &CancellationToken,
) -> Result<Vec<StepResult>, ExecutionError> {
    if body.is_empty() {
        return Ok(vec![StepResult::failed(
            instructions[0].step_id,
            EMPTY_CONTENT_MESSAGE,
        )]);
    }

    let document: OnceCell<Value> = OnceCell::new();
    let mut results = Vec::with_capacity(instructions.len());

    for instruction in instructions {
        let expected = expected_content(instruction, cancel).await?;

        let actual = match instruction.content_type {
            ContentType::Json => {
                let root = document.get_or_try_init(|| {
                    serde_json::from_str::<Value>(body).map_err(|e| {
                        ExecutionError::InvalidResponseBody {
                            step_id: instruction.step_id,
                            message: e.to_string(),
                        }
                    })
                })?;
                let path = instruction.json_path.as_deref().unwrap_or("$");
                select_first(root, path)
                    .map_err(|source| ExecutionError::InvalidJsonPath {
                        step_id: instruction.step_id,
                        source,
                    })?
                    .map(value_to_string)
                    .unwrap_or_else(|| "null".to_string())
            }
            _ => body.to_string(),
        };

        results.push(if actual == expected {
            StepResult::success(instruction.step_id)
        } else {
            StepResult::failed(
                instruction.step_id,
                format!("Expected content value '{expected}' but was '{actual}'."),
            )
        });
    }

    Ok(results)
}

fn log_content(instruction: &Instruction, body: &str) {
    let rendered = match instruction.content_type {
        ContentType::Json => serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| serde_json::to_string_pretty(&v).ok())
            .unwrap_or_else(|| body.to_string()),
        _ => body.to_string(),
    };
    println!(
        "{}",
        t!("run.response_content", step = format!("{:02}", instruction.step_id)).cyan()
    );
    println!("{rendered}");
}
