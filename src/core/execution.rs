//! # Table Execution Module / 表格执行模块
//!
//! Runs one table as a single HTTP round-trip: build the request, send it,
//! check the response and capture variables.
//!
//! 将一个表格作为一次 HTTP 往返执行：构建请求、发送、校验响应并捕获变量。

use colored::*;
use std::path::PathBuf;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        extractor::extract_variables,
        http::{Transport, TransportError},
        instruction::{Action, CompileError, Instruction},
        models::TestCaseExecutionResult,
        request::build_request,
        response::validate_response,
    },
    infra::{json_path::JsonPathError, t},
};

/// Errors that make a table impossible to execute. They stop the test case
/// regardless of the continue-on-failure policy.
/// 导致表格无法执行的错误，无论是否设置了失败后继续都会终止测试用例。
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("No Send instruction found in the table.")]
    MissingSend,
    #[error("Step {step_id:02}: content type '{content_type}' is not supported.")]
    UnsupportedContentType { step_id: i32, content_type: String },
    #[error("Step {step_id:02}: file '{}' was not found.", .path.display())]
    FileNotFound { step_id: i32, path: PathBuf },
    #[error("Step {step_id:02}: failed to read file '{}': {source}", .path.display())]
    FileRead {
        step_id: i32,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Step {step_id:02}: request content is not valid JSON: {message}")]
    InvalidJsonContent { step_id: i32, message: String },
    #[error("Step {step_id:02}: '{url}' is not a valid URL: {message}")]
    InvalidUrl {
        step_id: i32,
        url: String,
        message: String,
    },
    #[error("Step {step_id:02}: '{value}' is not a valid status code.")]
    InvalidStatusCode { step_id: i32, value: String },
    #[error("Step {step_id:02}: response content is not valid JSON: {message}")]
    InvalidResponseBody { step_id: i32, message: String },
    #[error("Step {step_id:02}: StoreVariable requires a Name.")]
    MissingVariableName { step_id: i32 },
    #[error("Step {step_id:02}: {source}")]
    InvalidJsonPath {
        step_id: i32,
        #[source]
        source: JsonPathError,
    },
    #[error("Step {step:02}: {0}", step = .0.step_id())]
    Compile(#[from] CompileError),
    #[error("Step {step_id:02}: {source}")]
    Transport {
        step_id: i32,
        #[source]
        source: TransportError,
    },
    #[error("Execution was cancelled.")]
    Cancelled,
}

impl ExecutionError {
    /// The step the error originates from, when there is one.
    pub fn step_id(&self) -> Option<i32> {
        match self {
            ExecutionError::MissingSend | ExecutionError::Cancelled => None,
            ExecutionError::Compile(e) => Some(e.step_id()),
            ExecutionError::UnsupportedContentType { step_id, .. }
            | ExecutionError::FileNotFound { step_id, .. }
            | ExecutionError::FileRead { step_id, .. }
            | ExecutionError::InvalidJsonContent { step_id, .. }
            | ExecutionError::InvalidUrl { step_id, .. }
            | ExecutionError::InvalidStatusCode { step_id, .. }
            | ExecutionError::InvalidResponseBody { step_id, .. }
            | ExecutionError::MissingVariableName { step_id }
            | ExecutionError::InvalidJsonPath { step_id, .. }
            | ExecutionError::Transport { step_id, .. } => Some(*step_id),
        }
    }
}

/// Reads a content or expected-value file, relative to the working directory.
pub(crate) async fn read_file(
    path: &str,
    step_id: i32,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, ExecutionError> {
    let path = PathBuf::from(path);
    let read = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ExecutionError::Cancelled),
        res = tokio::fs::read(&path) => res,
    };
    read.map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ExecutionError::FileNotFound { step_id, path },
        _ => ExecutionError::FileRead {
            step_id,
            path,
            source,
        },
    })
}

/// Like [`read_file`], decoding the content as UTF-8 text.
pub(crate) async fn read_text_file(
    path: &str,
    step_id: i32,
    cancel: &CancellationToken,
) -> Result<String, ExecutionError> {
    let bytes = read_file(path, step_id, cancel).await?;
    String::from_utf8(bytes).map_err(|e| ExecutionError::FileRead {
        step_id,
        path: PathBuf::from(path),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })
}

/// Executes one table's instructions against `domain`.
///
/// The returned step results are the response checks followed by the
/// variable captures; the variables are the bindings captured by this table
/// only.
pub async fn execute_table(
    instructions: &[Instruction],
    domain: &str,
    transport: &dyn Transport,
    cancel: &CancellationToken,
) -> Result<TestCaseExecutionResult, ExecutionError> {
    let request = build_request(instructions, domain, cancel).await?;
    let send_step = instructions
        .iter()
        .find(|i| i.action == Action::Send)
        .map(|i| i.step_id)
        .ok_or(ExecutionError::MissingSend)?;

    println!(
        "{}",
        t!("run.sending_request", method = &request.method, url = &request.url).dimmed()
    );

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ExecutionError::Cancelled),
        res = transport.send(request) => res.map_err(|source| ExecutionError::Transport {
            step_id: send_step,
            source,
        })?,
    };

    let mut step_results = validate_response(instructions, &response, cancel).await?;
    let extracted = extract_variables(instructions, &response.body)?;
    step_results.extend(extracted.step_results);

    Ok(TestCaseExecutionResult {
        step_results,
        variables: extracted.variables,
    })
}
