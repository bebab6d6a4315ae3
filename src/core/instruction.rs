//! # Instruction Compiler / 指令编译器
//!
//! Compiles the DSL text of one step (`Key=Value` tokens, values optionally
//! double-quoted) into a typed [`Instruction`], resolving `@@name@@`
//! placeholders against the current [`VariableStore`].
//!
//! 将单个步骤的 DSL 文本编译为类型化的 [`Instruction`]，并解析变量占位符。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::models::TestStep;
use crate::core::variables::VariableStore;

pub const DEFAULT_METHOD: &str = "GET";

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\w+)=("[^"]*"|[^\s"]\S*)"#).expect("token pattern is valid"));

/// Errors raised while compiling a step. Every variant carries its step id;
/// the message itself does not repeat it.
/// 编译步骤时产生的错误，每个变体都携带步骤编号。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("The step has no test data.")]
    NoTestData { step_id: i32 },
    #[error("Unsupported parameter '{key}'.")]
    UnsupportedParameter { step_id: i32, key: String },
    #[error("No Action is specified.")]
    MissingAction { step_id: i32 },
    #[error("Unknown action '{action}'.")]
    UnknownAction { step_id: i32, action: String },
    #[error("Variable '{name}' is not defined.")]
    UnresolvedVariable { step_id: i32, name: String },
}

impl CompileError {
    pub fn step_id(&self) -> i32 {
        match self {
            CompileError::NoTestData { step_id }
            | CompileError::UnsupportedParameter { step_id, .. }
            | CompileError::MissingAction { step_id }
            | CompileError::UnknownAction { step_id, .. }
            | CompileError::UnresolvedVariable { step_id, .. } => *step_id,
        }
    }
}

/// The closed set of step actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    AddHeader,
    AddQueryParameter,
    AddContent,
    Send,
    CheckStatusCode,
    CheckReasonPhrase,
    CheckContentHeader,
    CheckContent,
    VerifyContent,
    StoreVariable,
    LogResponseContent,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::AddHeader,
        Action::AddQueryParameter,
        Action::AddContent,
        Action::Send,
        Action::CheckStatusCode,
        Action::CheckReasonPhrase,
        Action::CheckContentHeader,
        Action::CheckContent,
        Action::VerifyContent,
        Action::StoreVariable,
        Action::LogResponseContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::AddHeader => "AddHeader",
            Action::AddQueryParameter => "AddQueryParameter",
            Action::AddContent => "AddContent",
            Action::Send => "Send",
            Action::CheckStatusCode => "CheckStatusCode",
            Action::CheckReasonPhrase => "CheckReasonPhrase",
            Action::CheckContentHeader => "CheckContentHeader",
            Action::CheckContent => "CheckContent",
            Action::VerifyContent => "VerifyContent",
            Action::StoreVariable => "StoreVariable",
            Action::LogResponseContent => "LogResponseContent",
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content type of request content or of an expected response body.
/// Unrecognised values are kept so validation can report them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Text,
    #[default]
    Json,
    MultipartFormData,
    FormUrlEncoded,
    Other(String),
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::Text => "text/plain",
            ContentType::Json => "application/json",
            ContentType::MultipartFormData => "multipart/form-data",
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded",
            ContentType::Other(raw) => raw,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ContentType::Other(_))
    }
}

impl From<&str> for ContentType {
    fn from(value: &str) -> Self {
        match value.trim() {
            "text/plain" => ContentType::Text,
            "application/json" => ContentType::Json,
            "multipart/form-data" => ContentType::MultipartFormData,
            "application/x-www-form-urlencoded" => ContentType::FormUrlEncoded,
            other => ContentType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The compiled, variable-resolved form of a step.
/// 步骤编译并解析变量后的形式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub step_id: i32,
    pub action: Action,
    pub name: Option<String>,
    pub value: Option<String>,
    pub file: Option<String>,
    pub json_path: Option<String>,
    /// Upper-cased HTTP method, `GET` unless given.
    pub method: String,
    pub endpoint: Option<String>,
    pub content_type: ContentType,
    /// Replaces the base domain when set on a Send instruction.
    pub domain: Option<String>,
}

impl Instruction {
    /// A blank instruction for `action`, with every optional field unset.
    pub fn new(step_id: i32, action: Action) -> Self {
        Self {
            step_id,
            action,
            name: None,
            value: None,
            file: None,
            json_path: None,
            method: DEFAULT_METHOD.to_string(),
            endpoint: None,
            content_type: ContentType::default(),
            domain: None,
        }
    }

    /// Compiles `step`'s DSL text against `variables`.
    pub fn compile(step: &TestStep, variables: &VariableStore) -> Result<Self, CompileError> {
        compile_text(step.id, &step.test_data, variables)
    }
}

/// Splits DSL text into `(key, value)` tokens with surrounding quotes removed.
/// Text that does not form a `Key=Value` token is ignored.
pub fn tokenize(text: &str) -> Vec<(String, String)> {
    TOKEN_PATTERN
        .captures_iter(text)
        .filter_map(|c| {
            let key = c.get(1)?.as_str();
            let raw = c.get(2)?.as_str();
            let value = raw
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(raw);
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Compiles raw DSL `text` for step `step_id`.
pub fn compile_text(
    step_id: i32,
    text: &str,
    variables: &VariableStore,
) -> Result<Instruction, CompileError> {
    if text.trim().is_empty() {
        return Err(CompileError::NoTestData { step_id });
    }

    let mut action = None;
    let mut instruction = Instruction::new(step_id, Action::Send);

    for (key, value) in tokenize(text) {
        match key.as_str() {
            "Action" => {
                let parsed = value
                    .parse::<Action>()
                    .map_err(|action| CompileError::UnknownAction { step_id, action })?;
                action = Some(parsed);
            }
            "Name" => instruction.name = Some(value),
            "Value" => instruction.value = Some(variables.substitute(&value, step_id)?),
            "File" => instruction.file = Some(value),
            "JsonPath" | "Path" => {
                instruction.json_path = Some(variables.substitute(&value, step_id)?)
            }
            "Method" => instruction.method = value.trim().to_ascii_uppercase(),
            "Endpoint" => instruction.endpoint = Some(variables.substitute(&value, step_id)?),
            "ContentType" => instruction.content_type = ContentType::from(value.as_str()),
            "Domain" => instruction.domain = Some(variables.substitute(&value, step_id)?),
            _ => return Err(CompileError::UnsupportedParameter { step_id, key }),
        }
    }

    instruction.action = action.ok_or(CompileError::MissingAction { step_id })?;
    Ok(instruction)
}

/// Compiles every actionable step of a table, stopping at the first error.
pub fn compile_table(
    steps: &[TestStep],
    variables: &VariableStore,
) -> Result<Vec<Instruction>, CompileError> {
    steps
        .iter()
        .filter(|s| s.is_actionable())
        .map(|s| Instruction::compile(s, variables))
        .collect()
}
