//! # Validation Module / 校验模块
//!
//! Checks instructions before anything is sent. Every check is a pure
//! function that returns the errors it found; nothing short-circuits, so a
//! test case always reports its complete error set.
//!
//! 在发送任何请求之前校验指令。所有检查都是纯函数，错误会被完整收集。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::instruction::{Action, CompileError, ContentType, Instruction};
use crate::core::models::{TestCase, TestCaseStatus, TestCaseType};
use crate::core::variables::{DUMMY_VALUE, VariableStore};
use crate::infra::json_path::JsonPath;

const SUPPORTED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

/// A problem found before execution, tied to a step when one is known.
/// 执行前发现的问题，已知时关联到具体步骤。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub step_id: Option<i32>,
    pub property: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(step_id: Option<i32>, property: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            step_id,
            property: property.map(str::to_string),
            message: message.into(),
        }
    }

    fn step(step_id: i32, property: &str, message: impl Into<String>) -> Self {
        Self::new(Some(step_id), Some(property), message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step_id {
            Some(id) => write!(f, "Step {:02}: {}", id, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<CompileError> for ValidationError {
    fn from(error: CompileError) -> Self {
        Self::new(Some(error.step_id()), None, error.to_string())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

fn require(
    errors: &mut Vec<ValidationError>,
    instruction: &Instruction,
    property: &str,
    value: &Option<String>,
) {
    if is_blank(value) {
        errors.push(ValidationError::step(
            instruction.step_id,
            property,
            format!("{property} is required for {}.", instruction.action),
        ));
    }
}

fn require_file_or_value(errors: &mut Vec<ValidationError>, instruction: &Instruction) {
    if is_blank(&instruction.file) && is_blank(&instruction.value) {
        errors.push(ValidationError::step(
            instruction.step_id,
            "Value",
            format!("Either File or Value is required for {}.", instruction.action),
        ));
    }
}

fn require_json_or_text(errors: &mut Vec<ValidationError>, instruction: &Instruction) {
    if !matches!(instruction.content_type, ContentType::Json | ContentType::Text) {
        errors.push(ValidationError::step(
            instruction.step_id,
            "ContentType",
            format!(
                "ContentType '{}' is not supported for {}. Expected application/json or text/plain.",
                instruction.content_type, instruction.action
            ),
        ));
    }
}

fn check_json_path(errors: &mut Vec<ValidationError>, instruction: &Instruction) {
    if let Some(path) = instruction.json_path.as_deref().filter(|p| !p.trim().is_empty()) {
        if let Err(e) = JsonPath::parse(path) {
            errors.push(ValidationError::step(
                instruction.step_id,
                "JsonPath",
                e.to_string(),
            ));
        }
    }
}

/// Validates a single instruction against the rules of its action.
pub fn validate_instruction(instruction: &Instruction) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let step_id = instruction.step_id;

    match instruction.action {
        Action::Send => {
            if !SUPPORTED_METHODS.contains(&instruction.method.as_str()) {
                errors.push(ValidationError::step(
                    step_id,
                    "Method",
                    format!(
                        "Method '{}' is not supported. Expected one of: {}.",
                        instruction.method,
                        SUPPORTED_METHODS.join(", ")
                    ),
                ));
            }
            require(&mut errors, instruction, "Endpoint", &instruction.endpoint);
            if instruction
                .endpoint
                .as_deref()
                .is_some_and(|e| e.starts_with('/'))
            {
                errors.push(ValidationError::step(
                    step_id,
                    "Endpoint",
                    "Endpoint must not start with '/'.",
                ));
            }
        }
        Action::AddHeader | Action::AddQueryParameter => {
            require(&mut errors, instruction, "Name", &instruction.name);
            require(&mut errors, instruction, "Value", &instruction.value);
        }
        Action::AddContent => match &instruction.content_type {
            ContentType::Other(raw) => errors.push(ValidationError::step(
                step_id,
                "ContentType",
                format!(
                    "ContentType '{raw}' is not supported. Expected one of: text/plain, application/json, multipart/form-data, application/x-www-form-urlencoded."
                ),
            )),
            ContentType::MultipartFormData => {
                require(&mut errors, instruction, "Name", &instruction.name);
                require(&mut errors, instruction, "Value", &instruction.value);
            }
            ContentType::Text | ContentType::Json | ContentType::FormUrlEncoded => {
                require_file_or_value(&mut errors, instruction)
            }
        },
        Action::CheckStatusCode => {
            require(&mut errors, instruction, "Value", &instruction.value);
            if let Some(value) = instruction.value.as_deref().filter(|v| !v.trim().is_empty()) {
                let valid = value
                    .trim()
                    .parse::<u16>()
                    .is_ok_and(|code| (100..=599).contains(&code));
                if !valid {
                    errors.push(ValidationError::step(
                        step_id,
                        "Value",
                        format!("Value '{value}' is not a valid HTTP status code."),
                    ));
                }
            }
        }
        Action::CheckReasonPhrase => {
            require(&mut errors, instruction, "Value", &instruction.value);
        }
        Action::CheckContentHeader => {
            require(&mut errors, instruction, "Name", &instruction.name);
            require(&mut errors, instruction, "Value", &instruction.value);
        }
        Action::CheckContent => {
            require_json_or_text(&mut errors, instruction);
            require_file_or_value(&mut errors, instruction);
            if instruction.content_type == ContentType::Json {
                require(&mut errors, instruction, "JsonPath", &instruction.json_path);
                check_json_path(&mut errors, instruction);
            }
        }
        Action::VerifyContent => {
            require_json_or_text(&mut errors, instruction);
            require_file_or_value(&mut errors, instruction);
        }
        Action::StoreVariable => {
            require(&mut errors, instruction, "Name", &instruction.name);
            if is_blank(&instruction.json_path) && is_blank(&instruction.value) {
                errors.push(ValidationError::step(
                    step_id,
                    "JsonPath",
                    "Either JsonPath or Value is required for StoreVariable.",
                ));
            }
            check_json_path(&mut errors, instruction);
        }
        Action::LogResponseContent => require_json_or_text(&mut errors, instruction),
    }

    errors
}

/// Rejects a table whose AddContent instructions declare more than one
/// distinct content type.
pub fn validate_content_types(instructions: &[Instruction]) -> Vec<ValidationError> {
    let content: Vec<&Instruction> = instructions
        .iter()
        .filter(|i| i.action == Action::AddContent)
        .collect();

    let mut types: Vec<&ContentType> = Vec::new();
    for instruction in &content {
        if !types.contains(&&instruction.content_type) {
            types.push(&instruction.content_type);
        }
    }

    if types.len() <= 1 {
        return Vec::new();
    }

    let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
    let steps: Vec<String> = content.iter().map(|i| i.step_id.to_string()).collect();
    vec![ValidationError::new(
        None,
        Some("ContentType"),
        format!(
            "Multiple content types found in request: {}. Only one content type is allowed per request (table). Affected steps: {}.",
            names.join(", "),
            steps.join(", ")
        ),
    )]
}

/// Requires exactly one Send in a table that has instructions.
pub fn validate_send_count(instructions: &[Instruction]) -> Vec<ValidationError> {
    if instructions.is_empty() {
        return Vec::new();
    }

    let sends: Vec<String> = instructions
        .iter()
        .filter(|i| i.action == Action::Send)
        .map(|i| i.step_id.to_string())
        .collect();

    match sends.len() {
        1 => Vec::new(),
        0 => vec![ValidationError::new(
            None,
            Some("Action"),
            "No Send instruction found in the table.",
        )],
        n => vec![ValidationError::new(
            None,
            Some("Action"),
            format!(
                "Only one Send instruction is allowed per table, found {n} in steps: {}.",
                sends.join(", ")
            ),
        )],
    }
}

/// All instruction-level and table-level checks for one table.
pub fn validate_table(instructions: &[Instruction]) -> Vec<ValidationError> {
    let mut errors: Vec<ValidationError> =
        instructions.iter().flat_map(validate_instruction).collect();
    errors.extend(validate_content_types(instructions));
    errors.extend(validate_send_count(instructions));
    errors
}

/// Checks the document metadata: Type, Status and the linked document.
pub fn validate_metadata(test_case: &TestCase) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if test_case.case_type().is_none() {
        errors.push(ValidationError::new(
            None,
            Some("Type"),
            format!(
                "Type '{}' is not valid. Expected one of: {}, {}.",
                test_case.raw_type,
                TestCaseType::Definition,
                TestCaseType::Run
            ),
        ));
    }

    if test_case.status().is_none() {
        errors.push(ValidationError::new(
            None,
            Some("Status"),
            format!(
                "Status '{}' is not valid. Expected one of: {}, {}, {}.",
                test_case.raw_status,
                TestCaseStatus::Passed,
                TestCaseStatus::Failed,
                TestCaseStatus::Unknown
            ),
        ));
    }

    if let Some(link) = &test_case.linked_file {
        if !link.is_file() {
            errors.push(ValidationError::new(
                None,
                Some("Link"),
                format!("Linked file '{}' does not exist.", link.display()),
            ));
        }
    }

    errors
}

/// Validates a whole test case before it runs.
///
/// Every table is compiled against `variables`. Names captured by
/// StoreVariable in a table are bound to a placeholder value for the tables
/// after it, since their real values only exist once that table has run.
/// Compile errors are reported as validation errors of their step.
pub fn validate_test_case(test_case: &TestCase, variables: &VariableStore) -> Vec<ValidationError> {
    let mut errors = validate_metadata(test_case);
    let mut store = variables.clone();

    for table in &test_case.tables {
        let mut instructions = Vec::new();
        let mut compile_failed = false;
        for step in table.actionable_steps() {
            match Instruction::compile(step, &store) {
                Ok(instruction) => instructions.push(instruction),
                Err(e) => {
                    compile_failed = true;
                    errors.push(e.into());
                }
            }
        }

        errors.extend(instructions.iter().flat_map(validate_instruction));
        errors.extend(validate_content_types(&instructions));
        // A step that failed to compile may well be the table's Send.
        if !compile_failed {
            errors.extend(validate_send_count(&instructions));
        }

        for name in instructions
            .iter()
            .filter(|i| i.action == Action::StoreVariable)
            .filter_map(|i| i.name.as_deref())
        {
            if !store.contains(name) {
                store.insert(name, DUMMY_VALUE);
            }
        }
    }

    errors
}
