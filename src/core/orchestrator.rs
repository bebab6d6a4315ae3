//! # Orchestrator Module / 编排模块
//!
//! Drives one test case: validate everything up front, then execute the
//! tables strictly in document order, feeding captured variables forward.
//!
//! 驱动单个测试用例：先整体校验，然后严格按文档顺序执行表格，并向后传递捕获的变量。

use chrono::{DateTime, Utc};
use colored::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        execution::{ExecutionError, execute_table},
        http::Transport,
        instruction::compile_table,
        models::{StepResult, TestCase},
        validation::{ValidationError, validate_test_case},
        variables::VariableStore,
    },
    infra::t,
};

/// How a test-case run ended.
/// 测试用例运行的结束方式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every executed step succeeded.
    Passed,
    /// At least one step failed.
    Failed,
    /// Validation found errors; nothing was sent.
    Aborted { errors: Vec<ValidationError> },
    /// The run was cancelled before it completed.
    Cancelled,
    /// A table could not be executed at all.
    Fatal {
        step_id: Option<i32>,
        message: String,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Passed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Passed => "Passed",
            RunOutcome::Failed => "Failed",
            RunOutcome::Aborted { .. } => "Aborted",
            RunOutcome::Cancelled => "Cancelled",
            RunOutcome::Fatal { .. } => "Fatal",
        }
    }
}

/// The record of one test-case run.
/// 单个测试用例运行的记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseRun {
    pub id: String,
    pub title: String,
    pub file: PathBuf,
    pub outcome: RunOutcome,
    /// Step results of every executed table, one list per table.
    pub tables: Vec<Vec<StepResult>>,
    /// The variable store at the end of the run.
    pub variables: VariableStore,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl TestCaseRun {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn step_results(&self) -> impl Iterator<Item = &StepResult> {
        self.tables.iter().flatten()
    }

    pub fn passed_steps(&self) -> usize {
        self.step_results().filter(|r| r.success).count()
    }

    pub fn total_steps(&self) -> usize {
        self.step_results().count()
    }
}

/// Runs test cases against a transport.
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    continue_on_failure: bool,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            continue_on_failure: false,
        }
    }

    /// Keep executing the remaining tables after a table with a failed step.
    pub fn with_continue_on_failure(mut self, continue_on_failure: bool) -> Self {
        self.continue_on_failure = continue_on_failure;
        self
    }

    /// Runs `test_case`, whose domain and seed variables must already be set.
    pub async fn run(&self, test_case: TestCase, cancel: &CancellationToken) -> TestCaseRun {
        let started_at = Utc::now();
        let start = Instant::now();

        println!(
            "{}",
            t!("run.running_test_case", title = &test_case.title, id = &test_case.id).blue()
        );

        let mut test_case = test_case;
        let mut tables = Vec::new();
        let outcome = self.execute(&mut test_case, &mut tables, cancel).await;

        let duration = start.elapsed();
        match &outcome {
            RunOutcome::Passed => println!(
                "{}",
                t!("run.test_case_passed", id = &test_case.id, duration = format!("{:.2}", duration.as_secs_f64())).green()
            ),
            RunOutcome::Cancelled => println!(
                "{}",
                t!("run.test_case_cancelled", id = &test_case.id).yellow()
            ),
            _ => println!(
                "{}",
                t!("run.test_case_failed", id = &test_case.id, duration = format!("{:.2}", duration.as_secs_f64())).red()
            ),
        }

        TestCaseRun {
            id: test_case.id.clone(),
            title: test_case.title.clone(),
            file: test_case.file.clone(),
            outcome,
            tables,
            variables: test_case.variables().clone(),
            started_at,
            duration,
        }
    }

    async fn execute(
        &self,
        test_case: &mut TestCase,
        tables: &mut Vec<Vec<StepResult>>,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let errors = validate_test_case(test_case, test_case.variables());
        if !errors.is_empty() {
            return RunOutcome::Aborted { errors };
        }

        let mut any_failed = false;
        for index in 0..test_case.tables.len() {
            if cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }

            let instructions =
                match compile_table(&test_case.tables[index].steps, test_case.variables()) {
                    Ok(instructions) => instructions,
                    Err(e) => return fatal(ExecutionError::from(e)),
                };
            if instructions.is_empty() {
                tables.push(Vec::new());
                continue;
            }

            let result = match execute_table(
                &instructions,
                test_case.domain(),
                self.transport.as_ref(),
                cancel,
            )
            .await
            {
                Ok(result) => result,
                Err(ExecutionError::Cancelled) => return RunOutcome::Cancelled,
                Err(e) => return fatal(e),
            };

            test_case.add_or_merge_variables(&result.variables);
            let table_failed = !result.is_success();
            tables.push(result.step_results);

            if table_failed {
                any_failed = true;
                if !self.continue_on_failure {
                    break;
                }
            }
        }

        if any_failed {
            RunOutcome::Failed
        } else {
            RunOutcome::Passed
        }
    }
}

fn fatal(error: ExecutionError) -> RunOutcome {
    RunOutcome::Fatal {
        step_id: error.step_id(),
        message: error.to_string(),
    }
}
