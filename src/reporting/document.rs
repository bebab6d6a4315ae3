//! # Results Persistence / 结果持久化
//!
//! Writes the annotated copy of an executed document and its JSON summary.
//!
//! 写出已执行文档的带注释副本及其 JSON 摘要。

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::document::write_back_table_results;
use crate::core::models::{StepResult, TestCaseStatus, TestCaseType};
use crate::core::orchestrator::{RunOutcome, TestCaseRun};
use crate::infra::fs::{output_path_for, write_file};

/// Paths written by [`save_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRun {
    pub document: PathBuf,
    pub summary: PathBuf,
}

/// Replaces the value of a `- **<tag>**: value` line, keeping its prefix.
fn set_tag(content: &str, tag: &str, value: &str) -> String {
    let marker = format!("- **{tag}**:");
    content
        .split('\n')
        .map(|line| match line.find(&marker) {
            Some(pos) if line[..pos].trim().is_empty() => {
                let eol = if line.ends_with('\r') { "\r" } else { "" };
                format!("{}{} {}{}", &line[..pos], marker, value, eol)
            }
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The executed tables, plus the step a fatal error stopped at marked as
/// failed. That step belongs to the table after the last executed one.
fn annotated_tables(run: &TestCaseRun) -> Vec<Vec<StepResult>> {
    let mut tables = run.tables.clone();
    if let RunOutcome::Fatal {
        step_id: Some(step_id),
        message,
    } = &run.outcome
    {
        tables.push(vec![StepResult::failed(*step_id, message.clone())]);
    }
    tables
}

/// Produces the annotated document text for `run` from the original `content`:
/// Actual Result cells filled in, `Type` set to `Run` and `Status` set to
/// `Passed` or `Failed`.
pub fn annotate_document(content: &str, run: &TestCaseRun) -> String {
    let status = if run.is_success() {
        TestCaseStatus::Passed
    } else {
        TestCaseStatus::Failed
    };
    let annotated = write_back_table_results(content, &annotated_tables(run));
    let annotated = set_tag(&annotated, "Type", TestCaseType::Run.as_str());
    set_tag(&annotated, "Status", status.as_str())
}

/// Writes the annotated copy of `run.file` below `output_dir`, at its path
/// relative to `input_dir`, plus a `<stem>.summary.json` next to it.
pub fn save_run(run: &TestCaseRun, input_dir: &Path, output_dir: &Path) -> Result<SavedRun> {
    let content = fs::read_to_string(&run.file)
        .with_context(|| format!("Failed to read test case document: {}", run.file.display()))?;

    let document = output_path_for(&run.file, input_dir, output_dir);
    write_file(&document, &annotate_document(&content, run))?;

    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| run.id.clone());
    let summary = document.with_file_name(format!("{stem}.summary.json"));
    let json = serde_json::to_string_pretty(run).context("Failed to serialize run summary")?;
    write_file(&summary, &json)?;

    Ok(SavedRun { document, summary })
}
