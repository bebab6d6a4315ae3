//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders a self-contained HTML report of a run with `maud`:
//! totals, one row per test case and the failed steps of each case.
//!
//! 此模块使用 `maud` 生成自包含的 HTML 运行报告：汇总、每个测试用例一行以及失败步骤。

use anyhow::{Context, Result};
use maud::{DOCTYPE, Markup, html};
use std::fs;
use std::path::Path;

use crate::core::orchestrator::{RunOutcome, TestCaseRun};
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2rem; color: #24292f; }
h1 { font-size: 1.6rem; }
.totals span { display: inline-block; margin-right: 1.5rem; font-weight: 600; }
table { border-collapse: collapse; width: 100%; margin-top: 1rem; }
th, td { border: 1px solid #d0d7de; padding: 0.4rem 0.6rem; text-align: left; }
th { background: #f6f8fa; }
.passed { color: #1a7f37; }
.failed { color: #cf222e; }
.cancelled { color: #9a6700; }
details { margin-top: 0.75rem; }
code { white-space: pre-wrap; }
"#;

fn status_class(outcome: &RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Passed => "passed",
        RunOutcome::Cancelled => "cancelled",
        _ => "failed",
    }
}

/// Renders the report markup.
pub fn render_report(runs: &[TestCaseRun]) -> Markup {
    let passed = runs.iter().filter(|r| r.is_success()).count();
    let failed = runs.len() - passed;

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title")) }
                style { (HTML_STYLE) }
            }
            body {
                h1 { (t!("html_report.main_header")) }
                div class="totals" {
                    span { (t!("html_report.total")) ": " (runs.len()) }
                    span class="passed" { (t!("html_report.passed")) ": " (passed) }
                    span class="failed" { (t!("html_report.failed")) ": " (failed) }
                }
                table {
                    thead {
                        tr {
                            th { (t!("html_report.status")) }
                            th { (t!("html_report.id")) }
                            th { (t!("html_report.test_case")) }
                            th { (t!("html_report.steps")) }
                            th { (t!("html_report.duration")) }
                        }
                    }
                    tbody {
                        @for run in runs {
                            tr {
                                td class=(status_class(&run.outcome)) { (run.outcome.label()) }
                                td { (run.id) }
                                td { (run.title) }
                                td { (run.passed_steps()) "/" (run.total_steps()) }
                                td { (format!("{:.2}s", run.duration.as_secs_f64())) }
                            }
                        }
                    }
                }
                @for run in runs.iter().filter(|r| !r.is_success()) {
                    details open {
                        summary { (run.id) " " (run.title) }
                        ul {
                            @match &run.outcome {
                                RunOutcome::Aborted { errors } => {
                                    @for error in errors {
                                        li { code { (error.to_string()) } }
                                    }
                                }
                                RunOutcome::Fatal { message, .. } => {
                                    li { code { (message) } }
                                }
                                _ => {}
                            }
                            @for result in run.step_results().filter(|r| !r.success) {
                                li {
                                    code {
                                        (format!("Step {:02}: {}", result.step_id, result.error.as_deref().unwrap_or_default()))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Writes the HTML report for `runs` to `output_path`.
///
/// # Errors / 错误
/// Returns an error if the file cannot be written.
/// 无法写入文件时返回错误。
pub fn generate_html_report(runs: &[TestCaseRun], output_path: &Path) -> Result<()> {
    let markup = render_report(runs);
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(output_path, markup.into_string())
        .with_context(|| format!("Failed to write HTML report: {}", output_path.display()))
}
