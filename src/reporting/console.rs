//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints run summaries, failed-step details and validation
//! errors to the console, with colors and localized labels.
//!
//! 此模块在控制台打印运行摘要、失败步骤详情和校验错误，带颜色和本地化标签。

use colored::*;

use crate::core::orchestrator::{RunOutcome, TestCaseRun};
use crate::core::validation::ValidationError;
use crate::infra::t;

fn outcome_label(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Passed => t!("summary.status_passed").to_string(),
        RunOutcome::Failed => t!("summary.status_failed").to_string(),
        RunOutcome::Aborted { .. } => t!("summary.status_aborted").to_string(),
        RunOutcome::Cancelled => t!("summary.status_cancelled").to_string(),
        RunOutcome::Fatal { .. } => t!("summary.status_fatal").to_string(),
    }
}

/// Prints one line per test case: status, id, title, duration and passed
/// step count.
///
/// 为每个测试用例打印一行：状态、编号、标题、耗时和通过的步骤数。
///
/// # Output Format / 输出格式
/// ```text
/// --- Test Summary ---
///   - Passed     | TC-001       | Create a user                  |      0.42s |  6/6
///   - Failed     | TC-002       | Delete a user                  |      0.17s |  3/4
/// ```
pub fn print_summary(runs: &[TestCaseRun]) {
    println!("\n{}", t!("summary.banner").bold());

    for run in runs {
        let label = format!("{:<10}", outcome_label(&run.outcome));
        let status = match run.outcome {
            RunOutcome::Passed => label.green(),
            RunOutcome::Cancelled => label.yellow(),
            _ => label.red(),
        };
        println!(
            "  - {} | {:<12} | {:<30} | {:>9.2}s | {:>2}/{}",
            status,
            run.id,
            run.title,
            run.duration.as_secs_f64(),
            run.passed_steps(),
            run.total_steps()
        );
    }

    let passed = runs.iter().filter(|r| r.is_success()).count();
    println!(
        "\n{}",
        t!("summary.totals", passed = passed, total = runs.len()).bold()
    );
}

/// Prints validation errors, one `Step NN: message` line each.
pub fn print_validation_errors(errors: &[ValidationError]) {
    if errors.is_empty() {
        return;
    }
    println!("{}", t!("validation.errors_found", count = errors.len()).red());
    for error in errors {
        println!("  {}", error.to_string().red());
    }
}

/// Prints the failed steps and errors of every unsuccessful run.
///
/// 打印每个未成功运行的失败步骤和错误。
pub fn print_run_failures(runs: &[TestCaseRun]) {
    let failures: Vec<&TestCaseRun> = runs.iter().filter(|r| !r.is_success()).collect();
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("summary.failure_banner").red().bold());
    println!("{}", "-".repeat(80));

    for (i, run) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}'",
            i + 1,
            failures.len(),
            run.id.cyan(),
            run.title
        );

        match &run.outcome {
            RunOutcome::Aborted { errors } => print_validation_errors(errors),
            RunOutcome::Fatal { message, .. } => println!("  {}", message.red()),
            RunOutcome::Cancelled => println!("  {}", t!("summary.cancelled_detail").yellow()),
            RunOutcome::Passed | RunOutcome::Failed => {}
        }

        for result in run.step_results().filter(|r| !r.success) {
            println!(
                "  {} {:02}: {}",
                t!("summary.step").red(),
                result.step_id,
                result.error.as_deref().unwrap_or_default()
            );
        }
        println!("{}", "-".repeat(80));
    }
}
