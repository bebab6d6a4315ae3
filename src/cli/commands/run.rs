//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command, which executes test-case
//! documents against a target domain.
//!
//! 此模块实现了 `run` 命令，针对目标域名执行测试用例文档。

use anyhow::{Context, Result};
use colored::*;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use super::{input_directory, load_config, seed_variables};
use crate::{
    core::{
        config::expand_path,
        document::{DocumentError, read_test_case},
        orchestrator::{Orchestrator, RunOutcome, TestCaseRun},
    },
    infra::{fs::find_test_case_files, http::ReqwestTransport, t},
    reporting::{generate_html_report, print_run_failures, print_summary, save_run},
};

/// Arguments of the `run` command.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub domain: Option<String>,
    pub test_case_id: Option<String>,
    pub input_directory: Option<PathBuf>,
    pub output_directory: Option<PathBuf>,
    pub variables: Vec<String>,
    pub continue_on_failure: bool,
    pub html: Option<PathBuf>,
    pub config: Option<PathBuf>,
    /// `--lang` was given, so the configured language is ignored.
    pub language_set: bool,
}

/// Executes the run command with the provided arguments.
///
/// Documents run one after another in path order. A test case that does not
/// pass stops the remaining documents unless continue-on-failure is set.
pub async fn execute(args: RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.language_set)?;

    let domain = args
        .domain
        .clone()
        .or_else(|| config.domain.clone())
        .with_context(|| t!("run.domain_missing").to_string())?;
    let input_dir = input_directory(args.input_directory.as_ref(), &config);
    let output_dir = args
        .output_directory
        .clone()
        .or_else(|| config.output_directory.clone())
        .map(|p| expand_path(&p));
    let continue_on_failure = args.continue_on_failure || config.continue_on_failure;
    let seeds = seed_variables(&args.variables, &config);

    let files = find_test_case_files(&input_dir, args.test_case_id.as_deref())?;
    if files.is_empty() {
        println!("{}", t!("run.no_test_cases", path = input_dir.display()).yellow());
        return Ok(());
    }
    println!(
        "{}",
        t!("run.found_test_cases", count = files.len(), path = input_dir.display()).cyan()
    );

    let stop_token = setup_signal_handler();
    let transport = ReqwestTransport::new(Duration::from_secs(config.timeout_secs))
        .context("Failed to create the HTTP client")?;
    let orchestrator =
        Orchestrator::new(Arc::new(transport)).with_continue_on_failure(continue_on_failure);

    let mut runs: Vec<TestCaseRun> = Vec::new();
    for file in files {
        let test_case = match read_test_case(&file, &stop_token).await {
            Ok(test_case) => test_case,
            Err(DocumentError::Cancelled) => break,
            Err(e) => return Err(e.into()),
        };
        let test_case = test_case
            .with_domain(domain.as_str())
            .with_variables(seeds.clone());

        let run = orchestrator.run(test_case, &stop_token).await;

        if let Some(output_dir) = &output_dir {
            match save_run(&run, &input_dir, output_dir) {
                Ok(saved) => println!(
                    "{}",
                    t!("run.saved_results", path = saved.document.display()).dimmed()
                ),
                Err(e) => eprintln!("{} {:#}", t!("run.save_failed").red(), e),
            }
        }

        let stop = run.outcome == RunOutcome::Cancelled || (!run.is_success() && !continue_on_failure);
        runs.push(run);
        if stop {
            break;
        }
    }

    print_summary(&runs);
    print_run_failures(&runs);

    if let Some(report_path) = &args.html {
        println!("\n{}", t!("run.generating_html", path = report_path.display()));
        if let Err(e) = generate_html_report(&runs, report_path) {
            eprintln!("{} {:#}", t!("run.html_failed").red(), e);
        }
    }

    if stop_token.is_cancelled() {
        anyhow::bail!("{}", t!("run.cancelled"));
    }
    if runs.iter().all(TestCaseRun::is_success) {
        println!("\n{}", t!("run.all_passed").green().bold());
        Ok(())
    } else {
        anyhow::bail!("{}", t!("run.some_failed"))
    }
}

/// Sets up a signal handler for graceful shutdown.
fn setup_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("run.shutdown_signal").yellow());
            token_clone.cancel();
        }
    });

    token
}
