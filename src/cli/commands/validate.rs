//! # Validate Command Module / 校验命令模块
//!
//! Checks one test-case document without sending anything. Placeholders the
//! user did not seed are filled with a dummy value so that only structural
//! problems are reported.
//!
//! 在不发送任何请求的情况下检查单个测试用例文档。

use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use super::{input_directory, load_config, seed_variables};
use crate::{
    core::{document::read_test_case, validation::validate_test_case},
    infra::{fs::find_test_case_files, t},
    reporting::print_validation_errors,
};

/// Arguments of the `validate` command.
#[derive(Debug, Clone, Default)]
pub struct ValidateArgs {
    pub test_case_id: String,
    pub input_directory: Option<PathBuf>,
    pub variables: Vec<String>,
    pub config: Option<PathBuf>,
    pub language_set: bool,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.language_set)?;
    let input_dir = input_directory(args.input_directory.as_ref(), &config);

    let files = find_test_case_files(&input_dir, Some(&args.test_case_id))?;
    let file = files
        .first()
        .with_context(|| {
            t!("fs.test_case_not_found", id = &args.test_case_id, path = input_dir.display()).to_string()
        })?;

    let test_case = read_test_case(file, &CancellationToken::new()).await?;
    println!(
        "{}",
        t!("validation.validating", id = &test_case.id, path = file.display()).cyan()
    );

    let variables = seed_variables(&args.variables, &config).with_placeholders_from(
        test_case
            .tables
            .iter()
            .flat_map(|table| table.steps.iter().map(|s| s.test_data.as_str())),
    );

    let errors = validate_test_case(&test_case, &variables);
    if errors.is_empty() {
        println!("{}", t!("validation.valid", id = &test_case.id).green());
        Ok(())
    } else {
        print_validation_errors(&errors);
        anyhow::bail!("{}", t!("validation.invalid", id = &test_case.id, count = errors.len()))
    }
}
