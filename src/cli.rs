// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(lang) = args.iter().find_map(|arg| arg.strip_prefix("--lang=")) {
        return Some(lang.to_string());
    }
    let pos = args.iter().position(|arg| arg == "--lang")?;
    args.get(pos + 1).cloned()
}

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help(t!("cli.arg_config").to_string())
        .value_name("CONFIG")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn input_directory_arg() -> Arg {
    Arg::new("input-directory")
        .short('i')
        .long("input-directory")
        .help(t!("cli.arg_input_directory").to_string())
        .value_name("DIR")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn variable_arg() -> Arg {
    Arg::new("variable")
        .short('v')
        .long("variable")
        .help(t!("cli.arg_variable").to_string())
        .value_name("KEY=VALUE")
        .action(ArgAction::Append)
}

pub fn build_cli() -> Command {
    Command::new("api-case-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about").to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.arg_lang").to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cli.cmd_run_about").to_string())
                .arg(
                    Arg::new("domain")
                        .help(t!("cli.arg_domain").to_string())
                        .value_name("DOMAIN")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("test-case-id")
                        .short('t')
                        .long("test-case-id")
                        .help(t!("cli.arg_test_case_id").to_string())
                        .value_name("ID")
                        .action(ArgAction::Set),
                )
                .arg(input_directory_arg())
                .arg(
                    Arg::new("output-directory")
                        .short('o')
                        .long("output-directory")
                        .help(t!("cli.arg_output_directory").to_string())
                        .value_name("DIR")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(variable_arg())
                .arg(
                    Arg::new("continue-on-failure")
                        .long("continue-on-failure")
                        .help(t!("cli.arg_continue_on_failure").to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("cli.arg_html").to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about(t!("cli.cmd_validate_about").to_string())
                .arg(
                    Arg::new("test-case-id")
                        .help(t!("cli.arg_test_case_id").to_string())
                        .value_name("TEST_CASE_ID")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(input_directory_arg())
                .arg(variable_arg())
                .arg(config_arg()),
        )
}

fn variables_of(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("variable")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let language = pre_parse_language();
    match &language {
        Some(lang) => crate::set_language(lang),
        None => crate::init(),
    }
    let language_set = language.is_some();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            commands::run::execute(commands::run::RunArgs {
                domain: run_matches.get_one::<String>("domain").cloned(),
                test_case_id: run_matches.get_one::<String>("test-case-id").cloned(),
                input_directory: run_matches.get_one::<PathBuf>("input-directory").cloned(),
                output_directory: run_matches.get_one::<PathBuf>("output-directory").cloned(),
                variables: variables_of(run_matches),
                continue_on_failure: run_matches.get_flag("continue-on-failure"),
                html: run_matches.get_one::<PathBuf>("html").cloned(),
                config: run_matches.get_one::<PathBuf>("config").cloned(),
                language_set,
            })
            .await
        }
        Some(("validate", validate_matches)) => {
            commands::validate::execute(commands::validate::ValidateArgs {
                test_case_id: validate_matches
                    .get_one::<String>("test-case-id")
                    .cloned()
                    .unwrap_or_default(),
                input_directory: validate_matches.get_one::<PathBuf>("input-directory").cloned(),
                variables: variables_of(validate_matches),
                config: validate_matches.get_one::<PathBuf>("config").cloned(),
                language_set,
            })
            .await
        }
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
