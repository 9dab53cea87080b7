use std::fs;
use std::process::ExitCode;

use clap::Parser;

use checker::config::{CliArgs, Command};
use checker::coordinator::Coordinator;

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = CliArgs::parse();
    let config = match cli.to_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let coordinator = match Coordinator::new(config) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            log::error!("Failed to start: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let (output, ok) = match cli.command {
        Command::Run {
            suite,
            root,
            description,
        } => {
            let message = coordinator.import_suite_file(&suite);
            let name = suite
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if coordinator.suite(&name).is_none() {
                log::error!("{message}");
                return ExitCode::FAILURE;
            }
            log::info!("{message}");
            if let Some(description) = description {
                coordinator.set_description(&name, &description);
            }
            let outcome = coordinator.run_suite_outcome(&name, &root);
            (outcome.log, outcome.executed)
        }
        Command::Check {
            input,
            expected,
            root,
        } => {
            let (input, expected) = match (fs::read_to_string(&input), fs::read_to_string(&expected)) {
                (Ok(input), Ok(expected)) => (input, expected),
                (Err(e), _) | (_, Err(e)) => {
                    log::error!("Error reading input or expected output file: {e}");
                    return ExitCode::FAILURE;
                }
            };
            let outcome = coordinator.check_input_expected_outcome(&root, &input, &expected);
            (outcome.log, outcome.executed)
        }
        Command::Show { report } => (coordinator.load_report(&report), report.is_file()),
        Command::Compare { first, second } => {
            (coordinator.compare_reports(&first, &second), true)
        }
    };

    println!("{output}");
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
