use std::path::Path;

use chrono::Local;

use crate::discovery::{EntryPointFinder, Submission, discover};
use crate::runner::Toolchain;
use crate::suite::{ProgramResult, TestSuite};
use crate::transcript::Transcript;
use crate::verify;

/// What one suite run produced besides the updated suite itself
#[derive(Debug, Default)]
pub struct RunSummary {
    /// False when the run was refused before touching any state
    pub executed: bool,
    pub submissions: Vec<Submission>,
    pub log: Transcript,
}

/// Runs every case of `suite` against every submission found under `root`
///
/// The suite is left untouched when it has no cases or no submission is
/// found. Otherwise its previous outcome is reset first, then each
/// submission is built and, if that succeeds, executed once per case.
/// Build failures and execution failures are recorded and the run carries
/// on with the next case or submission.
pub async fn run_suite(
    suite: &mut TestSuite,
    root: &Path,
    finder: &dyn EntryPointFinder,
    toolchain: &Toolchain,
) -> RunSummary {
    let mut summary = RunSummary::default();

    if suite.total_count() == 0 {
        summary
            .log
            .warn(format!("Suite {} has no test cases, nothing to run", suite.name()));
        return summary;
    }

    let discovery = discover(root, finder);
    summary.log.extend(discovery.log);
    if discovery.submissions.is_empty() {
        summary.log.warn(format!(
            "No submissions found under {}, nothing to run",
            root.display()
        ));
        return summary;
    }

    suite.reset_all_test_cases();
    summary.executed = true;
    summary.log.info(format!(
        "Running suite {} ({} case(s)) on {} submission(s)",
        suite.name(),
        suite.total_count(),
        discovery.submissions.len()
    ));

    for mut submission in discovery.submissions {
        let result = run_submission(suite, &mut submission, toolchain, &mut summary.log).await;
        suite.store_program_result(result);
        summary.submissions.push(submission);
    }

    suite.update_statistics();
    suite.last_run = Some(Local::now());
    summary.log.info(format!(
        "Finished suite {}: {} passed, {} failed",
        suite.name(),
        suite.passed_count(),
        suite.failed_count()
    ));

    summary
}

/// Builds one submission and runs every case on it
async fn run_submission(
    suite: &mut TestSuite,
    submission: &mut Submission,
    toolchain: &Toolchain,
    log: &mut Transcript,
) -> ProgramResult {
    log.info(format!("=== {} ===", submission.name));

    let compilation = toolchain.build(submission).await;
    if !compilation.success {
        log.warn(format!("{}: compilation failed", submission.name));
        let diagnostics = compilation.diagnostics.trim();
        if !diagnostics.is_empty() {
            log.info(diagnostics);
        }
        return program_result(submission);
    }

    for (idx, case) in suite.cases_mut().iter_mut().enumerate() {
        let case_no = idx + 1;
        let input = case.input().to_string();

        let passed = match toolchain.run(submission, &input).await {
            Ok(execution) => {
                let passed = verify::evaluate(case, Some(&execution.output));
                if let Some(code) = execution.exit_code.filter(|code| *code != 0) {
                    log.info(format!("  Test case #{case_no}: exit code {code}"));
                }
                passed
            }
            Err(e) => {
                verify::record_failure(case, e.to_string());
                log.warn(format!("  Test case #{case_no}: {e}"));
                false
            }
        };

        if passed {
            submission.passed += 1;
            log.info(format!("  Test case #{case_no}: PASS"));
        } else {
            submission.failed += 1;
            log.info(format!(
                "  Test case #{case_no}: FAIL (expected {:?}, got {:?})",
                case.expected_output(),
                case.actual_output.as_deref().unwrap_or_default()
            ));
        }
    }

    let result = program_result(submission);
    log.info(format!(
        "{}: {}/{} passed ({:.1}%)",
        submission.name,
        submission.passed,
        suite.total_count(),
        result.pass_percentage()
    ));
    result
}

fn program_result(submission: &Submission) -> ProgramResult {
    ProgramResult {
        program_name: submission.name.clone(),
        compiled: submission.compiled,
        passed: submission.passed,
        failed: submission.failed,
    }
}
