use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::create_timestamp;
use crate::suite::TestSuite;

/// Prefix of the line naming a submission in the results table
pub const PROGRAM_MARKER: &str = "Program:";
/// Prefix of the line giving a submission's pass rate
pub const PASS_RATE_MARKER: &str = "Pass Rate:";
/// Text on the status line of a submission that did not compile
pub const COMPILATION_FAILED_MARKER: &str = "COMPILATION FAILED";

const HEAVY_RULE: &str = "═══════════════════════════════════════════════════════════════════";
const LIGHT_RULE: &str = "───────────────────────────────────────────────────────────────────";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where the report of the suite's last run is written, `None` if it never ran
pub fn report_path(suite: &TestSuite, results_dir: &Path) -> Option<PathBuf> {
    let last_run = suite.last_run?;
    Some(results_dir.join(format!(
        "{}_{}.txt",
        suite.name(),
        create_timestamp(&last_run)
    )))
}

/// Writes the report of the suite's last run into `results_dir`
///
/// Returns false, without writing, when the suite has not been run, and
/// false when the file cannot be written.
pub fn persist(suite: &TestSuite, results_dir: &Path) -> bool {
    let (Some(path), Some(report)) = (report_path(suite, results_dir), generate_report(suite))
    else {
        log::warn!(
            "Cannot save results: suite {} has not been executed yet",
            suite.name()
        );
        return false;
    };

    let written = fs::create_dir_all(results_dir).and_then(|_| fs::write(&path, report));
    match written {
        Ok(()) => {
            log::info!("Saved report to {}", path.display());
            true
        }
        Err(e) => {
            log::error!("Error saving results to {}: {e}", path.display());
            false
        }
    }
}

/// Renders the human-readable report of the suite's last run
pub fn generate_report(suite: &TestSuite) -> Option<String> {
    let last_run = suite.last_run?;
    let total = suite.total_count();
    let results = suite.program_results();
    let mut out = String::new();

    banner(&mut out, "TEST SUITE EXECUTION REPORT");
    let _ = writeln!(out, "Suite Name: {}", suite.name());
    if !suite.description.is_empty() {
        let _ = writeln!(out, "Description: {}", suite.description);
    }
    let _ = writeln!(out, "Execution Date: {}", last_run.format(DATE_FORMAT));
    let _ = writeln!(out, "Total Test Cases: {total}");
    let _ = writeln!(out, "Total Programs Tested: {}\n", results.len());

    banner(&mut out, "PROGRAM RESULTS");
    for result in results.values() {
        let _ = writeln!(out, "{LIGHT_RULE}");
        let _ = writeln!(out, "{PROGRAM_MARKER} {}", result.program_name);
        let _ = writeln!(out, "{LIGHT_RULE}");

        if !result.compiled {
            let _ = writeln!(out, "Status: ❌ {COMPILATION_FAILED_MARKER}\n");
            continue;
        }

        let _ = writeln!(out, "Status: ✓ Compiled Successfully");
        let _ = writeln!(out, "Tests Passed: {} / {total}", result.passed);
        let _ = writeln!(out, "Tests Failed: {}", result.failed);
        let _ = writeln!(out, "{PASS_RATE_MARKER} {:.1}%", result.pass_percentage());
        if result.passed == total {
            let _ = writeln!(out, "★ ALL TESTS PASSED! ★");
        }
        out.push('\n');
    }

    banner(&mut out, "DETAILED TEST RESULTS");
    for (idx, case) in suite.cases().iter().enumerate() {
        let _ = writeln!(out, "Test Case #{}:", idx + 1);
        let _ = writeln!(out, "  Input: {}", escape_newlines(case.input()));
        let _ = writeln!(out, "  Expected: {}", escape_newlines(case.expected_output()));
        if let Some(actual) = &case.actual_output {
            let _ = writeln!(out, "  Actual: {}", escape_newlines(actual));
            let _ = writeln!(
                out,
                "  Status: {}",
                if case.passed { "✓ PASS" } else { "✗ FAIL" }
            );
        }
        if let Some(error) = &case.error_message {
            let _ = writeln!(out, "  Error: {}", escape_newlines(error));
        }
        out.push('\n');
    }

    banner(&mut out, "SUMMARY");
    for result in results.values() {
        let _ = write!(out, "{:<30}", result.program_name);
        if !result.compiled {
            let _ = writeln!(out, " : Compilation Failed ❌");
        } else {
            let _ = writeln!(
                out,
                " : {}/{total} passed ({:.1}%) {}",
                result.passed,
                result.pass_percentage(),
                if result.passed == total { "✓" } else { "" }
            );
        }
    }
    out.push('\n');

    let _ = writeln!(out, "{HEAVY_RULE}");
    let _ = writeln!(out, "{:^67}", "END OF REPORT");
    let _ = writeln!(out, "{HEAVY_RULE}");

    Some(out)
}

fn banner(out: &mut String, title: &str) {
    let _ = writeln!(out, "{HEAVY_RULE}");
    let _ = writeln!(out, "{title:^67}");
    let _ = writeln!(out, "{HEAVY_RULE}\n");
}

fn escape_newlines(text: &str) -> String {
    text.replace("\r\n", "\\n").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::{ProgramResult, TestCase};
    use chrono::{Local, TimeZone};

    fn finished_suite() -> TestSuite {
        let mut suite = TestSuite::with_cases(
            "S1",
            vec![TestCase::new("3 4", "7"), TestCase::new("1\n2", "3")],
        );
        suite.description = "sums".to_string();
        suite.cases_mut()[0].actual_output = Some("7".to_string());
        suite.cases_mut()[0].passed = true;
        suite.cases_mut()[1].actual_output = Some("4\n".to_string());
        suite.cases_mut()[1].error_message = Some("bad".to_string());
        suite.store_program_result(ProgramResult {
            program_name: "alice".to_string(),
            compiled: true,
            passed: 2,
            failed: 0,
        });
        suite.store_program_result(ProgramResult {
            program_name: "bob".to_string(),
            compiled: false,
            passed: 0,
            failed: 0,
        });
        suite.update_statistics();
        suite.last_run = Some(Local.with_ymd_and_hms(2025, 11, 20, 9, 30, 5).unwrap());
        suite
    }

    #[test]
    fn test_unrun_suite_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let suite = TestSuite::with_cases("S1", vec![TestCase::new("1", "1")]);

        assert!(generate_report(&suite).is_none());
        assert!(!persist(&suite, dir.path()));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_report_contents() {
        let report = generate_report(&finished_suite()).unwrap();

        assert!(report.contains("Suite Name: S1\nDescription: sums\n"));
        assert!(report.contains("Execution Date: 2025-11-20 09:30:05"));
        assert!(report.contains("Program: alice\n"));
        assert!(report.contains("Pass Rate: 100.0%\n★ ALL TESTS PASSED! ★"));
        assert!(report.contains("Program: bob\n"));
        assert!(report.contains("Status: ❌ COMPILATION FAILED"));
        assert!(report.contains("  Input: 1\\n2\n"));
        assert!(report.contains("  Actual: 4\\n\n  Status: ✗ FAIL\n  Error: bad\n"));
        assert!(report.ends_with(&format!("{HEAVY_RULE}\n")));
    }

    #[test]
    fn test_report_is_deterministic_and_timestamp_named() {
        let dir = tempfile::tempdir().unwrap();
        let suite = finished_suite();

        assert_eq!(generate_report(&suite), generate_report(&suite));
        assert!(persist(&suite, dir.path()));

        let path = dir.path().join("S1_20251120_093005.txt");
        assert_eq!(report_path(&suite, dir.path()), Some(path.clone()));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            generate_report(&suite).unwrap()
        );
    }

    #[test]
    fn test_write_failure_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        assert!(!persist(&finished_suite(), &blocker));
    }
}
