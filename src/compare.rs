use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::report::{COMPILATION_FAILED_MARKER, PASS_RATE_MARKER, PROGRAM_MARKER};

/// Shown for a submission missing from a report or without a parsable rate
pub const NOT_AVAILABLE: &str = "N/A";
/// Shown for a submission that did not compile
pub const COMPILE_FAILED: &str = "COMPILE FAILED";

/// Pass rate of one submission as found in a report
#[derive(Debug, Clone, PartialEq)]
pub enum RateEntry {
    /// Pass rate in percent, as printed
    Rate(String),
    CompilationFailed,
}

impl RateEntry {
    fn percent(&self) -> Option<f64> {
        match self {
            Self::Rate(rate) => rate.trim_end_matches('%').trim().parse().ok(),
            Self::CompilationFailed => None,
        }
    }

    fn label(&self) -> &str {
        match self {
            Self::Rate(rate) => rate,
            Self::CompilationFailed => COMPILE_FAILED,
        }
    }
}

/// Extracts the per-submission pass rates from report text
///
/// A submission name line is paired with the next pass-rate or
/// compilation-failed line. Everything else is skipped.
pub fn parse_report(text: &str) -> BTreeMap<String, RateEntry> {
    let mut rates = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix(PROGRAM_MARKER) {
            let name = name.trim();
            current = (!name.is_empty()).then(|| name.to_string());
        } else if let Some(rate) = line.strip_prefix(PASS_RATE_MARKER) {
            if let Some(name) = current.take() {
                rates.insert(name, RateEntry::Rate(rate.trim().to_string()));
            }
        } else if line.contains(COMPILATION_FAILED_MARKER) {
            if let Some(name) = current.take() {
                rates.insert(name, RateEntry::CompilationFailed);
            }
        }
    }

    rates
}

/// Side-by-side pass rates of two report texts
pub fn compare_texts(name_a: &str, text_a: &str, name_b: &str, text_b: &str) -> String {
    let rates_a = parse_report(text_a);
    let rates_b = parse_report(text_b);
    let programs: BTreeSet<&String> = rates_a.keys().chain(rates_b.keys()).collect();

    let mut out = String::new();
    let _ = writeln!(out, "Report A: {name_a}");
    let _ = writeln!(out, "Report B: {name_b}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<30} {:>15} {:>15} {:>10}",
        "Program", "Report A", "Report B", "Change"
    );
    let _ = writeln!(out, "{}", "-".repeat(73));

    for program in programs {
        let a = rates_a.get(program);
        let b = rates_b.get(program);
        let delta = match (a.and_then(RateEntry::percent), b.and_then(RateEntry::percent)) {
            (Some(a), Some(b)) => format!("{:+.1}%", b - a),
            _ => String::new(),
        };
        let _ = writeln!(
            out,
            "{:<30} {:>15} {:>15} {:>10}",
            program,
            label(a),
            label(b),
            delta
        );
    }

    out
}

/// Compares two persisted reports by path
///
/// Unreadable files are reported in the returned text and compare as empty.
pub fn compare(path_a: &Path, path_b: &Path) -> String {
    let mut notes = String::new();
    let mut read = |path: &Path| {
        fs::read_to_string(path).unwrap_or_else(|e| {
            log::warn!("Cannot read report {}: {e}", path.display());
            let _ = writeln!(notes, "WARNING: cannot read {}: {e}", path.display());
            String::new()
        })
    };
    let text_a = read(path_a);
    let text_b = read(path_b);

    let table = compare_texts(
        &path_a.display().to_string(),
        &text_a,
        &path_b.display().to_string(),
        &text_b,
    );
    notes + &table
}

fn label(entry: Option<&RateEntry>) -> &str {
    match entry {
        Some(entry) if entry.percent().is_some() || *entry == RateEntry::CompilationFailed => {
            entry.label()
        }
        _ => NOT_AVAILABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT_A: &str = "\
Program: Alice
Status: ✓ Compiled Successfully
Pass Rate: 80.0%

Program: Bob
Status: ❌ COMPILATION FAILED

Program: Carol
Pass Rate: garbage
";

    const REPORT_B: &str = "\
   Program:   Alice
Tests Passed: 9 / 10
  Pass Rate:   90.0%
Program: Dave
Pass Rate: 50.0%
";

    fn row<'a>(table: &'a str, program: &str) -> Vec<&'a str> {
        table
            .lines()
            .find(|l| l.starts_with(program))
            .unwrap()
            .split_whitespace()
            .collect()
    }

    #[test]
    fn test_parse_report() {
        let rates = parse_report(REPORT_A);
        assert_eq!(rates["Alice"], RateEntry::Rate("80.0%".to_string()));
        assert_eq!(rates["Bob"], RateEntry::CompilationFailed);
        assert_eq!(rates["Carol"].percent(), None);
        assert_eq!(parse_report(REPORT_B)["Alice"].percent(), Some(90.0));
    }

    #[test]
    fn test_delta_between_reports() {
        let table = compare_texts("a.txt", REPORT_A, "b.txt", REPORT_B);

        assert_eq!(row(&table, "Alice"), vec!["Alice", "80.0%", "90.0%", "+10.0%"]);
        assert_eq!(row(&table, "Bob"), vec!["Bob", "COMPILE", "FAILED", "N/A"]);
        assert_eq!(row(&table, "Carol"), vec!["Carol", "N/A", "N/A"]);
        assert_eq!(row(&table, "Dave"), vec!["Dave", "N/A", "50.0%"]);
    }

    #[test]
    fn test_negative_delta() {
        let table = compare_texts("b", REPORT_B, "a", REPORT_A);
        assert_eq!(row(&table, "Alice").last(), Some(&"-10.0%"));
    }

    #[test]
    fn test_malformed_reports_do_not_fail() {
        assert!(parse_report("Pass Rate: 10%\nrandom\nProgram:\nPass Rate: 5%").is_empty());

        let dir = tempfile::tempdir().unwrap();
        let out = compare(&dir.path().join("missing-a"), &dir.path().join("missing-b"));
        assert_eq!(out.matches("WARNING: cannot read").count(), 2);
        assert!(out.contains("Program"));
    }
}
